mod auth_service;
mod credential_generator;

pub use auth_service::*;
pub use credential_generator::*;
