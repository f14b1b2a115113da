mod auth_service_impl;
mod credential_generator_jwt;
mod credential_hasher_argon2;

pub use auth_service_impl::*;
pub use credential_generator_jwt::*;
pub use credential_hasher_argon2::*;
