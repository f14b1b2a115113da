mod auth_record;
mod token;
mod user;

pub use auth_record::*;
pub use token::*;
pub use user::*;
