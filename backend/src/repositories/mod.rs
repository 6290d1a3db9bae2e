pub mod category;
pub mod product;
pub mod user;

pub use user::{CreateUserError, PgUserRepository, UserRepository};
