pub mod category;
pub mod password_reset;
pub mod product;
pub mod user;
