pub mod auth;
pub mod categories;
pub mod products;
pub mod purchases;
