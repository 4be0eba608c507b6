pub mod auth;
pub mod category_service;
pub mod product_service;
pub mod purchase_service;
