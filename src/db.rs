pub mod user_repo;
pub use user_repo::UserRepository;
pub mod category_repo;
pub use category_repo::CategoryRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod product_image_repo;
pub use product_image_repo::ProductImageRepository;
pub mod purchase_repo;
pub use purchase_repo::PurchaseRepository;
