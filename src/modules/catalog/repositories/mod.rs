pub mod brand_repository;
pub mod category_repository;
pub mod product_repository;

pub use brand_repository::BrandRepository;
pub use category_repository::CategoryRepository;
pub use product_repository::ProductRepository;
