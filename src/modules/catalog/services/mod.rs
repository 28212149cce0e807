pub mod catalog_service;
pub mod pricing;
pub mod slug;

pub use catalog_service::CatalogService;
pub use pricing::{derive_prices, DerivedPrices, MAX_IMAGE_BYTES};
pub use slug::slugify;
