pub mod brand;
pub mod category;
pub mod product;

pub use brand::{Brand, CreateBrandRequest, UpdateBrandRequest};
pub use category::{Category, CreateCategoryRequest, UpdateCategoryRequest};
pub use product::{
    package_quantity_for, unit_display, weight_display, CreateProductRequest, ImageUpload,
    PackageQuantity, Product, ProductUnit, UpdateProductRequest, WeightUnit,
};
