use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Sale unit of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(50)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductUnit {
    Pcs,
    Tablet,
    Capsule,
    Bottle,
}

impl ProductUnit {
    /// Human-readable label used in display fields
    pub fn label(&self) -> &'static str {
        match self {
            ProductUnit::Pcs => "Pieces",
            ProductUnit::Tablet => "Tablet",
            ProductUnit::Capsule => "Capsule",
            ProductUnit::Bottle => "Bottle",
        }
    }
}

impl std::fmt::Display for ProductUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductUnit::Pcs => write!(f, "pcs"),
            ProductUnit::Tablet => write!(f, "tablet"),
            ProductUnit::Capsule => write!(f, "capsule"),
            ProductUnit::Bottle => write!(f, "bottle"),
        }
    }
}

impl std::str::FromStr for ProductUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pcs" => Ok(ProductUnit::Pcs),
            "tablet" => Ok(ProductUnit::Tablet),
            "capsule" => Ok(ProductUnit::Capsule),
            "bottle" => Ok(ProductUnit::Bottle),
            _ => Err(format!("Invalid product unit: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Mg,
    Ml,
    G,
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightUnit::Mg => write!(f, "mg"),
            WeightUnit::Ml => write!(f, "ml"),
            WeightUnit::G => write!(f, "g"),
        }
    }
}

/// Package quantity derived from the sale unit (strips for tablets and
/// capsules, boxes for bottles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PackageQuantity {
    Strip,
    Box,
    Pack,
}

impl std::fmt::Display for PackageQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageQuantity::Strip => write!(f, "strip"),
            PackageQuantity::Box => write!(f, "box"),
            PackageQuantity::Pack => write!(f, "pack"),
        }
    }
}

/// Image reference from the external object store, with the declared size
/// checked against the upload ceiling before the URL is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUpload {
    pub url: String,
    pub size_bytes: u64,
}

/// Catalog product.
///
/// `new_price` and `discount_price` are derived from `price` and
/// `offer_percentage` on every save; `stock` never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,

    // Medical-specific fields
    pub generic_name: Option<String>,
    pub indication: Option<String>,
    pub adult_dose: Option<String>,
    pub child_dose: Option<String>,
    pub contraindication: Option<String>,
    pub precaution: Option<String>,
    pub side_effect: Option<String>,

    pub category_id: String,
    pub brand_id: Option<String>,

    pub price: Decimal,
    /// Cost price, used for profit aggregation in reports
    pub actual_price: Decimal,
    pub offer_percentage: Decimal,
    pub new_price: Decimal,
    pub discount_price: Decimal,

    pub stock: u32,
    pub unit: ProductUnit,
    pub unit_value: Option<String>,
    pub weight_value: Option<u32>,
    pub weight_unit: Option<WeightUnit>,
    pub weight_display: Option<String>,
    pub unit_display: Option<String>,
    pub package_quantity: Option<PackageQuantity>,

    pub prescription_required: bool,

    pub image1_url: Option<String>,
    pub image2_url: Option<String>,
    pub image3_url: Option<String>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Effective selling price: the discounted price when one exists and is
    /// lower than the base price, else the base price
    pub fn effective_price(&self) -> Decimal {
        if self.new_price > Decimal::ZERO && self.new_price < self.price {
            self.new_price
        } else {
            self.price
        }
    }
}

/// Package quantity follows the sale unit
pub fn package_quantity_for(unit: ProductUnit) -> Option<PackageQuantity> {
    match unit {
        ProductUnit::Tablet | ProductUnit::Capsule => Some(PackageQuantity::Strip),
        ProductUnit::Bottle => Some(PackageQuantity::Box),
        ProductUnit::Pcs => None,
    }
}

/// "500 mg" style display string; None when either part is missing
pub fn weight_display(weight_value: Option<u32>, weight_unit: Option<WeightUnit>) -> Option<String> {
    match (weight_value, weight_unit) {
        (Some(value), Some(unit)) => Some(format!("{} {}", value, unit)),
        _ => None,
    }
}

/// "5 ml Bottle" / "Tablet" style display string
pub fn unit_display(unit_value: Option<&str>, unit: ProductUnit) -> String {
    match unit_value {
        Some(value) if !value.trim().is_empty() => format!("{} {}", value.trim(), unit.label()),
        _ => unit.label().to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub generic_name: Option<String>,
    pub indication: Option<String>,
    pub adult_dose: Option<String>,
    pub child_dose: Option<String>,
    pub contraindication: Option<String>,
    pub precaution: Option<String>,
    pub side_effect: Option<String>,
    pub category_id: String,
    pub brand_id: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub actual_price: Decimal,
    #[serde(default)]
    pub offer_percentage: Decimal,
    #[serde(default)]
    pub stock: u32,
    pub unit: ProductUnit,
    pub unit_value: Option<String>,
    pub weight_value: Option<u32>,
    pub weight_unit: Option<WeightUnit>,
    #[serde(default)]
    pub prescription_required: bool,
    pub image1: Option<ImageUpload>,
    pub image2: Option<ImageUpload>,
    pub image3: Option<ImageUpload>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub generic_name: Option<String>,
    pub indication: Option<String>,
    pub adult_dose: Option<String>,
    pub child_dose: Option<String>,
    pub contraindication: Option<String>,
    pub precaution: Option<String>,
    pub side_effect: Option<String>,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
    pub price: Option<Decimal>,
    pub actual_price: Option<Decimal>,
    pub offer_percentage: Option<Decimal>,
    pub stock: Option<u32>,
    pub unit: Option<ProductUnit>,
    pub unit_value: Option<String>,
    pub weight_value: Option<u32>,
    pub weight_unit: Option<WeightUnit>,
    pub prescription_required: Option<bool>,
    pub image1: Option<ImageUpload>,
    pub image2: Option<ImageUpload>,
    pub image3: Option<ImageUpload>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_prices(price: Decimal, new_price: Decimal) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "SKU-1".to_string(),
            name: "Napa 500".to_string(),
            slug: "napa-500".to_string(),
            description: None,
            generic_name: None,
            indication: None,
            adult_dose: None,
            child_dose: None,
            contraindication: None,
            precaution: None,
            side_effect: None,
            category_id: "c-1".to_string(),
            brand_id: None,
            price,
            actual_price: Decimal::ZERO,
            offer_percentage: Decimal::ZERO,
            new_price,
            discount_price: Decimal::ZERO,
            stock: 10,
            unit: ProductUnit::Tablet,
            unit_value: None,
            weight_value: None,
            weight_unit: None,
            weight_display: None,
            unit_display: None,
            package_quantity: None,
            prescription_required: false,
            image1_url: None,
            image2_url: None,
            image3_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_lower_discounted_price() {
        let product = product_with_prices(Decimal::new(10000, 2), Decimal::new(8000, 2));
        assert_eq!(product.effective_price(), Decimal::new(8000, 2));
    }

    #[test]
    fn test_effective_price_falls_back_to_base_price() {
        let no_offer = product_with_prices(Decimal::new(10000, 2), Decimal::ZERO);
        assert_eq!(no_offer.effective_price(), Decimal::new(10000, 2));

        let equal = product_with_prices(Decimal::new(10000, 2), Decimal::new(10000, 2));
        assert_eq!(equal.effective_price(), Decimal::new(10000, 2));
    }

    #[test]
    fn test_package_quantity_follows_unit() {
        assert_eq!(
            package_quantity_for(ProductUnit::Tablet),
            Some(PackageQuantity::Strip)
        );
        assert_eq!(
            package_quantity_for(ProductUnit::Capsule),
            Some(PackageQuantity::Strip)
        );
        assert_eq!(
            package_quantity_for(ProductUnit::Bottle),
            Some(PackageQuantity::Box)
        );
        assert_eq!(package_quantity_for(ProductUnit::Pcs), None);
    }

    #[test]
    fn test_display_fields_are_pure_functions_of_inputs() {
        assert_eq!(
            weight_display(Some(500), Some(WeightUnit::Mg)),
            Some("500 mg".to_string())
        );
        assert_eq!(weight_display(Some(500), None), None);
        assert_eq!(weight_display(None, Some(WeightUnit::Ml)), None);

        assert_eq!(unit_display(Some("5 ml"), ProductUnit::Bottle), "5 ml Bottle");
        assert_eq!(unit_display(None, ProductUnit::Tablet), "Tablet");
        assert_eq!(unit_display(Some("  "), ProductUnit::Capsule), "Capsule");
    }
}
