use crate::core::{AppError, Result};
use crate::modules::reports::models::ProductBreakdown;

/// Render a per-product breakdown as CSV
pub fn products_csv(breakdown: &[ProductBreakdown]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["product", "quantity", "income", "profit"])
        .map_err(|e| AppError::internal(format!("CSV encoding failed: {}", e)))?;

    for entry in breakdown {
        writer
            .write_record([
                entry.product.as_str(),
                &entry.quantity.to_string(),
                &entry.income.to_string(),
                &entry.profit.to_string(),
            ])
            .map_err(|e| AppError::internal(format!("CSV encoding failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV encoding failed: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| AppError::internal(format!("CSV encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_csv_shape() {
        let breakdown = vec![
            ProductBreakdown {
                product: "Napa 500".to_string(),
                quantity: 5,
                income: dec!(500.00),
                profit: dec!(200.00),
            },
            ProductBreakdown {
                product: "Seclo 20".to_string(),
                quantity: 2,
                income: dec!(100.00),
                profit: dec!(40.00),
            },
        ];

        let csv = products_csv(&breakdown).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "product,quantity,income,profit");
        assert_eq!(lines[1], "Napa 500,5,500.00,200.00");
        assert_eq!(lines[2], "Seclo 20,2,100.00,40.00");
    }

    #[test]
    fn test_empty_breakdown_is_header_only() {
        let csv = products_csv(&[]).unwrap();
        assert_eq!(csv.trim(), "product,quantity,income,profit");
    }

    #[test]
    fn test_product_names_with_commas_are_quoted() {
        let breakdown = vec![ProductBreakdown {
            product: "Cough Syrup, 100ml".to_string(),
            quantity: 1,
            income: dec!(80.00),
            profit: dec!(20.00),
        }];

        let csv = products_csv(&breakdown).unwrap();
        assert!(csv.contains("\"Cough Syrup, 100ml\""));
    }
}
