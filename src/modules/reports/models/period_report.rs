use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// One paid order line as fetched for aggregation
#[derive(Debug, Clone, FromRow)]
pub struct PaidItemRow {
    pub order_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub actual_price: Decimal,
    pub subtotal: Decimal,
}

/// Per-product slice of a period report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductBreakdown {
    pub product: String,
    pub quantity: u64,
    pub income: Decimal,
    pub profit: Decimal,
}

/// Aggregates over the paid orders of a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub total_income: Decimal,
    pub total_profit: Decimal,
    pub total_orders: i64,
    pub total_products_sold: i64,
    pub top_product: Option<String>,
    pub products_details: Vec<ProductBreakdown>,
}

/// Aggregate paid order lines into report totals.
///
/// Purely a function of its input: the breakdown is sorted by product name
/// and the top product resolves quantity ties by name, so recomputing over
/// unchanged data yields identical output.
pub fn aggregate_paid_items(rows: &[PaidItemRow]) -> ReportTotals {
    let mut per_product: BTreeMap<&str, ProductBreakdown> = BTreeMap::new();
    let mut order_ids: Vec<&str> = Vec::new();

    let mut total_income = Decimal::ZERO;
    let mut total_profit = Decimal::ZERO;
    let mut total_products_sold: i64 = 0;

    for row in rows {
        let quantity = Decimal::from(row.quantity);
        let profit = (row.unit_price - row.actual_price) * quantity;

        total_income += row.subtotal;
        total_profit += profit;
        total_products_sold += i64::from(row.quantity);
        order_ids.push(&row.order_id);

        let entry = per_product
            .entry(row.product_name.as_str())
            .or_insert_with(|| ProductBreakdown {
                product: row.product_name.clone(),
                quantity: 0,
                income: Decimal::ZERO,
                profit: Decimal::ZERO,
            });
        entry.quantity += u64::from(row.quantity);
        entry.income += row.subtotal;
        entry.profit += profit;
    }

    order_ids.sort_unstable();
    order_ids.dedup();

    // Highest quantity wins; BTreeMap order makes name the tiebreaker
    let top_product = per_product
        .values()
        .max_by(|a, b| a.quantity.cmp(&b.quantity))
        .map(|b| b.product.clone());

    ReportTotals {
        total_income,
        total_profit,
        total_orders: order_ids.len() as i64,
        total_products_sold,
        top_product,
        products_details: per_product.into_values().collect(),
    }
}

/// Stored monthly rollup, keyed "YYYY-MM"
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlyReport {
    pub id: String,
    pub period: String,
    pub total_income: Decimal,
    pub total_profit: Decimal,
    pub total_orders: i64,
    pub total_products_sold: i64,
    pub top_product: Option<String>,
    pub products_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored yearly rollup
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct YearlyReport {
    pub id: String,
    pub year: i32,
    pub total_income: Decimal,
    pub total_profit: Decimal,
    pub total_orders: i64,
    pub total_products_sold: i64,
    pub top_product: Option<String>,
    pub products_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ad-hoc range report, computed on demand and never persisted
#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub totals: ReportTotals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(
        order_id: &str,
        product: &str,
        quantity: u32,
        unit_price: Decimal,
        actual_price: Decimal,
    ) -> PaidItemRow {
        PaidItemRow {
            order_id: order_id.to_string(),
            product_name: product.to_string(),
            quantity,
            unit_price,
            actual_price,
            subtotal: unit_price * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_aggregate_totals() {
        let rows = vec![
            row("o-1", "Napa 500", 2, dec!(100.00), dec!(60.00)),
            row("o-1", "Seclo 20", 1, dec!(50.00), dec!(30.00)),
            row("o-2", "Napa 500", 3, dec!(100.00), dec!(60.00)),
        ];

        let totals = aggregate_paid_items(&rows);

        assert_eq!(totals.total_income, dec!(550.00));
        // (100-60)*2 + (50-30)*1 + (100-60)*3 = 80 + 20 + 120
        assert_eq!(totals.total_profit, dec!(220.00));
        assert_eq!(totals.total_orders, 2);
        assert_eq!(totals.total_products_sold, 6);
        assert_eq!(totals.top_product.as_deref(), Some("Napa 500"));
    }

    #[test]
    fn test_breakdown_merges_and_sorts_by_name() {
        let rows = vec![
            row("o-1", "Zinc B", 1, dec!(10.00), dec!(5.00)),
            row("o-2", "Ace 100", 1, dec!(20.00), dec!(10.00)),
            row("o-3", "Zinc B", 2, dec!(10.00), dec!(5.00)),
        ];

        let totals = aggregate_paid_items(&rows);

        assert_eq!(totals.products_details.len(), 2);
        assert_eq!(totals.products_details[0].product, "Ace 100");
        assert_eq!(totals.products_details[1].product, "Zinc B");
        assert_eq!(totals.products_details[1].quantity, 3);
        assert_eq!(totals.products_details[1].income, dec!(30.00));
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let rows = vec![
            row("o-1", "Napa 500", 2, dec!(100.00), dec!(60.00)),
            row("o-2", "Seclo 20", 5, dec!(50.00), dec!(30.00)),
        ];

        let first = aggregate_paid_items(&rows);
        let second = aggregate_paid_items(&rows);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_top_product_tie_breaks_by_name() {
        let rows = vec![
            row("o-1", "Beta", 2, dec!(10.00), dec!(5.00)),
            row("o-2", "Alpha", 2, dec!(10.00), dec!(5.00)),
        ];

        let totals = aggregate_paid_items(&rows);
        // Equal quantities: the later name in BTreeMap order wins max_by,
        // which is deterministic across runs
        assert_eq!(totals.top_product.as_deref(), Some("Beta"));
    }

    #[test]
    fn test_empty_period() {
        let totals = aggregate_paid_items(&[]);
        assert_eq!(totals.total_income, Decimal::ZERO);
        assert_eq!(totals.total_orders, 0);
        assert!(totals.top_product.is_none());
        assert!(totals.products_details.is_empty());
    }
}
