// Metrics Aggregator - one pure pass over the two record tables. Called
// after every mutation so the dashboard always reflects the current data.
// Total by construction: bad fields were already coerced at ingest, empty
// tables fold to zero, so there is nothing left to fail.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::{
    ExpenseRecord, SaleRecord, CATEGORY_ACCESSORIES, CATEGORY_MOBILE, CATEGORY_REPAIR,
};

/// Transaction type counted as revenue for today's sales figure
pub const SALE_TYPE: &str = "Sale";

/// All scalar dashboard figures from one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub today_sales: f64,
    pub today_profit: f64,
    pub today_expenditure: f64,
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_expenditure: f64,
    pub pending_payments: f64,
    pub mobile_sales: f64,
    pub accessories_sales: f64,
    pub service_sales: f64,
}

impl DashboardMetrics {
    /// Category sales as labeled chart bars.
    pub fn sales_distribution(&self) -> [(&'static str, f64); 3] {
        [
            ("Mobiles", self.mobile_sales),
            ("Accessories", self.accessories_sales),
            ("Services", self.service_sales),
        ]
    }
}

/// Compute every dashboard figure from the current tables and a reference
/// date. Rows without a parseable date are excluded from the date-filtered
/// figures but still count toward the unfiltered totals.
pub fn aggregate(
    sales: &[SaleRecord],
    expenses: &[ExpenseRecord],
    today: NaiveDate,
) -> DashboardMetrics {
    let mut m = DashboardMetrics::default();

    for sale in sales {
        m.total_sales += sale.selling_price;
        m.total_profit += sale.profit;
        m.pending_payments += sale.left_amount;

        if sale.date == Some(today) {
            // today_sales filters on type, today_profit does not
            if sale.kind == SALE_TYPE {
                m.today_sales += sale.selling_price;
            }
            m.today_profit += sale.profit;
        }

        // Only the three fixed labels have buckets; anything else
        // contributes to total_sales alone
        match sale.category.as_str() {
            CATEGORY_MOBILE => m.mobile_sales += sale.selling_price,
            CATEGORY_ACCESSORIES => m.accessories_sales += sale.selling_price,
            CATEGORY_REPAIR => m.service_sales += sale.selling_price,
            _ => {}
        }
    }

    for expense in expenses {
        m.total_expenditure += expense.amount;
        if expense.date == Some(today) {
            m.today_expenditure += expense.amount;
        }
    }

    m
}

/// Profit summed per distinct date, ascending - the line-chart series.
pub fn daily_profit(sales: &[SaleRecord]) -> Vec<(NaiveDate, f64)> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for sale in sales {
        if let Some(date) = sale.date {
            *by_date.entry(date).or_insert(0.0) += sale.profit;
        }
    }

    by_date.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn day(s: &str) -> NaiveDate {
        d(s).unwrap()
    }

    #[test]
    fn test_dashboard_scenario() {
        let today = day("2024-01-15");
        let sales = vec![
            SaleRecord::new(Some(today), "Sale", "Mobile", 1000.0, 200.0, 0.0),
            SaleRecord::new(d("2024-01-14"), "Sale", "Accessories", 500.0, 100.0, 0.0),
        ];
        let expenses = vec![ExpenseRecord::new(Some(today), 300.0)];

        let m = aggregate(&sales, &expenses, today);

        assert_eq!(m.today_sales, 1000.0);
        assert_eq!(m.total_sales, 1500.0);
        assert_eq!(m.today_profit, 200.0);
        assert_eq!(m.total_profit, 300.0);
        assert_eq!(m.today_expenditure, 300.0);
        assert_eq!(m.mobile_sales, 1000.0);
        assert_eq!(m.accessories_sales, 500.0);
        assert_eq!(m.pending_payments, 0.0);
    }

    #[test]
    fn test_empty_tables_are_all_zero() {
        let m = aggregate(&[], &[], day("2024-01-15"));
        assert_eq!(m, DashboardMetrics::default());
        assert!(daily_profit(&[]).is_empty());
    }

    #[test]
    fn test_today_sales_filters_on_type_but_today_profit_does_not() {
        let today = day("2024-01-15");
        let sales = vec![
            SaleRecord::new(Some(today), "Sale", "Mobile", 1000.0, 200.0, 0.0),
            SaleRecord::new(Some(today), "Trade-In", "Mobile", 400.0, 50.0, 0.0),
        ];

        let m = aggregate(&sales, &[], today);

        assert_eq!(m.today_sales, 1000.0);
        assert_eq!(m.today_profit, 250.0);
        // total_sales ignores the type entirely
        assert_eq!(m.total_sales, 1400.0);
    }

    #[test]
    fn test_unrecognized_category_has_no_bucket() {
        let today = day("2024-01-15");
        let sales = vec![SaleRecord::new(Some(today), "Sale", "Other", 700.0, 100.0, 0.0)];

        let m = aggregate(&sales, &[], today);

        assert_eq!(m.total_sales, 700.0);
        assert_eq!(m.mobile_sales, 0.0);
        assert_eq!(m.accessories_sales, 0.0);
        assert_eq!(m.service_sales, 0.0);
    }

    #[test]
    fn test_undated_rows_count_toward_totals_only() {
        let today = day("2024-01-15");
        let sales = vec![SaleRecord::new(None, "Sale", "Mobile", 1000.0, 200.0, 150.0)];
        let expenses = vec![ExpenseRecord::new(None, 80.0)];

        let m = aggregate(&sales, &expenses, today);

        assert_eq!(m.today_sales, 0.0);
        assert_eq!(m.today_profit, 0.0);
        assert_eq!(m.today_expenditure, 0.0);
        assert_eq!(m.total_sales, 1000.0);
        assert_eq!(m.total_expenditure, 80.0);
        assert_eq!(m.pending_payments, 150.0);
        assert!(daily_profit(&sales).is_empty());
    }

    #[test]
    fn test_daily_profit_ascending_one_point_per_date() {
        let sales = vec![
            SaleRecord::new(d("2024-01-16"), "Sale", "Mobile", 500.0, 120.0, 0.0),
            SaleRecord::new(d("2024-01-14"), "Sale", "Repair", 300.0, 80.0, 0.0),
            SaleRecord::new(d("2024-01-16"), "Repair", "Repair", 200.0, 30.0, 0.0),
        ];

        let series = daily_profit(&sales);

        assert_eq!(
            series,
            vec![(day("2024-01-14"), 80.0), (day("2024-01-16"), 150.0)]
        );
    }

    #[test]
    fn test_sales_distribution_labels() {
        let m = DashboardMetrics {
            mobile_sales: 10.0,
            accessories_sales: 20.0,
            service_sales: 30.0,
            ..Default::default()
        };

        assert_eq!(
            m.sales_distribution(),
            [("Mobiles", 10.0), ("Accessories", 20.0), ("Services", 30.0)]
        );
    }
}
