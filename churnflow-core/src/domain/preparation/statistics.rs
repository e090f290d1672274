// churnflow-core/src/domain/preparation/statistics.rs

use super::join::{CHURN_COLUMN, KEY_COLUMN};
use crate::domain::stats::{mean, round2};
use crate::domain::table::{CustomerKey, Table};
use serde::Serialize;
use std::collections::HashSet;

/// Descriptive statistics over the master table. No derived features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStatistics {
    pub total_customers: usize,
    pub unique_customers: usize,
    pub total_columns: usize,
    pub churned_customers: usize,
    pub churn_rate: f64,
    pub retention_rate: f64,
    pub columns_with_missing: usize,
    pub null_cell_percentage: f64,
    pub overall_completeness: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_billing_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_monthly_fee: Option<f64>,
}

pub fn compute_statistics(master: &Table) -> DatasetStatistics {
    let rows = master.row_count();

    let churned_customers = master.column(CHURN_COLUMN).map_or(0, |c| {
        c.numeric_values().iter().filter(|&&v| v == 1.0).count()
    });
    let (churn_rate, retention_rate) = if rows == 0 {
        (0.0, 0.0)
    } else {
        let rate = churned_customers as f64 / rows as f64;
        (round2(rate * 100.0), round2((1.0 - rate) * 100.0))
    };

    let unique_customers = master.column(KEY_COLUMN).map_or(0, |c| {
        c.values()
            .iter()
            .filter_map(|v| CustomerKey::from_value(v).ok().flatten())
            .collect::<HashSet<_>>()
            .len()
    });

    let total_cells = master.total_cells();
    let null_cell_percentage = if total_cells == 0 {
        0.0
    } else {
        master.null_count() as f64 / total_cells as f64 * 100.0
    };

    let column_mean = |name: &str| {
        master
            .column(name)
            .and_then(|c| mean(&c.numeric_values()))
            .map(round2)
    };

    DatasetStatistics {
        total_customers: rows,
        unique_customers,
        total_columns: master.column_count(),
        churned_customers,
        churn_rate,
        retention_rate,
        columns_with_missing: master.columns().iter().filter(|c| c.null_count() > 0).count(),
        null_cell_percentage: round2(null_cell_percentage),
        overall_completeness: round2(100.0 - null_cell_percentage),
        avg_billing_amount: column_mean("amount"),
        avg_monthly_fee: column_mean("monthly_fee"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::table::Column;

    #[test]
    fn test_rates_and_means() {
        let master = Table::new(
            "churn_dataset",
            vec![
                Column::from_raw("customer_id", &[Some("1"), Some("1"), Some("2"), Some("3")]),
                Column::from_raw("amount", &[Some("10"), Some("20"), Some("30"), Some("41")]),
                Column::from_raw("plan", &[Some("a"), None, Some("b"), Some("c")]),
                Column::from_raw("is_churned", &[Some("1"), Some("1"), Some("0"), Some("0")]),
            ],
        )
        .unwrap();

        let stats = compute_statistics(&master);
        assert_eq!(stats.total_customers, 4);
        assert_eq!(stats.unique_customers, 3);
        assert_eq!(stats.churned_customers, 2);
        assert_eq!(stats.churn_rate, 50.0);
        assert_eq!(stats.retention_rate, 50.0);
        assert_eq!(stats.columns_with_missing, 1);
        assert_eq!(stats.null_cell_percentage, 6.25);
        assert_eq!(stats.overall_completeness, 93.75);
        assert_eq!(stats.avg_billing_amount, Some(25.25));
        assert_eq!(stats.avg_monthly_fee, None);
    }

    #[test]
    fn test_empty_master() {
        let stats = compute_statistics(&Table::empty("churn_dataset"));
        assert_eq!(stats.churn_rate, 0.0);
        assert_eq!(stats.overall_completeness, 100.0);
    }
}
