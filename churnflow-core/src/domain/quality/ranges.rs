// churnflow-core/src/domain/quality/ranges.rs

use super::issue::{Issue, IssueKind, Severity};
use crate::domain::stats::{self, round2};
use crate::domain::table::{Column, Table};
use serde::Serialize;

const IQR_FACTOR: f64 = 1.5;
const HIGH_OUTLIER_PCT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation, absent below two values.
    pub std: Option<f64>,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierStat {
    pub count: usize,
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    #[serde(skip)]
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRange {
    pub column: String,
    pub summary: Option<NumericSummary>,
    pub outliers: Option<OutlierStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub columns: Vec<ColumnRange>,
}

/// IQR outlier scan over every numeric column.
pub fn check_ranges(table: &Table) -> (RangeReport, Vec<Issue>) {
    let rows = table.row_count();
    let mut issues = Vec::new();
    let mut columns = Vec::new();

    for col in table.columns().iter().filter(|c| c.dtype().is_numeric()) {
        let values = col.numeric_values();
        let summary = summarize(&values);
        let outliers = detect_outliers(col, &values, rows);

        if let Some(stat) = &outliers {
            if stat.percentage > HIGH_OUTLIER_PCT {
                issues.push(Issue::new(
                    IssueKind::Outliers,
                    Severity::High,
                    table.name(),
                    Some(col.name()),
                    format!(
                        "{}.{} has {:.1}% outliers",
                        table.name(),
                        col.name(),
                        stat.percentage
                    ),
                ));
            }
        }

        columns.push(ColumnRange {
            column: col.name().to_string(),
            summary,
            outliers,
        });
    }

    (RangeReport { columns }, issues)
}

fn summarize(values: &[f64]) -> Option<NumericSummary> {
    Some(NumericSummary {
        min: values.iter().copied().reduce(f64::min)?,
        max: values.iter().copied().reduce(f64::max)?,
        mean: stats::mean(values)?,
        std: stats::std_dev(values),
        median: stats::median(values)?,
    })
}

fn detect_outliers(col: &Column, values: &[f64], rows: usize) -> Option<OutlierStat> {
    let q1 = stats::quantile(values, 0.25)?;
    let q3 = stats::quantile(values, 0.75)?;
    let iqr = q3 - q1;
    let lower_bound = q1 - IQR_FACTOR * iqr;
    let upper_bound = q3 + IQR_FACTOR * iqr;

    let outlier_rows: Vec<usize> = col
        .values()
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.as_f64().map(|x| (i, x)))
        .filter(|&(_, x)| x < lower_bound || x > upper_bound)
        .map(|(i, _)| i)
        .collect();

    let pct = if rows == 0 {
        0.0
    } else {
        outlier_rows.len() as f64 / rows as f64 * 100.0
    };

    Some(OutlierStat {
        count: outlier_rows.len(),
        percentage: round2(pct),
        lower_bound,
        upper_bound,
        rows: outlier_rows,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table(cells: &[&str]) -> Table {
        let raw: Vec<Option<String>> = cells.iter().map(|s| Some(s.to_string())).collect();
        Table::new("billing", vec![Column::from_raw("amount", &raw)]).unwrap()
    }

    #[test]
    fn test_outliers_strictly_outside_bounds() {
        let t = table(&["10", "11", "12", "13", "14", "15", "16", "17", "18", "500"]);
        let (report, issues) = check_ranges(&t);

        let stat = report.columns[0].outliers.as_ref().unwrap();
        assert_eq!(stat.count, 1);
        let values = t.column("amount").unwrap().numeric_values();
        for &row in &stat.rows {
            let v = values[row];
            assert!(v < stat.lower_bound || v > stat.upper_bound);
        }
        assert_eq!(stat.percentage, 10.0);
        // 10% is not above the threshold
        assert!(issues.is_empty());
    }

    #[test]
    fn test_high_outlier_issue() {
        let t = table(&["1", "1", "1", "1", "1", "1", "1", "100"]);
        let (report, issues) = check_ranges(&t);
        let stat = report.columns[0].outliers.as_ref().unwrap();
        assert_eq!(stat.lower_bound, 1.0);
        assert_eq!(stat.upper_bound, 1.0);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "billing.amount has 12.5% outliers");
    }

    #[test]
    fn test_summary_values() {
        let t = table(&["1", "2", "3", "4"]);
        let (report, _) = check_ranges(&t);
        let summary = report.columns[0].summary.as_ref().unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.median, 2.5);
    }

    #[test]
    fn test_text_columns_are_ignored_and_all_null_has_no_stats() {
        let plan = Column::from_raw("plan", &[Some("basic"), Some("pro")]);
        let blank = Column::from_raw("notes", &[None::<&str>, None]);
        let t = Table::new("subscriptions", vec![plan, blank]).unwrap();
        let (report, issues) = check_ranges(&t);
        assert_eq!(report.columns.len(), 1);
        assert!(report.columns[0].summary.is_none());
        assert!(report.columns[0].outliers.is_none());
        assert!(issues.is_empty());
    }
}
