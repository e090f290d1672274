// churnflow-core/src/domain/preparation/mod.rs

//! Pure cleaning, labeling, joining and profiling of the ingested tables.

pub mod churn;
pub mod cleaning;
pub mod join;
pub mod statistics;

pub use churn::churned_customers;
pub use cleaning::{Cleaned, CleaningDelta, clean_billing, clean_crm, clean_subscriptions};
pub use join::{build_master, left_join};
pub use statistics::{DatasetStatistics, compute_statistics};
