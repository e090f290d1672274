// churnflow-core/src/domain/quality/business_rules.rs

use super::issue::{Issue, IssueKind, Severity};
use crate::domain::table::{Column, Table, Value, value::parse_datetime};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

const VALID_SUBSCRIPTION_STATUSES: [&str; 4] = ["active", "inactive", "suspended", "cancelled"];
const VALID_REQUEST_TYPES: [&str; 5] =
    ["disconnect", "complaint", "upgrade", "inquiry", "billing_issue"];
const VALID_TICKET_STATUSES: [&str; 4] = ["open", "closed", "pending", "resolved"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleViolation {
    pub rule: String,
    pub violations: usize,
    pub table: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessRuleReport {
    pub rules_checked: Vec<String>,
    pub violations: Vec<RuleViolation>,
}

impl BusinessRuleReport {
    fn record(&mut self, checked: &str, rule: &str, table: &str, violations: usize) {
        if violations > 0 {
            self.violations.push(RuleViolation {
                rule: rule.to_string(),
                violations,
                table: table.to_string(),
            });
        }
        self.rules_checked.push(checked.to_string());
    }

    pub fn total_violations(&self) -> usize {
        self.violations.iter().map(|v| v.violations).sum()
    }

    /// One issue per violated rule.
    pub fn to_issues(&self, severity: Severity) -> Vec<Issue> {
        self.violations
            .iter()
            .map(|v| {
                Issue::new(
                    IssueKind::BusinessRule,
                    severity,
                    &v.table,
                    None,
                    format!("{}: {} violation(s) of '{}'", v.table, v.violations, v.rule),
                )
            })
            .collect()
    }
}

/// Domain rules for telecom billing, subscriptions and CRM tickets.
///
/// Rules whose column is absent are skipped. Date rules are skipped when any value fails to parse.
pub fn check_business_rules(
    tables: &BTreeMap<String, Table>,
    now: NaiveDateTime,
) -> BusinessRuleReport {
    let mut report = BusinessRuleReport::default();

    if let Some(billing) = tables.get("billing") {
        if let Some(amount) = billing.column("amount") {
            let negative = amount
                .values()
                .iter()
                .filter(|v| numeric(v).is_some_and(|x| x < 0.0))
                .count();
            report.record(
                "Positive billing amounts",
                "Billing amounts must be positive",
                "billing",
                negative,
            );
        }
        if let Some(future) = billing.column("billing_date").and_then(|c| future_count(c, now)) {
            report.record(
                "Billing date validity",
                "Billing dates cannot be in the future",
                "billing",
                future,
            );
        }
    }

    if let Some(subs) = tables.get("subscriptions") {
        if let Some(status) = subs.column("status") {
            report.record(
                "Subscription status validity",
                "Subscription status must be valid",
                "subscriptions",
                outside_vocabulary(status, &VALID_SUBSCRIPTION_STATUSES),
            );
        }
    }

    if let Some(crm) = tables.get("crm") {
        check_crm(crm, now, &mut report);
    }

    report
}

fn check_crm(crm: &Table, now: NaiveDateTime, report: &mut BusinessRuleReport) {
    let request_type = crm.column("request_type");

    if let Some(col) = request_type {
        report.record(
            "CRM request type validity",
            "CRM request types must be valid",
            "crm",
            outside_vocabulary(col, &VALID_REQUEST_TYPES),
        );
    }
    if let Some(col) = crm.column("status") {
        report.record(
            "CRM ticket status validity",
            "CRM ticket status must be valid",
            "crm",
            outside_vocabulary(col, &VALID_TICKET_STATUSES),
        );
    }
    if let Some(future) = crm.column("created_at").and_then(|c| future_count(c, now)) {
        report.record(
            "CRM ticket date validity",
            "CRM ticket dates cannot be in the future",
            "crm",
            future,
        );
    }

    let Some(request_type) = request_type else {
        return;
    };
    let is_disconnect: Vec<bool> = request_type
        .values()
        .iter()
        .map(|v| lowered(v).as_deref() == Some("disconnect"))
        .collect();

    if let Some(reason) = crm.column("disconnect_reason") {
        let missing = count_rows(&is_disconnect, reason, |disconnect, null| disconnect && null);
        if missing > 0 {
            report.violations.push(RuleViolation {
                rule: "Disconnect tickets must have disconnect reason".into(),
                violations: missing,
                table: "crm".into(),
            });
        }
        let unexpected =
            count_rows(&is_disconnect, reason, |disconnect, null| !disconnect && !null);
        report.record(
            "Disconnect reason completeness",
            "Non-disconnect tickets should not have disconnect reason",
            "crm",
            unexpected,
        );
    }

    if let Some(reason) = crm.column("request_reason") {
        report.record(
            "Request reason completeness",
            "Non-disconnect tickets must have request reason",
            "crm",
            count_rows(&is_disconnect, reason, |disconnect, null| !disconnect && null),
        );
    }
}

fn count_rows<F>(is_disconnect: &[bool], reason: &Column, pred: F) -> usize
where
    F: Fn(bool, bool) -> bool,
{
    is_disconnect
        .iter()
        .zip(reason.values())
        .filter(|(d, v)| pred(**d, v.is_null()))
        .count()
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Text(s) => s.trim().parse().ok(),
        other => other.as_f64(),
    }
}

/// Lower-cased text; non-text and missing cells have none.
fn lowered(v: &Value) -> Option<String> {
    v.as_text().map(str::to_lowercase)
}

/// Missing and non-text cells count as invalid.
fn outside_vocabulary(col: &Column, vocabulary: &[&str]) -> usize {
    col.values()
        .iter()
        .filter(|v| !lowered(v).is_some_and(|s| vocabulary.contains(&s.as_str())))
        .count()
}

/// `None` when a non-missing cell is not a timestamp.
fn future_count(col: &Column, now: NaiveDateTime) -> Option<usize> {
    let mut future = 0;
    for v in col.values() {
        let parsed = match v {
            v if v.is_null() => continue,
            Value::DateTime(dt) => *dt,
            Value::Text(s) => parse_datetime(s)?,
            _ => return None,
        };
        if parsed > now {
            future += 1;
        }
    }
    Some(future)
}
