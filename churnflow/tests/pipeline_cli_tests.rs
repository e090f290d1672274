use anyhow::Result;
use predicates::prelude::*;
use rusqlite::Connection;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use assert_cmd::prelude::*;

const RUN_DATE: &str = "2024-01-02";

const CONFIG: &str = "\
name: telecom-churn
version: \"1.0\"
source:
  engine: sqlite
  database: telecom.db
  crm_csv: crm.csv
validation:
  quality_threshold: 60
orchestration:
  ingestion:
    retries: 0
    delay_seconds: 0
";

const CRM: &str = "\
ticket_id,customer_id,request_type,status,created_at,disconnect_reason,request_reason
1,1,disconnect,closed,2024-01-01 09:00:00,price,
2,2,complaint,open,2024-01-01 10:30:00,,slow network
3,2,Inquiry,Resolved,2024-01-01 11:00:00,,plan change
";

/// Temporary project with a SQLite source and a CRM export.
struct ChurnflowTestEnv {
    tmp: TempDir,
}

impl ChurnflowTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        std::fs::write(tmp.path().join("churnflow.yaml"), CONFIG)?;
        std::fs::write(tmp.path().join("crm.csv"), CRM)?;

        let conn = Connection::open(tmp.path().join("telecom.db"))?;
        conn.execute_batch(
            "CREATE TABLE billing (customer_id INTEGER, amount REAL, billing_date TEXT);
             INSERT INTO billing VALUES
                (1, 49.9, '2024-01-01'),
                (2, 35.0, '2024-01-01'),
                (3, -10.0, '2024-01-01'),
                (4, 20.0, '2024-01-01');
             CREATE TABLE subscriptions (customer_id INTEGER, status TEXT, monthly_fee REAL);
             INSERT INTO subscriptions VALUES
                (1, 'Active', 49.9),
                (2, 'act', 35.0),
                (4, 'suspended', 20.0);",
        )?;
        Ok(Self { tmp })
    }

    fn empty() -> Result<Self> {
        Ok(Self {
            tmp: tempfile::tempdir()?,
        })
    }

    fn root(&self) -> &Path {
        self.tmp.path()
    }

    fn churnflow(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("churnflow"));
        cmd.arg("--log-level").arg("warn");
        cmd
    }

    fn run(&self, args: &[&str]) -> Command {
        let mut cmd = self.churnflow();
        cmd.args(args).arg("--project-dir").arg(self.root());
        cmd
    }
}

#[test]
fn test_full_run_writes_dataset_and_reports() -> Result<()> {
    let env = ChurnflowTestEnv::new()?;

    env.run(&["run", "--date", RUN_DATE])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"))
        .stdout(predicate::str::contains("Model Building"));

    let dataset = env
        .root()
        .join("data/clean/churn_dataset/dt=2024-01-02/cleaned_churn_dataset.csv");
    let content = std::fs::read_to_string(&dataset)?;
    let mut lines = content.lines();
    let header = lines.next().unwrap_or_default();
    assert!(header.starts_with("customer_id,"), "header: {}", header);
    assert!(header.ends_with("is_churned"), "header: {}", header);
    // customer 3 has a negative amount and is dropped
    assert_eq!(lines.count(), 3);

    for table in ["billing", "subscriptions", "crm"] {
        let raw = env
            .root()
            .join(format!("data/raw/{table}/dt={RUN_DATE}/{table}.csv"));
        assert!(raw.is_file(), "missing raw partition for {}", table);
    }

    let runs: Vec<_> = std::fs::read_dir(env.root().join("reports"))?
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(runs.len(), 1);
    let run_dir = runs[0].path();
    assert!(run_dir.join("validation_report.md").is_file());
    assert!(run_dir.join("preparation_report.md").is_file());
    let summary = std::fs::read_to_string(run_dir.join("run_summary.json"))?;
    assert!(summary.contains("\"Feature Store\""));

    Ok(())
}

#[test]
fn test_validate_date_without_partitions_reports_zero_tables() -> Result<()> {
    let env = ChurnflowTestEnv::new()?;
    env.run(&["ingest", "--date", RUN_DATE]).assert().success();

    env.run(&["validate", "--date", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tables validated: 0/3"));

    env.run(&["validate", "--date", RUN_DATE])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tables validated: 3/3"))
        .stdout(predicate::str::contains("Subscriptions"));
    Ok(())
}

#[test]
fn test_missing_config_fails() -> Result<()> {
    let env = ChurnflowTestEnv::empty()?;
    env.run(&["run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load project configuration"));
    Ok(())
}

#[test]
fn test_prepare_on_empty_lake_fails() -> Result<()> {
    let env = ChurnflowTestEnv::new()?;
    env.run(&["prepare"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Preparation failed"));
    assert!(!env.root().join("data/clean").exists());
    Ok(())
}

#[test]
fn test_clean_removes_outputs_but_keeps_raw_lake() -> Result<()> {
    let env = ChurnflowTestEnv::new()?;
    env.run(&["run", "--date", RUN_DATE]).assert().success();

    env.run(&["clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Artifact removed: reports"));

    assert!(!env.root().join("reports").exists());
    assert!(!env.root().join("data/clean").exists());
    assert!(env.root().join("data/raw/billing").is_dir());
    Ok(())
}
