// churnflow-core/src/application/pipeline.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{Instrument, error, info, info_span, warn};

use crate::application::ingestion::ingest_all;
use crate::application::ports::TemplateEngine;
use crate::application::preparation::run_preparation;
use crate::application::reporting;
use crate::application::stages::run_placeholder;
use crate::application::storage::store_all;
use crate::application::validation::run_validation;
use crate::domain::pipeline::PipelineStep;
use crate::domain::project::{ProjectConfig, StepPolicy};
use crate::error::ChurnflowError;
use crate::infrastructure::fs::atomic_write;
use crate::infrastructure::lake::DataLake;
use crate::ports::source::RecordSource;

const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Everything one pipeline run needs, borrowed from the caller.
pub struct PipelineContext<'a> {
    pub config: &'a ProjectConfig,
    pub project_dir: &'a Path,
    pub database: &'a dyn RecordSource,
    pub crm: &'a dyn RecordSource,
    pub renderer: &'a dyn TemplateEngine,
    pub run_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_name: String,
    pub run_date: String,
    pub started_at: String,
    pub completed_at: String,
    pub duration_seconds: f64,
    pub tasks_completed: Vec<&'static str>,
    pub total_records: usize,
    pub quality_score: u32,
    pub churn_rate: f64,
    pub output_file: String,
    pub reports_dir: String,
}

/// Runs `op` until it succeeds or `policy.retries` re-runs are used up.
pub async fn run_with_retry<T, F, Fut>(
    step: PipelineStep,
    policy: StepPolicy,
    mut op: F,
) -> Result<T, ChurnflowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChurnflowError>>,
{
    let attempts = policy.retries.saturating_add(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => {
                error!(step = step.key(), attempt, error = %e, "Step failed, no retries left");
                return Err(ChurnflowError::StepFailed {
                    step: step.display_name().to_string(),
                    attempts,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                warn!(
                    step = step.key(),
                    attempt,
                    delay_seconds = policy.delay_seconds,
                    error = %e,
                    "Step failed, retrying"
                );
                if policy.delay_seconds > 0 {
                    tokio::time::sleep(Duration::from_secs(policy.delay_seconds)).await;
                }
                attempt += 1;
            }
        }
    }
}

/// Runs the whole chain: ingest, store, validate, prepare, then the placeholder stages.
///
/// A step starts only once its predecessor succeeded. Partitions written by earlier steps are
/// left in place when a later step fails.
pub async fn run_pipeline(ctx: PipelineContext<'_>) -> Result<RunResult, ChurnflowError> {
    let started = Local::now();
    let run_name = format!("churnflow-{}", started.format("%Y%m%d-%H%M%S"));
    let span = info_span!("pipeline", run = %run_name);

    async move {
        println!("🚀 Starting pipeline run {}", run_name);
        let clock = Instant::now();

        let config = ctx.config;
        let lake = DataLake::new(ctx.project_dir.join(&config.data_root));
        let reports_dir = ctx.project_dir.join(&config.reports_path).join(&run_name);
        let policy = |step: PipelineStep| config.orchestration.policy(step);
        let mut completed = Vec::with_capacity(PipelineStep::SEQUENCE.len());

        // 1. Ingestion
        let step = PipelineStep::Ingestion;
        let (database, crm, tables, date) = (ctx.database, ctx.crm, &config.source.tables, ctx.run_date);
        let batch = run_with_retry(step, policy(step), move || {
            ingest_all(database, tables, crm, date)
        })
        .await?;
        write_report(
            ctx.renderer,
            &reports_dir,
            step,
            &reporting::ingestion_context(&batch),
        )?;
        println!("✅ {} ({} records)", step, batch.total_records);
        completed.push(step.display_name());

        // 2. Raw storage
        let step = PipelineStep::Storage;
        let (lake_ref, batch_ref) = (&lake, &batch);
        let stored = run_with_retry(step, policy(step), move || async move {
            store_all(lake_ref, batch_ref)
        })
        .await?;
        write_report(
            ctx.renderer,
            &reports_dir,
            step,
            &reporting::storage_context(&stored),
        )?;
        println!("✅ {} ({} tables)", step, stored.tables_stored.len());
        completed.push(step.display_name());

        // 3. Validation
        let step = PipelineStep::Validation;
        let rules = &config.validation;
        let validation = run_with_retry(step, policy(step), move || async move {
            run_validation(lake_ref, date, rules)
        })
        .await?;
        write_report(
            ctx.renderer,
            &reports_dir,
            step,
            &reporting::validation_context(&validation),
        )?;
        println!(
            "✅ {} (score {}/100, {})",
            step,
            validation.quality_score,
            validation.quality_label.as_str()
        );
        completed.push(step.display_name());

        // 4. Preparation
        let step = PipelineStep::Preparation;
        let prepared = run_with_retry(step, policy(step), move || async move {
            run_preparation(lake_ref)
        })
        .await?;
        write_report(
            ctx.renderer,
            &reports_dir,
            step,
            &reporting::preparation_context(&prepared),
        )?;
        println!(
            "✅ {} ({} rows x {} columns, churn rate {:.2}%)",
            step, prepared.master_shape.0, prepared.master_shape.1, prepared.statistics.churn_rate
        );
        completed.push(step.display_name());

        // 5-8. Placeholder stages
        for step in PipelineStep::SEQUENCE.into_iter().filter(|s| !s.has_report()) {
            run_with_retry(step, policy(step), move || run_placeholder(step)).await?;
            println!("⏭️  {} (placeholder)", step);
            completed.push(step.display_name());
        }

        let result = RunResult {
            run_name: run_name.clone(),
            run_date: date.to_string(),
            started_at: started.to_rfc3339(),
            completed_at: Local::now().to_rfc3339(),
            duration_seconds: clock.elapsed().as_secs_f64(),
            tasks_completed: completed,
            total_records: batch.total_records,
            quality_score: validation.quality_score,
            churn_rate: prepared.statistics.churn_rate,
            output_file: prepared.save.output_file,
            reports_dir: reports_dir.display().to_string(),
        };

        let summary = serde_json::to_string_pretty(&result)
            .map_err(crate::infrastructure::error::InfrastructureError::from)?;
        atomic_write(reports_dir.join(RUN_SUMMARY_FILE), summary)?;

        info!(
            tasks = result.tasks_completed.len(),
            duration = result.duration_seconds,
            "Pipeline completed successfully"
        );
        println!("🏁 Pipeline completed in {:.2}s", result.duration_seconds);
        Ok(result)
    }
    .instrument(span)
    .await
}

fn write_report(
    renderer: &dyn TemplateEngine,
    reports_dir: &Path,
    step: PipelineStep,
    context: &serde_json::Value,
) -> Result<PathBuf, ChurnflowError> {
    let template = format!("{}_report", step.key());
    let markdown = renderer.render(&template, context)?;
    let path = reports_dir.join(format!("{}.md", template));
    atomic_write(&path, markdown)?;
    info!(path = ?path, "Report written");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{CsvFileSource, DuckDBSource};
    use crate::infrastructure::report::JinjaRenderer;
    use anyhow::Result;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(retries: u32) -> Result<ProjectConfig> {
        let yaml = format!(
            "name: test\nsource:\n  database: ':memory:'\n  crm_csv: crm.csv\norchestration:\n  ingestion:\n    retries: {}\n    delay_seconds: 0\n",
            retries
        );
        Ok(serde_yaml::from_str(&yaml)?)
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() -> Result<()> {
        let calls = AtomicU32::new(0);
        let policy = StepPolicy {
            retries: 2,
            delay_seconds: 0,
        };
        let value = run_with_retry(PipelineStep::Storage, policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ChurnflowError::InternalError("transient".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await?;
        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_attempts() {
        let policy = StepPolicy {
            retries: 1,
            delay_seconds: 0,
        };
        let err = run_with_retry(PipelineStep::Validation, policy, || async {
            Err::<(), _>(ChurnflowError::InternalError("down".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ChurnflowError::StepFailed { ref step, attempts: 2, .. } if step == "Data Validation"
        ));
    }

    #[tokio::test]
    async fn test_full_run_writes_artifacts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let crm_path = dir.path().join("crm.csv");
        std::fs::write(
            &crm_path,
            "ticket_id,customer_id,request_type,status,created_at,disconnect_reason,request_reason\n\
             1,1,disconnect,closed,2024-01-01 10:00:00,price,\n\
             2,2,complaint,open,2024-01-01 11:00:00,,slow network\n",
        )?;
        let database = DuckDBSource::new(":memory:")?;
        database.execute(
            "CREATE TABLE billing (customer_id INTEGER, amount DOUBLE, billing_date VARCHAR);
             INSERT INTO billing VALUES (1, 40.0, '2024-01-01'), (2, 55.5, '2024-01-01'), (3, 20.0, '2024-01-01');
             CREATE TABLE subscriptions (customer_id INTEGER, status VARCHAR, monthly_fee DOUBLE);
             INSERT INTO subscriptions VALUES (1, 'active', 30.0), (2, 'act', 45.0), (3, 'suspended', 25.0);",
        )?;
        let config = config(0)?;
        let renderer = JinjaRenderer::new()?;
        let run_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let result = run_pipeline(PipelineContext {
            config: &config,
            project_dir: dir.path(),
            database: &database,
            crm: &CsvFileSource::new(&crm_path),
            renderer: &renderer,
            run_date,
        })
        .await?;

        assert_eq!(result.tasks_completed.len(), 8);
        assert_eq!(result.total_records, 8);
        assert!(Path::new(&result.output_file).is_file());

        let reports = Path::new(&result.reports_dir);
        for name in [
            "ingestion_report.md",
            "storage_report.md",
            "validation_report.md",
            "preparation_report.md",
            RUN_SUMMARY_FILE,
        ] {
            assert!(reports.join(name).is_file(), "missing {}", name);
        }
        assert!(
            dir.path()
                .join("data/raw/subscriptions/dt=2024-01-02/subscriptions.csv")
                .is_file()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_ingestion_aborts_before_storage() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let database = DuckDBSource::new(":memory:")?;
        let config = config(0)?;
        let renderer = JinjaRenderer::new()?;

        let err = run_pipeline(PipelineContext {
            config: &config,
            project_dir: dir.path(),
            database: &database,
            crm: &CsvFileSource::new(dir.path().join("missing.csv")),
            renderer: &renderer,
            run_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ChurnflowError::StepFailed { attempts: 1, .. }));
        assert!(!dir.path().join("data/raw").exists());
        Ok(())
    }
}
