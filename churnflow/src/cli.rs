// churnflow/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "churnflow")]
#[command(about = "Churn dataset pipeline: ingest, store, validate and prepare", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log filter for stderr (RUST_LOG syntax)
    #[arg(long, global = true, env = "CHURNFLOW_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the full pipeline (ingest -> store -> validate -> prepare -> stubs)
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Partition date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 📥 Ingests the sources and stores them as raw partitions
    Ingest {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Partition date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 🔍 Validates the raw partitions of one date
    Validate {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Partition date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 🔧 Builds the cleaned churn dataset from the latest partition
    Prepare {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🧹 Removes generated artifacts (clean lake, reports)
    Clean {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

impl Commands {
    pub fn project_dir(&self) -> &Path {
        match self {
            Self::Run { project_dir, .. }
            | Self::Ingest { project_dir, .. }
            | Self::Validate { project_dir, .. }
            | Self::Prepare { project_dir }
            | Self::Clean { project_dir } => project_dir,
        }
    }
}
