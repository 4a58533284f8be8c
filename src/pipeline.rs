//! Three-phase pipeline: clean, engineer, train.
//!
//! Each phase owns the dataset while its conversation runs, then hands the
//! final table to the next phase along with its summary text. Phase
//! failures degrade into diagnostic text; only file writes are fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::agent::PhaseOutcome;
use crate::agents::{run_phase, Agent, DataCleaner, FeatureEngineer, ModelTrainer};
use crate::config::Config;
use crate::data::{DataError, Dataset};
use crate::llm::LlmClient;
use crate::tools::sandbox::CodeRunner;

pub const CLEANER_KICKOFF: &str = "Please audit and clean the raw dataset.";
pub const ENGINEER_KICKOFF: &str =
    "Please perform feature engineering and selection on the clean data.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to write snapshot {}: {source}", .path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: DataError,
    },

    #[error("Failed to write report {}: {source}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything one pipeline run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    /// Cleaning, engineering and training, in order.
    pub phases: Vec<PhaseOutcome>,
    pub markdown: String,
    pub report_path: PathBuf,
    /// Table as handed to the trainer.
    pub dataset: Dataset,
}

pub struct Pipeline {
    config: Config,
    llm: Arc<dyn LlmClient>,
    workdir: PathBuf,
}

impl Pipeline {
    pub fn new(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            llm,
            workdir: PathBuf::from("."),
        }
    }

    /// Working directory for training scripts. Snapshot paths are handed
    /// to scripts in absolute form, so they do not depend on it.
    #[must_use]
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub async fn run(&self, raw: Dataset) -> Result<PipelineReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let model = self.config.default_model.as_str();
        let max_turns = self.config.max_turns;
        tracing::info!(
            "Starting pipeline run {} on {} rows x {} columns (model {})",
            run_id,
            raw.n_rows(),
            raw.n_cols(),
            model
        );

        banner("PHASE 1: DATA CLEANING");
        let mut cleaner = DataCleaner::new(raw);
        let cleaning = run_phase(&mut cleaner, self.llm.clone(), model, max_turns, CLEANER_KICKOFF).await;
        tracing::info!("Handoff: {} cleaning actions performed", cleaner.actions().len());
        let clean = cleaner.into_dataset();
        snapshot(&clean, &self.config.clean_data_path())?;

        banner("PHASE 2: FEATURE ENGINEERING");
        let mut engineer =
            FeatureEngineer::new(clean, &self.config.target_column, &cleaning.text);
        let engineering =
            run_phase(&mut engineer, self.llm.clone(), model, max_turns, ENGINEER_KICKOFF).await;
        tracing::info!(
            "Handoff: {} engineering actions performed",
            engineer.actions().len()
        );
        let engineered = engineer.into_dataset();
        let engineered_path = self.config.engineered_data_path();
        snapshot(&engineered, &engineered_path)?;
        let engineered_path =
            std::path::absolute(&engineered_path).map_err(|e| PipelineError::Snapshot {
                path: engineered_path.clone(),
                source: DataError::Io(e),
            })?;

        banner("PHASE 3: MODEL TRAINING");
        let runner = CodeRunner::new(self.config.sandbox.clone(), &self.workdir, engineered_path);
        let mut trainer = ModelTrainer::new(
            engineered,
            runner,
            &self.config.target_column,
            &engineering.text,
        );
        let kickoff = trainer.kickoff();
        let training = run_phase(&mut trainer, self.llm.clone(), model, max_turns, &kickoff).await;
        tracing::info!("{} training runs completed", trainer.actions().len());
        let dataset = trainer.into_dataset();

        let markdown = render_report(&cleaning.text, &engineering.text, &training.text);
        let report_path = self.config.report_path.clone();
        write_report(&report_path, &markdown).await?;
        tracing::info!("Pipeline complete. Report saved to {}", report_path.display());

        Ok(PipelineReport {
            run_id,
            phases: vec![cleaning, engineering, training],
            markdown,
            report_path,
            dataset,
        })
    }
}

/// Final report concatenating the three phase summaries.
pub fn render_report(cleaning: &str, engineering: &str, training: &str) -> String {
    format!(
        "# Multi-Agent AutoML Final Report\n\n\
         ## Agent 1: The Auditor (Data Cleaner)\n{}\n\n\
         ## Agent 2: The Architect (Feature Engineer)\n{}\n\n\
         ## Agent 3: The Coder (Model Trainer)\n{}\n",
        cleaning, engineering, training
    )
}

fn banner(title: &str) {
    tracing::info!("{}", "=".repeat(50));
    tracing::info!("{}", title);
    tracing::info!("{}", "=".repeat(50));
}

fn snapshot(df: &Dataset, path: &Path) -> Result<(), PipelineError> {
    df.to_csv_path(path).map_err(|source| PipelineError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Saved snapshot {}", path.display());
    Ok(())
}

async fn write_report(path: &Path, markdown: &str) -> Result<(), PipelineError> {
    let wrap = |source| PipelineError::Report {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
    }
    tokio::fs::write(path, markdown).await.map_err(wrap)
}
