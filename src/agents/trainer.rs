//! "The Coder": writes training scripts and iterates on their metrics.

use async_trait::async_trait;

use super::prompts::trainer_prompt;
use super::Agent;
use crate::data::Dataset;
use crate::llm::{ToolCallRequest, ToolDeclaration};
use crate::tools::sandbox::CodeRunner;
use crate::tools::training::{self, TrainingTool};
use crate::tools::{ToolError, Toolbox};

pub struct ModelTrainer {
    dataset: Dataset,
    runner: CodeRunner,
    target: String,
    engineering_summary: String,
    runs: Vec<String>,
}

impl ModelTrainer {
    /// `runner` must point at a snapshot of `dataset` already on disk.
    pub fn new(
        dataset: Dataset,
        runner: CodeRunner,
        target: impl Into<String>,
        engineering_summary: impl Into<String>,
    ) -> Self {
        Self {
            dataset,
            runner,
            target: target.into(),
            engineering_summary: engineering_summary.into(),
            runs: Vec::new(),
        }
    }

    /// Kickoff message naming the snapshot and the target.
    pub fn kickoff(&self) -> String {
        format!(
            "Please train an XGBoost model on '{}' to predict '{}'.",
            self.runner.dataset_path().display(),
            self.target
        )
    }

    async fn execute_code(&mut self, code: &str) -> Result<String, ToolError> {
        let attempt = self.runs.len() + 1;
        let params = training::hyperparameters(code);
        if !params.is_empty() {
            let listed: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            tracing::info!("Training attempt {} with {}", attempt, listed.join(", "));
        } else {
            tracing::info!("Training attempt {}", attempt);
        }

        let output = self.runner.run(code).await?;

        let summary = match training::metrics(&output) {
            Some((accuracy, f1)) => {
                tracing::info!("Attempt {}: Accuracy={}, F1={}", attempt, accuracy, f1);
                format!("Training run {}: Accuracy={}, F1={}", attempt, accuracy, f1)
            }
            None => {
                if output.contains("Traceback") {
                    tracing::warn!("Attempt {} raised an exception", attempt);
                }
                format!("Training run {}: no metrics reported", attempt)
            }
        };
        self.runs.push(summary);
        Ok(output)
    }
}

#[async_trait]
impl Toolbox for ModelTrainer {
    fn declarations(&self) -> Vec<ToolDeclaration> {
        TrainingTool::declarations()
    }

    async fn execute(&mut self, call: &ToolCallRequest) -> Result<String, ToolError> {
        match TrainingTool::parse(call)? {
            TrainingTool::ExecutePythonCode { code } => self.execute_code(&code).await,
        }
    }
}

impl Agent for ModelTrainer {
    fn name(&self) -> &'static str {
        "The Coder"
    }

    fn role(&self) -> &'static str {
        "Model Trainer"
    }

    fn system_prompt(&self) -> String {
        trainer_prompt(
            &self.target,
            &self.runner.dataset_path().display().to_string(),
            &self.engineering_summary,
        )
    }

    /// One entry per script that ran to completion.
    fn actions(&self) -> &[String] {
        &self.runs
    }

    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn into_dataset(self) -> Dataset {
        self.dataset
    }
}
