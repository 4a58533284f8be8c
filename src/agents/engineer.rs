//! "The Architect": derives, encodes and selects features.

use async_trait::async_trait;

use super::prompts::engineer_prompt;
use super::{Agent, Workbench};
use crate::data::Dataset;
use crate::llm::{ToolCallRequest, ToolDeclaration};
use crate::tools::cleaning::inspect_metadata;
use crate::tools::engineering::{self, EngineeringTool};
use crate::tools::{ToolError, Toolbox};

pub struct FeatureEngineer {
    bench: Workbench,
    target: String,
    cleaner_summary: String,
}

impl FeatureEngineer {
    /// `cleaner_summary` is the previous phase's final text.
    pub fn new(df: Dataset, target: impl Into<String>, cleaner_summary: impl Into<String>) -> Self {
        Self {
            bench: Workbench::new(df),
            target: target.into(),
            cleaner_summary: cleaner_summary.into(),
        }
    }
}

#[async_trait]
impl Toolbox for FeatureEngineer {
    fn declarations(&self) -> Vec<ToolDeclaration> {
        EngineeringTool::declarations()
    }

    async fn execute(&mut self, call: &ToolCallRequest) -> Result<String, ToolError> {
        match EngineeringTool::parse(call)? {
            EngineeringTool::CreateInteraction {
                col1,
                col2,
                operation,
            } => self
                .bench
                .apply(|df| engineering::create_interaction(df, &col1, &col2, operation)),
            EngineeringTool::EncodeCategorical { col, method } => self
                .bench
                .apply(|df| engineering::encode_categorical(df, &col, method)),
            EngineeringTool::CorrelationAnalysis { target } => Ok(
                engineering::correlation_analysis(&self.bench.dataset, &target)?,
            ),
            EngineeringTool::SelectTopFeatures { target, k } => self
                .bench
                .apply(|df| engineering::select_top_features(df, &target, k)),
            EngineeringTool::InspectMetadata => Ok(inspect_metadata(&self.bench.dataset)),
        }
    }
}

impl Agent for FeatureEngineer {
    fn name(&self) -> &'static str {
        "The Architect"
    }

    fn role(&self) -> &'static str {
        "Feature Engineer"
    }

    fn system_prompt(&self) -> String {
        engineer_prompt(&self.target, &self.cleaner_summary)
    }

    fn actions(&self) -> &[String] {
        &self.bench.actions
    }

    fn dataset(&self) -> &Dataset {
        &self.bench.dataset
    }

    fn into_dataset(self) -> Dataset {
        self.bench.dataset
    }
}
