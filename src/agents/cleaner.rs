//! "The Auditor": makes the raw table technically sound.

use async_trait::async_trait;

use super::prompts::CLEANER_PROMPT;
use super::{Agent, Workbench};
use crate::data::Dataset;
use crate::llm::{ToolCallRequest, ToolDeclaration};
use crate::tools::cleaning::{self, CleaningTool};
use crate::tools::{ToolError, Toolbox};

pub struct DataCleaner {
    bench: Workbench,
}

impl DataCleaner {
    pub fn new(df: Dataset) -> Self {
        Self {
            bench: Workbench::new(df),
        }
    }
}

#[async_trait]
impl Toolbox for DataCleaner {
    fn declarations(&self) -> Vec<ToolDeclaration> {
        CleaningTool::declarations()
    }

    async fn execute(&mut self, call: &ToolCallRequest) -> Result<String, ToolError> {
        match CleaningTool::parse(call)? {
            CleaningTool::InspectMetadata => Ok(cleaning::inspect_metadata(&self.bench.dataset)),
            CleaningTool::GetColumnStats { col } => {
                Ok(cleaning::get_column_stats(&self.bench.dataset, &col)?)
            }
            CleaningTool::ImputeMissing { col, strategy } => self
                .bench
                .apply(|df| cleaning::impute_missing(df, &col, strategy)),
            CleaningTool::DropColumn { col } => {
                self.bench.apply(|df| cleaning::drop_column(df, &col))
            }
        }
    }
}

impl Agent for DataCleaner {
    fn name(&self) -> &'static str {
        "The Auditor"
    }

    fn role(&self) -> &'static str {
        "Data Cleaner"
    }

    fn system_prompt(&self) -> String {
        CLEANER_PROMPT.to_string()
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
