//! Phase agents.
//!
//! # Agent Types
//! - `DataCleaner` ("The Auditor"): audits the raw table, imputes and drops columns
//! - `FeatureEngineer` ("The Architect"): builds, encodes and selects features
//! - `ModelTrainer` ("The Coder"): writes and runs training scripts
//!
//! Every agent owns its dataset for the length of its phase and is consumed
//! by [`Agent::into_dataset`] when the phase hands off.

mod cleaner;
mod engineer;
pub mod prompts;
mod trainer;

pub use cleaner::DataCleaner;
pub use engineer::FeatureEngineer;
pub use trainer::ModelTrainer;

use std::sync::Arc;

use crate::agent::{ConversationDriver, PhaseOutcome};
use crate::data::{DataError, Dataset};
use crate::llm::LlmClient;
use crate::tools::{ToolError, Toolbox};

/// A role-specific prompt and capability set bound to owned dataset state.
pub trait Agent: Toolbox {
    /// Persona name, e.g. "The Auditor".
    fn name(&self) -> &'static str;

    /// Role description, e.g. "Data Cleaner".
    fn role(&self) -> &'static str;

    fn system_prompt(&self) -> String;

    /// Outcome messages of every successful action, oldest first.
    fn actions(&self) -> &[String];

    fn dataset(&self) -> &Dataset;

    /// End the phase, handing the final table to the caller.
    fn into_dataset(self) -> Dataset
    where
        Self: Sized;
}

/// Drive `agent` through one full conversation.
pub async fn run_phase<A: Agent>(
    agent: &mut A,
    llm: Arc<dyn LlmClient>,
    model: &str,
    max_turns: usize,
    kickoff: &str,
) -> PhaseOutcome {
    tracing::info!("{} ({}) taking over", agent.name(), agent.role());
    let mut driver = ConversationDriver::new(
        llm,
        model,
        agent.name(),
        agent.system_prompt(),
        agent.declarations(),
    )
    .with_max_turns(max_turns);

    driver.run(agent, kickoff).await
}

/// Dataset plus action log shared by the data-mutating agents.
#[derive(Debug, Clone, Default)]
pub(crate) struct Workbench {
    pub dataset: Dataset,
    pub actions: Vec<String>,
}

impl Workbench {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            actions: Vec::new(),
        }
    }

    /// Run a transform on a fresh copy of the table. The copy replaces the
    /// current version only if the transform succeeds.
    pub fn apply<F>(&mut self, transform: F) -> Result<String, ToolError>
    where
        F: FnOnce(Dataset) -> Result<(Dataset, String), DataError>,
    {
        let (dataset, message) = transform(self.dataset.clone())?;
        self.dataset = dataset;
        self.actions.push(message.clone());
        Ok(message)
    }
}
