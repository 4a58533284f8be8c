//! Tool system for the phase agents.
//!
//! Each agent exposes a closed set of capabilities. The model names a tool
//! and supplies JSON arguments; [`Toolbox::execute`] parses that request into
//! the agent's capability enum (validating arguments on the way) and runs it.
//! Names outside the set come back as [`ToolError::UnknownTool`], a normal
//! recoverable outcome that the driver reports to the model.

pub mod cleaning;
pub mod engineering;
pub mod sandbox;
pub mod stats;
pub mod training;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use thiserror::Error;

use crate::data::DataError;
use crate::llm::{ToolCallRequest, ToolDeclaration};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("{0}")]
    Execution(String),
}

/// Dispatch surface the conversation driver calls into.
#[async_trait]
pub trait Toolbox: Send {
    /// Declarations sent to the model once per conversation.
    fn declarations(&self) -> Vec<ToolDeclaration>;

    /// Run one requested tool against the owner's current state.
    async fn execute(&mut self, call: &ToolCallRequest) -> Result<String, ToolError>;
}

/// Deserialize a call's arguments into a typed struct.
pub(crate) fn parse_args<T: DeserializeOwned>(call: &ToolCallRequest) -> Result<T, ToolError> {
    let args = if call.args.is_null() {
        json!({})
    } else {
        call.args.clone()
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: call.name.clone(),
        reason: e.to_string(),
    })
}

/// Accept `8` as well as `8.0`; some backends send every number as a float.
pub(crate) fn de_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {}",
            value
        )))
    }
}

/// Build a declaration from a name, description and JSON Schema.
pub(crate) fn declaration(name: &str, description: &str, parameters: Value) -> ToolDeclaration {
    ToolDeclaration {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}
