//! Model backend abstraction.
//!
//! The conversation driver talks to the model through [`LlmClient`] using the
//! wire-neutral types in this module. Concrete backends translate them:
//! [`GeminiClient`] for the hosted API, [`ScriptedClient`] for replaying a
//! fixed sequence of turns in tests and dry runs.

mod gemini;
mod scripted;

pub use gemini::GeminiClient;
pub use scripted::ScriptedClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("Scripted backend exhausted after {0} responses")]
    ScriptExhausted(usize),
}

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    /// Named arguments; an object, or `Null` when the model sent none.
    #[serde(default)]
    pub args: Value,
    /// Opaque token some models attach to a call. It must go back with
    /// the call when history is resent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
            thought_signature: None,
        }
    }

    /// Render the arguments as `k='v', n=3` for logs.
    pub fn args_summary(&self) -> String {
        match &self.args {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => format!("{}='{}'", k, s),
                    other => format!("{}={}", k, other),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Result of one tool call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub payload: String,
}

/// One piece of a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    FunctionCall(ToolCallRequest),
    FunctionResponse(ToolResult),
}

/// A single turn in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// All results of one tool-call turn, packed into a single user turn.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            parts: results.into_iter().map(Part::FunctionResponse).collect(),
        }
    }

    /// Tool calls in the order the model emitted them.
    pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// Concatenation of every text part.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// What the backend returned for one request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelResponse {
    /// `None` when the backend produced no content at all (refusal, safety block).
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

impl ModelResponse {
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            content: Some(Content::model(parts)),
            finish_reason: Some("STOP".to_string()),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_parts(vec![Part::Text(text.into())])
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self::from_parts(calls.into_iter().map(Part::FunctionCall).collect())
    }

    pub fn refusal(reason: impl Into<String>) -> Self {
        Self {
            content: None,
            finish_reason: Some(reason.into()),
        }
    }
}

/// Declaration of a tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON Schema `object` describing the accepted arguments.
    pub parameters: Value,
}

/// Everything the backend needs to produce the next turn.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system_instruction: String,
    pub tools: Vec<ToolDeclaration>,
    /// Full conversation history, oldest first.
    pub contents: Vec<Content>,
}

/// A chat model that supports function calling.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<ModelResponse, LlmError>;
}
