//! Core conversation driver.

use std::sync::Arc;

use serde::Serialize;

use crate::llm::{
    Content, GenerateRequest, LlmClient, ToolCallRequest, ToolDeclaration, ToolResult,
};
use crate::tools::{ToolError, Toolbox};

use super::conversation::Conversation;
use super::state::{next, DriverState, Effect, Termination};

/// A single entry in a phase's execution log.
#[derive(Debug, Clone, Serialize)]
pub struct RunLogEntry {
    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Entry type
    pub entry_type: LogEntryType,

    /// Content of the entry
    pub content: String,
}

/// Types of log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    /// Tool is being called
    ToolCall,
    /// Tool returned a result
    ToolResult,
    /// Agent produced final response
    Response,
    /// The phase ended abnormally
    Error,
}

/// Result of driving one conversation to completion.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub agent: String,
    /// Final text, or a diagnostic when the phase degraded.
    pub text: String,
    pub termination: Termination,
    /// Model responses received.
    pub turns: usize,
    /// Tool calls dispatched.
    pub tool_calls: usize,
    pub log: Vec<RunLogEntry>,
}

impl PhaseOutcome {
    pub fn is_success(&self) -> bool {
        self.termination.is_success()
    }
}

/// Drives a multi-turn, tool-calling exchange with the model.
///
/// # Algorithm
/// 1. Append the user message and send the full history
/// 2. If the response requests tools: run them in order against the toolbox
/// 3. Send every result back as one turn and repeat
/// 4. Stop on the first response without tool calls, or on a refusal,
///    backend failure or the turn ceiling
///
/// Tool failures never stop the loop; they are reported to the model as text.
pub struct ConversationDriver {
    llm: Arc<dyn LlmClient>,
    model: String,
    agent: String,
    system_instruction: String,
    tools: Vec<ToolDeclaration>,
    max_turns: usize,
    conversation: Conversation,
}

impl ConversationDriver {
    /// Create a driver; the system instruction and tools are fixed for its lifetime.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        agent: impl Into<String>,
        system_instruction: impl Into<String>,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            agent: agent.into(),
            system_instruction: system_instruction.into(),
            tools,
            max_turns: 50,
            conversation: Conversation::new(),
        }
    }

    /// Set the per-run model turn ceiling (at least 1).
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    fn request(&self) -> GenerateRequest {
        GenerateRequest {
            system_instruction: self.system_instruction.clone(),
            tools: self.tools.clone(),
            contents: self.conversation.turns().to_vec(),
        }
    }

    /// Run the conversation until the model stops requesting tools.
    pub async fn run(&mut self, toolbox: &mut dyn Toolbox, initial_message: &str) -> PhaseOutcome {
        let mut log = Vec::new();
        let mut state = DriverState::start();
        let mut turns = 0;
        let mut tool_calls = 0;

        tracing::info!("{} is analyzing the task...", self.agent);
        self.conversation.push(Content::user_text(initial_message));

        let termination = loop {
            tracing::debug!("{} turn {}", self.agent, turns + 1);

            let response = match self.llm.generate(&self.model, &self.request()).await {
                Ok(response) => response,
                Err(e) => break Termination::BackendError(e.to_string()),
            };
            turns += 1;

            let (next_state, effect) = next(state, &response, self.max_turns);
            state = next_state;

            match effect {
                Effect::Finish(termination) => break termination,
                Effect::Dispatch(calls) => {
                    if let Some(content) = response.content {
                        self.conversation.push(content);
                    }
                    tool_calls += calls.len();
                    let results = self.dispatch(toolbox, calls, &mut log).await;
                    self.conversation.push(Content::tool_results(results));
                }
            }
        };

        let text = termination.clone().into_text(&self.agent);
        if termination.is_success() {
            tracing::info!("{}'s summary:\n{}", self.agent, text);
            log.push(log_entry(LogEntryType::Response, truncate_for_log(&text, 2000)));
        } else {
            tracing::warn!("{}", text);
            log.push(log_entry(LogEntryType::Error, text.clone()));
        }

        PhaseOutcome {
            agent: self.agent.clone(),
            text,
            termination,
            turns,
            tool_calls,
            log,
        }
    }

    /// Execute one turn's calls strictly in order, one result per call.
    async fn dispatch(
        &self,
        toolbox: &mut dyn Toolbox,
        calls: Vec<ToolCallRequest>,
        log: &mut Vec<RunLogEntry>,
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            tracing::info!("{}: using '{}' ({})", self.agent, call.name, call.args_summary());
            log.push(log_entry(
                LogEntryType::ToolCall,
                format!("Calling tool: {} with args: {}", call.name, call.args),
            ));

            let payload = match toolbox.execute(&call).await {
                Ok(output) => output,
                Err(e @ ToolError::UnknownTool(_)) => {
                    tracing::warn!("{}: {}", self.agent, e);
                    e.to_string()
                }
                Err(e) => {
                    tracing::warn!("{}: '{}' failed: {}", self.agent, call.name, e);
                    format!("Error: {}", e)
                }
            };

            log.push(log_entry(
                LogEntryType::ToolResult,
                truncate_for_log(&payload, 1000),
            ));
            results.push(ToolResult {
                name: call.name,
                payload,
            });
        }

        results
    }
}

fn log_entry(entry_type: LogEntryType, content: String) -> RunLogEntry {
    RunLogEntry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        entry_type,
        content,
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [truncated]", &s[..cut])
}
