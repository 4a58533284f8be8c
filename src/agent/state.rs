//! Pure state machine behind the conversation driver.
//!
//! The driver feeds every model response through [`next`], which decides
//! whether to dispatch tools or stop. Keeping this free of I/O lets the
//! termination rules be exercised with hand-built responses.

use crate::llm::{ModelResponse, ToolCallRequest};

/// Why a conversation stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The model answered without requesting tools.
    Completed(String),
    /// The model returned content with no parts.
    Empty,
    /// The backend produced no content; carries the finish reason if any.
    Refused(Option<String>),
    /// The model was still requesting tools on the last allowed turn.
    TurnLimit(usize),
    /// The backend request itself failed.
    BackendError(String),
}

impl Termination {
    /// Whether this is one of the two normal exits.
    pub fn is_success(&self) -> bool {
        matches!(self, Termination::Completed(_) | Termination::Empty)
    }

    /// The phase's final text; failures become a diagnostic naming `agent`.
    pub fn into_text(self, agent: &str) -> String {
        match self {
            Termination::Completed(text) => text,
            Termination::Empty => String::new(),
            Termination::Refused(reason) => format!(
                "[{}] Error: No content in response. Finish reason: {}",
                agent,
                reason.as_deref().unwrap_or("None")
            ),
            Termination::TurnLimit(max) => format!(
                "[{}] Error: Max turns ({}) exceeded without a final answer",
                agent, max
            ),
            Termination::BackendError(message) => {
                format!("[{}] Error: Model backend failed: {}", agent, message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverState {
    /// Waiting for model response number `turn + 1`.
    AwaitingModel { turn: usize },
    Terminated(Termination),
}

impl DriverState {
    pub fn start() -> Self {
        DriverState::AwaitingModel { turn: 0 }
    }
}

/// What the driver must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run these calls in order and send all results back in one turn.
    Dispatch(Vec<ToolCallRequest>),
    Finish(Termination),
}

/// Advance the conversation by one model response.
///
/// `max_turns` counts model responses: a response that still requests tools
/// on turn `max_turns` ends the conversation instead of being dispatched.
/// A terminated state absorbs further responses unchanged.
pub fn next(state: DriverState, response: &ModelResponse, max_turns: usize) -> (DriverState, Effect) {
    let turn = match state {
        DriverState::AwaitingModel { turn } => turn + 1,
        DriverState::Terminated(termination) => {
            return (
                DriverState::Terminated(termination.clone()),
                Effect::Finish(termination),
            )
        }
    };

    let termination = match &response.content {
        None => Termination::Refused(response.finish_reason.clone()),
        Some(content) if content.parts.is_empty() => Termination::Empty,
        Some(content) => {
            let calls = content.tool_calls();
            if calls.is_empty() {
                Termination::Completed(content.text())
            } else if turn >= max_turns {
                Termination::TurnLimit(max_turns)
            } else {
                return (DriverState::AwaitingModel { turn }, Effect::Dispatch(calls));
            }
        }
    };

    (
        DriverState::Terminated(termination.clone()),
        Effect::Finish(termination),
    )
}
