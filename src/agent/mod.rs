//! Agent module - the conversation driver.
//!
//! The driver follows a "tools in a loop" pattern:
//! 1. Send the conversation so far, with the system instruction and tools
//! 2. If the model requests tool calls, execute them and feed the results back
//! 3. Repeat until the model answers without tool calls or the turn ceiling is hit

mod agent_loop;
mod conversation;
pub mod state;

pub use agent_loop::{ConversationDriver, LogEntryType, PhaseOutcome, RunLogEntry};
pub use conversation::Conversation;
pub use state::{DriverState, Effect, Termination};
