//! # AutoML Agents
//!
//! A three-phase AutoML pipeline driven by tool-calling language models.
//!
//! This library provides:
//! - A conversation driver that runs a model against a set of typed tools
//! - Three role agents that clean, engineer and train on a tabular dataset
//! - A Gemini backend plus a scripted backend for deterministic tests
//!
//! ## Architecture
//!
//! Every phase follows the "tools in a loop" pattern:
//! 1. Send the system prompt, tool declarations and full history to the model
//! 2. Execute any requested tool calls against the agent's dataset
//! 3. Feed the results back, repeat until the model answers in plain text
//!
//! The final table of one phase and its summary text seed the next.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use automl_agents::{config::Config, data::Dataset, llm::GeminiClient, pipeline::Pipeline};
//!
//! let config = Config::from_env()?;
//! let llm = Arc::new(GeminiClient::new(&config.api_key, &config.base_url));
//! let raw = Dataset::from_csv_path(&config.raw_data_path())?;
//! let report = Pipeline::new(config, llm).run(raw).await?;
//! println!("{}", report.markdown);
//! ```

pub mod agent;
pub mod agents;
pub mod config;
pub mod data;
pub mod llm;
pub mod pipeline;
pub mod tools;

pub use config::Config;
