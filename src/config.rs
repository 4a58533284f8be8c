//! Configuration management for the AutoML agents.
//!
//! Configuration can be set via environment variables:
//! - `LLM_HW_API_KEY` - Required. Access key for the model backend.
//! - `DEFAULT_MODEL` - Optional. Model used by every phase. Defaults to `gemini-2.5-pro`.
//! - `LLM_BASE_URL` - Optional. Backend base URL. Defaults to the public Gemini endpoint.
//! - `DATA_DIR` - Optional. Directory for raw data and phase snapshots. Defaults to `data`.
//! - `REPORT_PATH` - Optional. Final report location. Defaults to `FINAL_REPORT.md`.
//! - `MAX_TURNS` - Optional. Model turns allowed per phase. Defaults to `50`.
//! - `CODE_TIMEOUT_SECS` - Optional. Wall-clock limit for training scripts. Defaults to `120`.
//! - `CODE_MEMORY_LIMIT_MB` - Optional. Address-space cap for training scripts. Defaults to `2048`.
//! - `PYTHON_BIN` - Optional. Interpreter for training scripts. Defaults to `python3`.
//! - `TARGET_COLUMN` - Optional. Prediction target. Defaults to `ArsenalWin`.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Limits applied to the model-authored training scripts.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Interpreter binary
    pub python_bin: String,

    /// Wall-clock timeout in seconds (also used as the CPU-time rlimit)
    pub timeout_secs: u64,

    /// Address-space limit for the child process, in megabytes
    pub memory_limit_mb: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_bin: "python3".to_string(),
            timeout_secs: 120,
            memory_limit_mb: 2048,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model backend access key
    pub api_key: String,

    /// Model identifier
    pub default_model: String,

    /// Backend base URL
    pub base_url: String,

    /// Directory holding raw data and snapshots
    pub data_dir: PathBuf,

    /// Where the final markdown report is written
    pub report_path: PathBuf,

    /// Maximum model turns per phase
    pub max_turns: usize,

    /// Column the trainer predicts
    pub target_column: String,

    /// Training script limits
    pub sandbox: SandboxConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `LLM_HW_API_KEY` is not set or empty,
    /// and `ConfigError::InvalidValue` for unparsable or out-of-range numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("LLM_HW_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("LLM_HW_API_KEY".to_string()))?;

        let default_model =
            lookup("DEFAULT_MODEL").unwrap_or_else(|| "gemini-2.5-pro".to_string());

        let base_url = lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let report_path = lookup("REPORT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("FINAL_REPORT.md"));

        let max_turns: usize = parse_var(&lookup, "MAX_TURNS", 50)?;
        require_positive("MAX_TURNS", max_turns as u64)?;

        let target_column = lookup("TARGET_COLUMN").unwrap_or_else(|| "ArsenalWin".to_string());

        let timeout_secs: u64 = parse_var(&lookup, "CODE_TIMEOUT_SECS", 120)?;
        require_positive("CODE_TIMEOUT_SECS", timeout_secs)?;

        let sandbox = SandboxConfig {
            python_bin: lookup("PYTHON_BIN").unwrap_or_else(|| "python3".to_string()),
            timeout_secs,
            memory_limit_mb: parse_var(&lookup, "CODE_MEMORY_LIMIT_MB", 2048)?,
        };

        Ok(Self {
            api_key,
            default_model,
            base_url,
            data_dir,
            report_path,
            max_turns,
            target_column,
            sandbox,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            default_model: "gemini-2.5-pro".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from("data"),
            report_path: PathBuf::from("FINAL_REPORT.md"),
            max_turns: 50,
            target_column: "ArsenalWin".to_string(),
            sandbox: SandboxConfig::default(),
        }
    }

    /// Path of the raw input dataset.
    pub fn raw_data_path(&self) -> PathBuf {
        self.data_dir.join("raw_data.csv")
    }

    /// Path of the snapshot written after cleaning.
    pub fn clean_data_path(&self) -> PathBuf {
        self.data_dir.join("clean_data.csv")
    }

    /// Path of the snapshot written after feature engineering.
    pub fn engineered_data_path(&self) -> PathBuf {
        self.data_dir.join("engineered_data.csv")
    }
}

fn parse_var<T, F>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

fn require_positive(var: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue(
            var.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(())
}
