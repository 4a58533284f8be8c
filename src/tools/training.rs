//! Model-training capability: run a model-authored script in the sandbox.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use super::{declaration, parse_args, ToolError};
use crate::llm::{ToolCallRequest, ToolDeclaration};

const HYPERPARAMETERS: [&str; 5] = [
    "max_depth",
    "learning_rate",
    "n_estimators",
    "min_samples_leaf",
    "min_samples_split",
];

#[derive(Debug, Deserialize)]
struct CodeArgs {
    code_string: String,
}

/// The trainer's capability set.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingTool {
    ExecutePythonCode { code: String },
}

impl TrainingTool {
    pub fn parse(call: &ToolCallRequest) -> Result<Self, ToolError> {
        match call.name.as_str() {
            "execute_python_code" => {
                let args: CodeArgs = parse_args(call)?;
                Ok(Self::ExecutePythonCode {
                    code: args.code_string,
                })
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn declarations() -> Vec<ToolDeclaration> {
        vec![declaration(
            "execute_python_code",
            "Executes Python code for training and evaluation. Returns logs and metrics.",
            json!({
                "type": "object",
                "properties": {
                    "code_string": {
                        "type": "string",
                        "description": "The full Python script to execute."
                    }
                },
                "required": ["code_string"]
            }),
        )]
    }
}

static HYPERPARAMETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(max_depth|learning_rate|n_estimators|min_samples_leaf|min_samples_split)\s*=\s*([\d.]+)",
    )
    .unwrap()
});
static ACCURACY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Accuracy:\s*([\d.]+)").unwrap());
static F1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"F1 Score:\s*([\d.]+)").unwrap());

/// Literal hyperparameter assignments found in a training script. The
/// first assignment of each name wins.
pub fn hyperparameters(code: &str) -> Vec<(&'static str, String)> {
    let mut found: Vec<(&str, &str)> = Vec::new();
    for caps in HYPERPARAMETER_RE.captures_iter(code) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let (name, value) = (name.as_str(), value.as_str());
        if !found.iter().any(|(seen, _)| *seen == name) {
            found.push((name, value));
        }
    }
    HYPERPARAMETERS
        .iter()
        .filter_map(|name| {
            let (_, value) = found.iter().find(|(seen, _)| seen == name)?;
            Some((*name, value.to_string()))
        })
        .collect()
}

/// `(accuracy, f1)` as printed by a training script, if both are present.
pub fn metrics(output: &str) -> Option<(String, String)> {
    let acc = ACCURACY_RE.captures(output)?.get(1)?.as_str().to_string();
    let f1 = F1_RE.captures(output)?.get(1)?.as_str().to_string();
    Some((acc, f1))
}
