//! Feature-engineering capabilities.

use std::cmp::Ordering;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;

use super::cleaning::inspect_metadata_declaration;
use super::stats::pearson;
use super::{de_count, declaration, parse_args, ToolError};
use crate::data::{format_float, Column, ColumnData, DataError, Dataset};
use crate::llm::{ToolCallRequest, ToolDeclaration};

/// Elementwise arithmetic for interaction features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    fn apply(&self, a: f64, b: f64) -> Option<f64> {
        let value = match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
        };
        value.is_finite().then_some(value)
    }
}

impl FromStr for Operation {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            "multiply" => Ok(Self::Multiply),
            "divide" => Ok(Self::Divide),
            other => Err(DataError::UnknownOperation(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMethod {
    Label,
    OneHot,
}

impl EncodeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::OneHot => "onehot",
        }
    }
}

impl FromStr for EncodeMethod {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(Self::Label),
            "onehot" => Ok(Self::OneHot),
            other => Err(DataError::UnknownMethod(other.to_string())),
        }
    }
}

fn numeric(df: &Dataset, col: &str) -> Result<Vec<Option<f64>>, DataError> {
    df.require(col)?
        .data
        .as_f64()
        .ok_or_else(|| DataError::NotNumeric(col.to_string()))
}

/// Add `<col1>_<op>_<col2>` holding the elementwise result.
///
/// Missing inputs, division by zero and overflow give a missing cell.
pub fn create_interaction(
    df: Dataset,
    col1: &str,
    col2: &str,
    operation: Operation,
) -> Result<(Dataset, String), DataError> {
    let name = format!("{}_{}_{}", col1, operation.as_str(), col2);
    let left = numeric(&df, col1)?;
    let right = numeric(&df, col2)?;

    let values = left
        .iter()
        .zip(&right)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => operation.apply(*a, *b),
            _ => None,
        })
        .collect();

    let df = df.with_column(Column::float(name.clone(), values))?;
    Ok((df, format!("Created interaction feature: {}", name)))
}

/// Sorted distinct labels plus each row's index into them.
fn categories(data: &ColumnData) -> (Vec<String>, Vec<Option<usize>>) {
    fn build<T: Clone>(
        values: &[Option<T>],
        cmp: impl Fn(&T, &T) -> Ordering,
        label: impl Fn(&T) -> String,
    ) -> (Vec<String>, Vec<Option<usize>>) {
        let mut distinct: Vec<T> = values.iter().flatten().cloned().collect();
        distinct.sort_by(&cmp);
        distinct.dedup_by(|a, b| cmp(a, b) == Ordering::Equal);
        let codes = values
            .iter()
            .map(|v| {
                v.as_ref()
                    .and_then(|x| distinct.binary_search_by(|d| cmp(d, x)).ok())
            })
            .collect();
        (distinct.iter().map(label).collect(), codes)
    }

    match data {
        ColumnData::Int(v) => build(v, |a, b| a.cmp(b), |x| x.to_string()),
        ColumnData::Float(v) => build(v, f64::total_cmp, |x| format_float(*x)),
        ColumnData::Text(v) => build(v, |a, b| a.cmp(b), |x| x.clone()),
    }
}

/// Label-encode (integer codes, missing = -1) or one-hot encode `col`.
pub fn encode_categorical(
    df: Dataset,
    col: &str,
    method: EncodeMethod,
) -> Result<(Dataset, String), DataError> {
    let (labels, codes) = categories(&df.require(col)?.data);

    let df = match method {
        EncodeMethod::Label => {
            let values = codes
                .iter()
                .map(|code| Some(code.map_or(-1, |c| c as i64)))
                .collect();
            df.with_column(Column::int(col, values))?
        }
        EncodeMethod::OneHot => {
            let indicators = labels
                .iter()
                .enumerate()
                .map(|(idx, label)| {
                    let values = codes
                        .iter()
                        .map(|code| Some(i64::from(*code == Some(idx))))
                        .collect();
                    Column::int(format!("{}_{}", col, label), values)
                })
                .collect();
            df.splice_column(col, indicators)?
        }
    };

    Ok((df, format!("Encoded {} using {}", col, method.as_str())))
}

/// Correlation of every numeric column with the target.
fn correlations(df: &Dataset, target: &str) -> Result<Vec<(String, Option<f64>)>, DataError> {
    let target_values = df
        .column(target)
        .ok_or_else(|| DataError::TargetNotFound(target.to_string()))?
        .data
        .as_f64()
        .ok_or_else(|| DataError::TargetNotNumeric(target.to_string()))?;

    Ok(df
        .numeric_columns()
        .into_iter()
        .map(|column| {
            let values = column.data.as_f64().unwrap_or_default();
            (column.name.clone(), pearson(&values, &target_values))
        })
        .collect())
}

/// Undefined correlations sort after every defined one.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Pearson correlation of each numeric column with `target`, descending, as JSON.
pub fn correlation_analysis(df: &Dataset, target: &str) -> Result<String, DataError> {
    let mut corr = correlations(df, target)?;
    corr.sort_by(|a, b| descending(a.1, b.1));
    let map: IndexMap<String, Option<f64>> = corr.into_iter().collect();
    Ok(serde_json::to_string(&map)?)
}

/// Keep the target and the `k` numeric columns most correlated with it.
pub fn select_top_features(
    df: Dataset,
    target: &str,
    k: usize,
) -> Result<(Dataset, String), DataError> {
    let mut ranked: Vec<(String, Option<f64>)> = correlations(&df, target)?
        .into_iter()
        .filter(|(name, _)| name != target)
        .map(|(name, r)| (name, r.map(f64::abs)))
        .collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));

    let mut keep = vec![target.to_string()];
    keep.extend(ranked.into_iter().take(k).map(|(name, _)| name));

    let names: Vec<&str> = keep.iter().map(String::as_str).collect();
    let df = df.select(&names)?;
    Ok((
        df,
        format!("Selected top {} features: {}", k, keep.join(", ")),
    ))
}

#[derive(Debug, Deserialize)]
struct InteractionArgs {
    col1: String,
    col2: String,
    operation: String,
}

#[derive(Debug, Deserialize)]
struct EncodeArgs {
    col: String,
    #[serde(default)]
    method: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TargetArgs {
    target: String,
}

#[derive(Debug, Deserialize)]
struct SelectArgs {
    target: String,
    #[serde(deserialize_with = "de_count")]
    k: usize,
}

/// The engineer's capability set.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineeringTool {
    CreateInteraction {
        col1: String,
        col2: String,
        operation: Operation,
    },
    EncodeCategorical {
        col: String,
        method: EncodeMethod,
    },
    CorrelationAnalysis {
        target: String,
    },
    SelectTopFeatures {
        target: String,
        k: usize,
    },
    InspectMetadata,
}

impl EngineeringTool {
    pub fn parse(call: &ToolCallRequest) -> Result<Self, ToolError> {
        match call.name.as_str() {
            "create_interaction" => {
                let args: InteractionArgs = parse_args(call)?;
                Ok(Self::CreateInteraction {
                    col1: args.col1,
                    col2: args.col2,
                    operation: args.operation.parse()?,
                })
            }
            "encode_categorical" => {
                let args: EncodeArgs = parse_args(call)?;
                Ok(Self::EncodeCategorical {
                    col: args.col,
                    method: args.method.as_deref().unwrap_or("label").parse()?,
                })
            }
            "correlation_analysis" => {
                let args: TargetArgs = parse_args(call)?;
                Ok(Self::CorrelationAnalysis {
                    target: args.target,
                })
            }
            "select_top_features" => {
                let args: SelectArgs = parse_args(call)?;
                Ok(Self::SelectTopFeatures {
                    target: args.target,
                    k: args.k,
                })
            }
            "inspect_metadata" => Ok(Self::InspectMetadata),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn declarations() -> Vec<ToolDeclaration> {
        vec![
            declaration(
                "create_interaction",
                "Creates a new numeric feature by combining two existing columns.",
                json!({
                    "type": "object",
                    "properties": {
                        "col1": {"type": "string"},
                        "col2": {"type": "string"},
                        "operation": {
                            "type": "string",
                            "enum": ["add", "subtract", "multiply", "divide"]
                        }
                    },
                    "required": ["col1", "col2", "operation"]
                }),
            ),
            declaration(
                "encode_categorical",
                "Encodes a categorical column into numeric values.",
                json!({
                    "type": "object",
                    "properties": {
                        "col": {"type": "string"},
                        "method": {"type": "string", "enum": ["label", "onehot"]}
                    },
                    "required": ["col", "method"]
                }),
            ),
            declaration(
                "correlation_analysis",
                "Analyzes correlation of features with the target column.",
                json!({
                    "type": "object",
                    "properties": {"target": {"type": "string"}},
                    "required": ["target"]
                }),
            ),
            declaration(
                "select_top_features",
                "Keeps only the most relevant features.",
                json!({
                    "type": "object",
                    "properties": {
                        "target": {"type": "string"},
                        "k": {"type": "integer"}
                    },
                    "required": ["target", "k"]
                }),
            ),
            inspect_metadata_declaration(),
        ]
    }
}
