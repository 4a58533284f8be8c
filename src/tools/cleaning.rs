//! Data-cleaning capabilities: metadata, column statistics, imputation and
//! column removal.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::stats;
use super::{declaration, parse_args, ToolError};
use crate::data::{Column, ColumnData, DataError, Dataset};
use crate::llm::{ToolCallRequest, ToolDeclaration};

/// How `impute_missing` fills gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputeStrategy {
    Mean,
    Median,
    Mode,
}

impl ImputeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        }
    }
}

impl FromStr for ImputeStrategy {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            other => Err(DataError::UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
struct Metadata {
    shape: (usize, usize),
    dtypes: IndexMap<String, &'static str>,
    null_counts: IndexMap<String, usize>,
}

/// Shape, dtypes and null counts as JSON.
pub fn inspect_metadata(df: &Dataset) -> String {
    let metadata = Metadata {
        shape: (df.n_rows(), df.n_cols()),
        dtypes: df
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.data.dtype().as_str()))
            .collect(),
        null_counts: df
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.data.null_count()))
            .collect(),
    };
    serde_json::to_string(&metadata).unwrap_or_else(|e| format!("Error: {}", e))
}

#[derive(Debug, Serialize)]
struct NumericStats {
    count: usize,
    mean: Option<f64>,
    std: Option<f64>,
    min: Option<f64>,
    #[serde(rename = "25%")]
    p25: Option<f64>,
    #[serde(rename = "50%")]
    p50: Option<f64>,
    #[serde(rename = "75%")]
    p75: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CategoricalStats {
    unique_values: usize,
    top_values: IndexMap<String, usize>,
}

/// Distribution summary for one column.
///
/// Numeric columns get count/mean/std/min/quartiles/max; anything else gets
/// its cardinality and five most frequent values.
pub fn get_column_stats(df: &Dataset, col: &str) -> Result<String, DataError> {
    let column = df.require(col)?;

    let json = match column.data.as_f64() {
        Some(values) => {
            let mut present: Vec<f64> = values.into_iter().flatten().collect();
            present.sort_by(f64::total_cmp);
            serde_json::to_string(&NumericStats {
                count: present.len(),
                mean: stats::mean(&present),
                std: stats::std_dev(&present),
                min: present.first().copied(),
                p25: stats::quantile(&present, 0.25),
                p50: stats::quantile(&present, 0.5),
                p75: stats::quantile(&present, 0.75),
                max: present.last().copied(),
            })
        }
        None => {
            let present: Vec<String> = (0..column.data.len())
                .filter_map(|row| column.data.display(row))
                .collect();
            let counts = stats::value_counts(&present);
            serde_json::to_string(&CategoricalStats {
                unique_values: counts.len(),
                top_values: counts.into_iter().take(5).collect(),
            })
        }
    };

    Ok(json?)
}

/// Fill missing cells of `col` with a statistic of its present values.
pub fn impute_missing(
    df: Dataset,
    col: &str,
    strategy: ImputeStrategy,
) -> Result<(Dataset, String), DataError> {
    let column = df.require(col)?;

    let data = match (&column.data, strategy) {
        (ColumnData::Int(values), ImputeStrategy::Mode) => {
            let present: Vec<i64> = values.iter().flatten().copied().collect();
            let fill = stats::mode_by(&present, |a, b| a.cmp(b));
            ColumnData::Int(values.iter().map(|v| v.or(fill)).collect())
        }
        (ColumnData::Text(values), ImputeStrategy::Mode) => {
            let present: Vec<String> = values.iter().flatten().cloned().collect();
            let fill = stats::mode_by(&present, |a, b| a.cmp(b));
            ColumnData::Text(
                values
                    .iter()
                    .map(|v| v.clone().or_else(|| fill.clone()))
                    .collect(),
            )
        }
        (ColumnData::Text(_), _) => {
            return Err(DataError::StrategyNotApplicable {
                column: col.to_string(),
                strategy: strategy.as_str().to_string(),
            })
        }
        (numeric, _) => {
            let values = numeric.as_f64().unwrap_or_default();
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let fill = match strategy {
                ImputeStrategy::Mean => stats::mean(&present),
                ImputeStrategy::Median => stats::median(&present),
                ImputeStrategy::Mode => stats::mode_by(&present, f64::total_cmp),
            };
            ColumnData::Float(values.into_iter().map(|v| v.or(fill)).collect())
        }
    };

    let df = df.with_column(Column::new(col, data))?;
    Ok((df, format!("Imputed {} using {}", col, strategy.as_str())))
}

/// Remove `col` from the table.
pub fn drop_column(df: Dataset, col: &str) -> Result<(Dataset, String), DataError> {
    let df = df.without_column(col)?;
    Ok((df, format!("Dropped column {}", col)))
}

#[derive(Debug, Deserialize)]
struct ColArgs {
    col: String,
}

#[derive(Debug, Deserialize)]
struct ImputeArgs {
    col: String,
    strategy: String,
}

/// The cleaner's capability set.
#[derive(Debug, Clone, PartialEq)]
pub enum CleaningTool {
    InspectMetadata,
    GetColumnStats { col: String },
    ImputeMissing { col: String, strategy: ImputeStrategy },
    DropColumn { col: String },
}

impl CleaningTool {
    pub fn parse(call: &ToolCallRequest) -> Result<Self, ToolError> {
        match call.name.as_str() {
            "inspect_metadata" => Ok(Self::InspectMetadata),
            "get_column_stats" => {
                let args: ColArgs = parse_args(call)?;
                Ok(Self::GetColumnStats { col: args.col })
            }
            "impute_missing" => {
                let args: ImputeArgs = parse_args(call)?;
                Ok(Self::ImputeMissing {
                    col: args.col,
                    strategy: args.strategy.parse()?,
                })
            }
            "drop_column" => {
                let args: ColArgs = parse_args(call)?;
                Ok(Self::DropColumn { col: args.col })
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn declarations() -> Vec<ToolDeclaration> {
        vec![
            inspect_metadata_declaration(),
            declaration(
                "get_column_stats",
                "Returns distribution or unique values for a specific column.",
                json!({
                    "type": "object",
                    "properties": {
                        "col": {"type": "string", "description": "The column name to analyze."}
                    },
                    "required": ["col"]
                }),
            ),
            declaration(
                "impute_missing",
                "Fills missing values (NaNs) in a column using a specific strategy.",
                json!({
                    "type": "object",
                    "properties": {
                        "col": {"type": "string", "description": "The column name."},
                        "strategy": {
                            "type": "string",
                            "enum": ["mean", "median", "mode"],
                            "description": "The imputation strategy."
                        }
                    },
                    "required": ["col", "strategy"]
                }),
            ),
            declaration(
                "drop_column",
                "Removes a column from the dataset.",
                json!({
                    "type": "object",
                    "properties": {
                        "col": {"type": "string", "description": "The column name to drop."}
                    },
                    "required": ["col"]
                }),
            ),
        ]
    }
}

/// Shared by the cleaner and the engineer.
pub fn inspect_metadata_declaration() -> ToolDeclaration {
    declaration(
        "inspect_metadata",
        "Returns shape, data types, and null counts of the dataset.",
        json!({"type": "object", "properties": {}}),
    )
}
