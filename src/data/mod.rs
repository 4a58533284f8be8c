//! Tabular dataset model.
//!
//! A [`Dataset`] is an ordered list of equally long, typed, nullable columns.
//! Transformations take the dataset by value and hand back a new version, so
//! whoever owns the latest value owns the table.

mod csv_io;
pub mod sample;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Column {0} not found")]
    ColumnNotFound(String),

    #[error("Target {0} not found")]
    TargetNotFound(String),

    #[error("Target {0} is not numeric")]
    TargetNotNumeric(String),

    #[error("Column {0} is not numeric")]
    NotNumeric(String),

    #[error("Unknown strategy {0}")]
    UnknownStrategy(String),

    #[error("Unknown operation {0}")]
    UnknownOperation(String),

    #[error("Unknown method {0}")]
    UnknownMethod(String),

    #[error("Strategy {strategy} does not apply to non-numeric column {column}")]
    StrategyNotApplicable { column: String, strategy: String },

    #[error("Column {0} already exists")]
    DuplicateColumn(String),

    #[error("Column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        actual: usize,
        expected: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage type of a column, named the way the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int64,
    Float64,
    Object,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Object => "object",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values of one column. `None` is a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Int(_) => DType::Int64,
            ColumnData::Float(_) => DType::Float64,
            ColumnData::Text(_) => DType::Object,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnData::Text(_))
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Numeric view of the column; `None` for text columns.
    pub fn as_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            ColumnData::Int(v) => Some(v.iter().map(|x| x.map(|i| i as f64)).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            ColumnData::Text(_) => None,
        }
    }

    /// Cell rendered as text, `None` when missing.
    pub fn display(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Int(v) => v.get(row).copied().flatten().map(|i| i.to_string()),
            ColumnData::Float(v) => v.get(row).copied().flatten().map(format_float),
            ColumnData::Text(v) => v.get(row).cloned().flatten(),
        }
    }
}

/// Render a float so that it reads back as a float.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn int(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Int(values))
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }
}

/// Rows by named, typed columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset; every column must have the same length and a unique name.
    pub fn new(columns: Vec<Column>) -> Result<Self, DataError> {
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(DataError::DuplicateColumn(column.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.data.len();
            if let Some(bad) = columns.iter().find(|c| c.data.len() != expected) {
                return Err(DataError::LengthMismatch {
                    column: bad.name.clone(),
                    actual: bad.data.len(),
                    expected,
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Dataset::column`] but fails with `ColumnNotFound`.
    pub fn require(&self, name: &str) -> Result<&Column, DataError> {
        self.column(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.data.is_numeric()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn check_len(&self, column: &Column) -> Result<(), DataError> {
        if !self.columns.is_empty() && column.data.len() != self.n_rows() {
            return Err(DataError::LengthMismatch {
                column: column.name.clone(),
                actual: column.data.len(),
                expected: self.n_rows(),
            });
        }
        Ok(())
    }

    /// Replace the column of the same name in place, or append it.
    pub fn with_column(mut self, column: Column) -> Result<Self, DataError> {
        self.check_len(&column)?;
        match self.position(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(self)
    }

    /// Swap one column for several, keeping their position.
    pub fn splice_column(mut self, name: &str, replacement: Vec<Column>) -> Result<Self, DataError> {
        let idx = self
            .position(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))?;
        for (pos, column) in replacement.iter().enumerate() {
            self.check_len(column)?;
            let taken = self.position(&column.name).is_some_and(|other| other != idx)
                || replacement[..pos].iter().any(|c| c.name == column.name);
            if taken {
                return Err(DataError::DuplicateColumn(column.name.clone()));
            }
        }
        self.columns.splice(idx..=idx, replacement);
        Ok(self)
    }

    pub fn without_column(mut self, name: &str) -> Result<Self, DataError> {
        let idx = self
            .position(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))?;
        self.columns.remove(idx);
        Ok(self)
    }

    /// Keep only `names`, in the given order.
    pub fn select(mut self, names: &[&str]) -> Result<Self, DataError> {
        let mut kept: Vec<Column> = Vec::with_capacity(names.len());
        for name in names {
            if kept.iter().any(|c| c.name == *name) {
                return Err(DataError::DuplicateColumn(name.to_string()));
            }
            let idx = self
                .position(name)
                .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))?;
            kept.push(self.columns[idx].clone());
        }
        self.columns = kept;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::int("a", vec![Some(1), None, Some(3)]),
            Column::float("b", vec![Some(0.5), Some(1.5), None]),
            Column::text("c", vec![Some("x"), None, Some("y")]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::int("a", vec![Some(1)]),
            Column::int("b", vec![Some(1), Some(2)]),
        ])
        .unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { .. }));
    }

    #[test]
    fn shape_and_nulls() {
        let df = sample();
        assert_eq!(df.n_rows(), 3);
        assert_eq!(df.n_cols(), 3);
        assert_eq!(df.require("a").unwrap().data.null_count(), 1);
        assert_eq!(df.numeric_columns().len(), 2);
    }

    #[test]
    fn with_column_replaces_in_place() {
        let df = sample()
            .with_column(Column::int("b", vec![Some(7), Some(8), Some(9)]))
            .unwrap();
        assert_eq!(df.column_names(), vec!["a", "b", "c"]);
        assert_eq!(df.require("b").unwrap().data.dtype(), DType::Int64);
    }

    #[test]
    fn splice_keeps_position() {
        let df = sample()
            .splice_column(
                "b",
                vec![
                    Column::int("b_1", vec![Some(0), Some(0), Some(1)]),
                    Column::int("b_2", vec![Some(1), Some(1), Some(0)]),
                ],
            )
            .unwrap();
        assert_eq!(df.column_names(), vec!["a", "b_1", "b_2", "c"]);
    }

    #[test]
    fn column_names_stay_unique() {
        let err = Dataset::new(vec![
            Column::int("a", vec![Some(1)]),
            Column::int("a", vec![Some(2)]),
        ])
        .unwrap_err();
        assert!(matches!(err, DataError::DuplicateColumn(ref name) if name == "a"));

        let err = sample()
            .splice_column("b", vec![Column::int("c", vec![Some(0), Some(0), Some(1)])])
            .unwrap_err();
        assert_eq!(err.to_string(), "Column c already exists");

        let err = sample()
            .splice_column(
                "b",
                vec![
                    Column::int("b_1", vec![Some(0), Some(0), Some(1)]),
                    Column::int("b_1", vec![Some(1), Some(1), Some(0)]),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, DataError::DuplicateColumn(_)));

        // Reusing the replaced column's own name is fine.
        let df = sample()
            .splice_column("b", vec![Column::int("b", vec![Some(0), Some(0), Some(1)])])
            .unwrap();
        assert_eq!(df.column_names(), vec!["a", "b", "c"]);

        assert!(matches!(
            sample().select(&["a", "a"]),
            Err(DataError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn without_and_select() {
        let df = sample().without_column("a").unwrap();
        assert!(!df.has_column("a"));
        assert!(matches!(
            df.clone().without_column("a"),
            Err(DataError::ColumnNotFound(_))
        ));
        let df = df.select(&["c", "b"]).unwrap();
        assert_eq!(df.column_names(), vec!["c", "b"]);
    }

    #[test]
    fn whole_floats_keep_a_decimal() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(2.25), "2.25");
    }
}
