//! CSV loading and saving with per-column type inference.

use std::io::{Read, Write};
use std::path::Path;

use super::{Column, ColumnData, DataError, Dataset};

impl Dataset {
    pub fn from_csv_path(path: &Path) -> Result<Self, DataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse CSV with a header row. Empty cells are missing values.
    ///
    /// A column is `int64` if every present cell parses as an integer,
    /// `float64` if every present cell parses as a number (or there are none),
    /// `object` otherwise.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

        for record in reader.records() {
            let record = record?;
            for (idx, cells) in raw.iter_mut().enumerate() {
                let cell = record.get(idx).unwrap_or("").trim();
                cells.push(if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                });
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| Column::new(name, infer(cells)))
            .collect();

        Dataset::new(columns)
    }

    pub fn to_csv_path(&self, path: &Path) -> Result<(), DataError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), DataError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(writer);

        writer.write_record(self.column_names())?;
        for row in 0..self.n_rows() {
            let record: Vec<String> = self
                .columns()
                .iter()
                .map(|c| c.data.display(row).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn infer(cells: Vec<Option<String>>) -> ColumnData {
    let present = || cells.iter().flatten();

    if present().next().is_none() {
        return ColumnData::Float(vec![None; cells.len()]);
    }

    if present().all(|c| c.parse::<i64>().is_ok()) {
        return ColumnData::Int(
            cells
                .iter()
                .map(|c| c.as_deref().and_then(|s| s.parse().ok()))
                .collect(),
        );
    }

    if present().all(|c| c.parse::<f64>().is_ok()) {
        return ColumnData::Float(
            cells
                .iter()
                .map(|c| {
                    c.as_deref()
                        .and_then(|s| s.parse::<f64>().ok())
                        .filter(|v| !v.is_nan())
                })
                .collect(),
        );
    }

    ColumnData::Text(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DType;

    const RAW: &str = "MatchID,Opponent,Possession,ShotsOnTarget\n\
                       1,Chelsea,55.5,4\n\
                       2,,61.0,\n\
                       3,Spurs,,7\n";

    #[test]
    fn infers_types_and_nulls() {
        let df = Dataset::from_reader(RAW.as_bytes()).unwrap();
        assert_eq!(df.n_rows(), 3);
        assert_eq!(df.require("MatchID").unwrap().data.dtype(), DType::Int64);
        assert_eq!(df.require("Opponent").unwrap().data.dtype(), DType::Object);
        assert_eq!(df.require("Possession").unwrap().data.dtype(), DType::Float64);
        assert_eq!(df.require("ShotsOnTarget").unwrap().data.dtype(), DType::Int64);
        assert_eq!(df.require("Opponent").unwrap().data.null_count(), 1);
        assert_eq!(df.require("Possession").unwrap().data.null_count(), 1);
    }

    #[test]
    fn all_null_column_reads_as_float() {
        let df = Dataset::from_reader("a,b\n1,\n2,\n".as_bytes()).unwrap();
        let b = df.require("b").unwrap();
        assert_eq!(b.data.dtype(), DType::Float64);
        assert_eq!(b.data.null_count(), 2);
    }

    #[test]
    fn round_trip_keeps_types() {
        let df = Dataset::from_reader(RAW.as_bytes()).unwrap();
        let mut out = Vec::new();
        df.to_writer(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("MatchID,Opponent,Possession,ShotsOnTarget\n"));
        assert!(text.contains("2,,61.0,\n"));

        let again = Dataset::from_reader(text.as_bytes()).unwrap();
        assert_eq!(again, df);
    }

    #[test]
    fn writes_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("clean_data.csv");
        let df = Dataset::from_reader(RAW.as_bytes()).unwrap();
        df.to_csv_path(&path).unwrap();
        assert_eq!(Dataset::from_csv_path(&path).unwrap(), df);
    }
}
