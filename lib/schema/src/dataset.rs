//! Reference dataset
//!
//! The historical observations the model was trained on, read from CSV.
//! Cells are kept as optional strings; typing happens per column so that a
//! column is numeric only when every present cell parses as a number.

use ahash::AHashMap;
use cropwise_core::{Error, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell spellings read as missing values
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// How a reference column is fed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every present cell parses as a number
    Numeric,
    /// At least one present cell is not a number
    Categorical,
    /// No present cells at all
    Empty,
}

/// In-memory reference table
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ReferenceTable {
    /// Create a table from a header and rows of equal width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let mut seen = ahash::AHashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(Error::SchemaInvalid(format!(
                    "duplicate column '{}' in reference dataset",
                    column
                )));
            }
        }

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(Error::SchemaInvalid(format!(
                "reference row {} has {} cells, header has {}",
                i,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Read a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::from_artifact_io(path, e))?;
        Self::from_reader(file).map_err(|e| match e {
            Error::SchemaInvalid(msg) => {
                Error::SchemaInvalid(format!("dataset {}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Read CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()
            .map_err(|e| Error::SchemaInvalid(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| Error::SchemaInvalid(e.to_string()))?;
            rows.push(record.iter().map(parse_cell).collect());
        }

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = Option<&'a str>> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_deref()))
    }

    /// Remove columns by name; names not in the table are ignored
    pub fn drop_columns(&mut self, names: &[String]) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.iter().any(|n| n == c))
            .collect();

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Type a column from its present cells
    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        let mut present = self.column(name)?.flatten().peekable();
        if present.peek().is_none() {
            return Some(ColumnKind::Empty);
        }
        if present.all(|cell| cell.trim().parse::<f64>().is_ok()) {
            Some(ColumnKind::Numeric)
        } else {
            Some(ColumnKind::Categorical)
        }
    }

    /// A numeric column as floats; unparseable and non-finite cells are missing
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        Some(
            self.column(name)?
                .map(|cell| {
                    cell.and_then(|c| c.trim().parse::<f64>().ok())
                        .filter(|v| v.is_finite())
                })
                .collect(),
        )
    }

    /// Most frequent present value; ties go to the smallest value
    pub fn mode(&self, name: &str) -> Option<String> {
        let mut counts: AHashMap<&str, usize> = AHashMap::new();
        for cell in self.column(name)?.flatten() {
            *counts.entry(cell).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .max_by(|(a_val, a_count), (b_val, b_count)| {
                a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
            })
            .map(|(value, _)| value.to_string())
    }

    /// Sorted distinct values of a column with missing cells replaced by `fill`
    pub fn distinct_sorted(&self, name: &str, fill: &str) -> Option<Vec<String>> {
        let values: BTreeSet<&str> = self.column(name)?.map(|cell| cell.unwrap_or(fill)).collect();
        Some(values.into_iter().map(str::to_string).collect())
    }
}

fn parse_cell(raw: &str) -> Option<String> {
    if NA_VALUES.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}
