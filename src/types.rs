use crate::constants::{NATIONAL_SOURCE, REGIONAL_SOURCE, SEVERE_SOURCE};
use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A single raw cell as published: string, number or null
pub type RawValue = Value;

/// Which published feed a panel is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Country-wide daily CSV (new infected / tests / deaths)
    National,
    /// Per-city cumulative counters from the paginated datastore API
    Regional,
    /// Country-wide daily new severe cases, no testing volume
    Severe,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] =
        [SourceKind::National, SourceKind::Regional, SourceKind::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::National => NATIONAL_SOURCE,
            SourceKind::Regional => REGIONAL_SOURCE,
            SourceKind::Severe => SEVERE_SOURCE,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            NATIONAL_SOURCE => Ok(SourceKind::National),
            REGIONAL_SOURCE => Ok(SourceKind::Regional),
            SEVERE_SOURCE => Ok(SourceKind::Severe),
            other => Err(PanelError::UnknownSource(other.to_string())),
        }
    }
}

/// Raw tabular records exactly as a feed published them.
///
/// Rows are positional and aligned with `columns`. Nothing is deduplicated,
/// sorted or validated here; that is the job of the source normalizers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecordTable {
    /// Feed this table was fetched for, carried into error messages
    pub source_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawRecordTable {
    pub fn new(source_id: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            source_id: source_id.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from JSON objects, taking columns in order of first appearance.
    pub fn from_objects(source_id: impl Into<String>, objects: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for object in objects {
            if let Some(map) = object.as_object() {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut table = Self::new(source_id, columns);
        for object in objects {
            table.push_object(object);
        }
        table
    }

    /// Append a row; short rows are padded with nulls and long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<RawValue>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Append a JSON object, mapping its keys onto the existing columns.
    /// Keys that are not columns of this table are dropped.
    pub fn push_object(&mut self, object: &Value) {
        let row = self
            .columns
            .iter()
            .map(|column| object.get(column).cloned().unwrap_or(Value::Null))
            .collect();
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a required column, or a schema error naming it
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PanelError::schema(&self.source_id, name))
    }

    /// Position of the first present column among aliases; the error names the first alias
    pub fn require_any_column(&self, names: &[&str]) -> Result<usize> {
        names
            .iter()
            .find_map(|name| self.column_index(name))
            .ok_or_else(|| {
                PanelError::schema(&self.source_id, names.first().copied().unwrap_or_default())
            })
    }

    pub fn cell(&self, row: usize, column: usize) -> &RawValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Value::Null)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
