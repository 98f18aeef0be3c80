use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use crate::constants::DATE_FORMAT;
use crate::domain::{CanonicalPanel, Observation, PanelKey};
use crate::error::{PanelError, Result};
use crate::observability::metrics;
use crate::types::{RawRecordTable, SourceKind};

/// Base trait for source-specific normalizers
pub trait SourceNormalizer: Send + Sync {
    /// Turn one feed's raw table into a canonical panel
    fn normalize(&self, table: &RawRecordTable) -> Result<CanonicalPanel>;

    /// The feed this normalizer understands
    fn source_kind(&self) -> SourceKind;

    /// Get a human-readable name for this normalizer
    fn name(&self) -> &str;
}

/// A wrapper that adds metrics to any normalizer implementation
pub struct MetricsNormalizer<N: SourceNormalizer> {
    inner: N,
}

impl<N: SourceNormalizer> MetricsNormalizer<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

impl<N: SourceNormalizer> SourceNormalizer for MetricsNormalizer<N> {
    fn normalize(&self, table: &RawRecordTable) -> Result<CanonicalPanel> {
        let source = self.inner.source_kind().as_str();
        metrics::normalize::rows_in(source, table.len());

        match self.inner.normalize(table) {
            Ok(panel) => {
                metrics::normalize::rows_out(source, panel.len());
                Ok(panel)
            }
            Err(e) => {
                metrics::normalize::error(source);
                Err(e)
            }
        }
    }

    fn source_kind(&self) -> SourceKind {
        self.inner.source_kind()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Cell-level helpers shared by the normalizers
pub struct NormalizerUtils;

impl NormalizerUtils {
    /// Parse a `YYYY-MM-DD` date cell; anything else is a parse error
    pub fn parse_date(table: &RawRecordTable, row: usize, column: usize) -> Result<NaiveDate> {
        let value = table.cell(row, column);
        let text = match value {
            Value::String(s) => s.trim(),
            other => {
                return Err(Self::parse_error(
                    table,
                    row,
                    column,
                    other,
                    "expected a YYYY-MM-DD string",
                ));
            }
        };
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|e| Self::parse_error(table, row, column, value, &e.to_string()))
    }

    /// Strict count: a number or numeric string, otherwise a parse error
    pub fn parse_count(table: &RawRecordTable, row: usize, column: usize) -> Result<f64> {
        let value = table.cell(row, column);
        Self::coerce_number(value)
            .ok_or_else(|| Self::parse_error(table, row, column, value, "expected a number"))
    }

    /// Lenient numeric coercion: unparseable or missing values become `None`
    pub fn coerce_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
    }

    /// Region identifier as text; integral numbers lose any fractional suffix
    pub fn region_label(table: &RawRecordTable, row: usize, column: usize) -> Result<String> {
        let value = table.cell(row, column);
        let label = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(f)) if f.fract() == 0.0 => format!("{:.0}", f),
                _ => n.to_string(),
            },
            _ => String::new(),
        };
        if label.is_empty() {
            return Err(Self::parse_error(table, row, column, value, "empty region code"));
        }
        Ok(label)
    }

    /// Insert into the panel with last-occurrence-wins semantics, logging the collision
    pub fn insert_last_wins(
        panel: &mut CanonicalPanel,
        key: PanelKey,
        observation: Observation,
        source: SourceKind,
    ) {
        let region = key.region.clone();
        let date = key.date;
        if panel.insert(key, observation).is_some() {
            warn!(%source, %region, %date, "duplicate (region, date) row; keeping the later one");
            metrics::normalize::duplicate_key(source.as_str());
        }
    }

    fn parse_error(
        table: &RawRecordTable,
        row: usize,
        column: usize,
        value: &Value,
        reason: &str,
    ) -> PanelError {
        let column_name = table.columns.get(column).map(String::as_str).unwrap_or_default();
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        PanelError::parse(&table.source_id, column_name, row, shown, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one_cell(value: Value) -> RawRecordTable {
        let mut table = RawRecordTable::new("test", vec!["c".to_string()]);
        table.push_row(vec![value]);
        table
    }

    #[test]
    fn test_parse_date_accepts_iso_days_only() {
        assert_eq!(
            NormalizerUtils::parse_date(&one_cell(json!(" 2020-03-01 ")), 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
        );
        for bad in [json!("01/03/2020"), json!(20200301)] {
            let err = NormalizerUtils::parse_date(&one_cell(bad), 0, 0).unwrap_err();
            assert!(err.is_parse());
        }
    }

    #[test]
    fn test_coerce_number_treats_suppressed_values_as_missing() {
        assert_eq!(NormalizerUtils::coerce_number(&json!("12")), Some(12.0));
        assert_eq!(NormalizerUtils::coerce_number(&json!(3.5)), Some(3.5));
        assert_eq!(NormalizerUtils::coerce_number(&json!("<15")), None);
        assert_eq!(NormalizerUtils::coerce_number(&json!("")), None);
        assert_eq!(NormalizerUtils::coerce_number(&json!("NaN")), None);
        assert_eq!(NormalizerUtils::coerce_number(&Value::Null), None);
    }

    #[test]
    fn test_parse_count_error_names_column_and_row() {
        match NormalizerUtils::parse_count(&one_cell(json!("many")), 0, 0) {
            Err(PanelError::Parse { column, row, value, .. }) => {
                assert_eq!(column, "c");
                assert_eq!(row, 0);
                assert_eq!(value, "many");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_region_label_renders_numeric_codes() {
        assert_eq!(NormalizerUtils::region_label(&one_cell(json!(5000)), 0, 0).unwrap(), "5000");
        assert_eq!(NormalizerUtils::region_label(&one_cell(json!(70.0)), 0, 0).unwrap(), "70");
        assert_eq!(
            NormalizerUtils::region_label(&one_cell(json!(" 3000 ")), 0, 0).unwrap(),
            "3000"
        );
        assert!(NormalizerUtils::region_label(&one_cell(Value::Null), 0, 0).is_err());
    }
}
