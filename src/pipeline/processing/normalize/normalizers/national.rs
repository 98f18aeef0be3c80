use tracing::{debug, instrument};

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::constants::{
    AGGREGATE_REGION, DATE_COLUMN, NATIONAL_DEATHS_COLUMN, NATIONAL_POSITIVE_COLUMN,
    NATIONAL_TOTAL_COLUMN,
    NATIONAL_TOTAL_COLUMN_LEGACY,
};
use crate::domain::{CanonicalPanel, Observation, PanelKey};
use crate::error::Result;
use crate::types::{RawRecordTable, SourceKind};

/// Normalizer for the country-wide daily CSV.
/// Every row becomes an `Israel` row; `New deaths` is carried when the feed version has it.
#[derive(Debug, Default)]
pub struct NationalNormalizer;

impl NationalNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl SourceNormalizer for NationalNormalizer {
    #[instrument(skip_all, fields(source = %self.source_kind(), rows = table.len()))]
    fn normalize(&self, table: &RawRecordTable) -> Result<CanonicalPanel> {
        let date_col = table.require_column(DATE_COLUMN)?;
        let positive_col = table.require_column(NATIONAL_POSITIVE_COLUMN)?;
        let total_col =
            table.require_any_column(&[NATIONAL_TOTAL_COLUMN, NATIONAL_TOTAL_COLUMN_LEGACY])?;
        let deaths_col = table.column_index(NATIONAL_DEATHS_COLUMN);
        if deaths_col.is_none() {
            debug!("feed has no '{}' column; deaths left empty", NATIONAL_DEATHS_COLUMN);
        }

        let mut panel = CanonicalPanel::new();
        for row in 0..table.len() {
            let date = NormalizerUtils::parse_date(table, row, date_col)?;
            let positive = NormalizerUtils::parse_count(table, row, positive_col)?;
            let total = NormalizerUtils::parse_count(table, row, total_col)?;
            let deaths = deaths_col
                .map(|col| NormalizerUtils::parse_count(table, row, col))
                .transpose()?;

            NormalizerUtils::insert_last_wins(
                &mut panel,
                PanelKey::new(AGGREGATE_REGION, date),
                Observation::new(positive, total, deaths),
                self.source_kind(),
            );
        }

        debug!("normalized {} national rows", panel.len());
        Ok(panel)
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::National
    }

    fn name(&self) -> &str {
        "National Daily Feed Normalizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    #[test]
    fn test_renames_counts_and_sorts_by_date() {
        let table = RawRecordTable::from_objects(
            "national",
            &[
                json!({"Date": "2020-03-02", "New infected": "15", "Tests for identification": "120", "New deaths": "1"}),
                json!({"Date": "2020-03-01", "New infected": "10", "Tests for identification": "100", "New deaths": "0"}),
            ],
        );

        let panel = NationalNormalizer::new().normalize(&table).unwrap();

        let dates: Vec<NaiveDate> = panel.region(AGGREGATE_REGION).map(|(d, _)| d).collect();
        assert_eq!(dates, vec![day(1), day(2)]);
        assert_eq!(
            panel.get(AGGREGATE_REGION, day(2)),
            Some(&Observation::new(15.0, 120.0, Some(1.0)))
        );
    }

    #[test]
    fn test_narrow_feed_has_no_deaths() {
        let table = RawRecordTable::from_objects(
            "national",
            &[json!({"Date": "2020-03-01", "New infected": 10, "Tests for identification": 100})],
        );

        let panel = NationalNormalizer::new().normalize(&table).unwrap();
        assert_eq!(panel.get(AGGREGATE_REGION, day(1)).unwrap().deaths, None);
    }

    #[test]
    fn test_accepts_misspelled_tests_header() {
        let table = RawRecordTable::from_objects(
            "national",
            &[json!({"Date": "2020-03-01", "New infected": "3", "Tests for idenitifaction": "40"})],
        );

        let panel = NationalNormalizer::new().normalize(&table).unwrap();
        assert_eq!(panel.get(AGGREGATE_REGION, day(1)).unwrap().total, 40.0);
    }

    #[test]
    fn test_missing_tests_column_is_schema_error() {
        let table = RawRecordTable::from_objects(
            "national",
            &[json!({"Date": "2020-03-01", "New infected": "3"})],
        );

        let err = NationalNormalizer::new().normalize(&table).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains(NATIONAL_TOTAL_COLUMN));
    }

    #[test]
    fn test_malformed_date_fails_whole_call() {
        let table = RawRecordTable::from_objects(
            "national",
            &[
                json!({"Date": "2020-03-01", "New infected": "3", "Tests for identification": "40"}),
                json!({"Date": "March 2nd", "New infected": "4", "Tests for identification": "41"}),
            ],
        );

        assert!(NationalNormalizer::new().normalize(&table).unwrap_err().is_parse());
    }

    #[test]
    fn test_blank_count_is_parse_error() {
        let table = RawRecordTable::from_objects(
            "national",
            &[json!({"Date": "2020-03-01", "New infected": "", "Tests for identification": "40"})],
        );

        assert!(NationalNormalizer::new().normalize(&table).unwrap_err().is_parse());
    }
}
