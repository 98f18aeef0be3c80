use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::{debug, instrument, warn};

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::constants::{
    AGGREGATE_REGION, DATE_COLUMN, REGIONAL_DEATHS_COLUMN, REGIONAL_POSITIVE_COLUMN,
    REGIONAL_REGION_COLUMN, REGIONAL_TOTAL_COLUMN,
};
use crate::domain::{CanonicalPanel, Observation, PanelKey};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::normalize::MissingIncrementPolicy;
use crate::types::{RawRecordTable, SourceKind};

/// Cumulative counters of one `(region, date)` row, in `positive, total, deaths` order
type Counters = [Option<f64>; 3];

/// Normalizer for the per-city cumulative datastore table.
///
/// Cumulative counters are differenced per region along the date axis, then
/// summed per date into a synthetic `Israel` region. A region with a missing
/// day is differenced across the gap as-is; the gap is only logged.
#[derive(Debug, Default)]
pub struct RegionalNormalizer {
    policy: MissingIncrementPolicy,
}

impl RegionalNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MissingIncrementPolicy) -> Self {
        Self { policy }
    }

    /// Index rows by `(region, date)`; a later duplicate replaces the earlier one
    fn index_cumulative(&self, table: &RawRecordTable) -> Result<BTreeMap<PanelKey, Counters>> {
        let date_col = table.require_column(DATE_COLUMN)?;
        let region_col = table.require_column(REGIONAL_REGION_COLUMN)?;
        let positive_col = table.require_column(REGIONAL_POSITIVE_COLUMN)?;
        let deaths_col = table.require_column(REGIONAL_DEATHS_COLUMN)?;
        let total_col = table.require_column(REGIONAL_TOTAL_COLUMN)?;

        let mut indexed = BTreeMap::new();
        for row in 0..table.len() {
            let region = NormalizerUtils::region_label(table, row, region_col)?;
            let date = NormalizerUtils::parse_date(table, row, date_col)?;
            let counters = [
                NormalizerUtils::coerce_number(table.cell(row, positive_col)),
                NormalizerUtils::coerce_number(table.cell(row, total_col)),
                NormalizerUtils::coerce_number(table.cell(row, deaths_col)),
            ];

            if let Some(_previous) = indexed.insert(PanelKey::new(region, date), counters) {
                warn!(
                    row,
                    %date,
                    "duplicate (region, date) row in cumulative table; keeping the later one"
                );
                metrics::normalize::duplicate_key(self.source_kind().as_str());
            }
        }
        Ok(indexed)
    }
}

/// Day-over-day change; undefined when either side is missing
fn difference(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(c), Some(p)) => Some(c - p),
        _ => None,
    }
}

impl SourceNormalizer for RegionalNormalizer {
    #[instrument(skip_all, fields(source = %self.source_kind(), rows = table.len()))]
    fn normalize(&self, table: &RawRecordTable) -> Result<CanonicalPanel> {
        let indexed = self.index_cumulative(table)?;

        let mut panel = CanonicalPanel::new();
        let mut national: BTreeMap<NaiveDate, [f64; 3]> = BTreeMap::new();
        let mut previous: Option<(&PanelKey, &Counters)> = None;

        // Keys iterate region by region, dates ascending within each region
        for (key, counters) in &indexed {
            let prior = match previous {
                Some((prev_key, prev_counters)) if prev_key.region == key.region => {
                    if prev_key.date + Duration::days(1) != key.date {
                        debug!(
                            region = %key.region,
                            from = %prev_key.date,
                            to = %key.date,
                            "date gap in cumulative series; difference spans the gap"
                        );
                    }
                    Some(prev_counters)
                }
                _ => None,
            };
            previous = Some((key, counters));

            if key.region == AGGREGATE_REGION {
                warn!(
                    date = %key.date,
                    "raw region code collides with the aggregate label; dropping the raw row"
                );
                continue;
            }

            let increments: [Option<f64>; 3] = match prior {
                Some(prior) => [
                    difference(counters[0], prior[0]),
                    difference(counters[1], prior[1]),
                    difference(counters[2], prior[2]),
                ],
                None => [None; 3],
            };

            let Some([positive, total, deaths]) = self.policy.resolve(increments) else {
                continue;
            };

            let sums = national.entry(key.date).or_insert([0.0; 3]);
            sums[0] += positive;
            sums[1] += total;
            sums[2] += deaths;

            panel.insert(key.clone(), Observation::new(positive, total, Some(deaths)));
        }

        let region_rows = panel.len();
        for (date, [positive, total, deaths]) in national {
            panel.insert(
                PanelKey::new(AGGREGATE_REGION, date),
                Observation::new(positive, total, Some(deaths)),
            );
        }

        debug!(
            region_rows,
            aggregate_rows = panel.len().saturating_sub(region_rows),
            "normalized regional cumulative table"
        );
        Ok(panel)
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Regional
    }

    fn name(&self) -> &str {
        "Regional Cumulative Datastore Normalizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;
    use serde_json::{json, Value};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    fn row(region: Value, date: &str, cases: Value, tests: Value, deaths: Value) -> Value {
        json!({
            "_id": 1,
            "City_Name": "x",
            "City_Code": region,
            "Date": date,
            "Cumulative_verified_cases": cases,
            "Cumulated_number_of_diagnostic_tests": tests,
            "Cumulated_deaths": deaths,
        })
    }

    fn positives(panel: &CanonicalPanel, region: &str) -> Vec<f64> {
        panel.region(region).map(|(_, o)| o.positive).collect()
    }

    #[test]
    fn test_differences_cumulative_cases() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-01", json!("5"), json!("50"), json!("0")),
                row(json!("A"), "2020-04-02", json!("5"), json!("60"), json!("0")),
                row(json!("A"), "2020-04-03", json!("9"), json!("80"), json!("1")),
            ],
        );

        let panel = RegionalNormalizer::new().normalize(&table).unwrap();

        assert_eq!(positives(&panel, "A"), vec![0.0, 0.0, 4.0]);
        assert_eq!(panel.get("A", day(3)), Some(&Observation::new(4.0, 20.0, Some(1.0))));
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_differencing() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-03", json!(9), json!(0), json!(0)),
                row(json!("A"), "2020-04-01", json!(5), json!(0), json!(0)),
                row(json!("A"), "2020-04-02", json!(5), json!(0), json!(0)),
            ],
        );

        let panel = RegionalNormalizer::new().normalize(&table).unwrap();
        assert_eq!(positives(&panel, "A"), vec![0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_suppressed_values_become_zero_increments() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-01", json!("<15"), json!("100"), json!("0")),
                row(json!("A"), "2020-04-02", json!("20"), json!("130"), json!("0")),
                row(json!("A"), "2020-04-03", json!("26"), json!(""), json!("0")),
            ],
        );

        let panel = RegionalNormalizer::new().normalize(&table).unwrap();

        assert_eq!(positives(&panel, "A"), vec![0.0, 0.0, 6.0]);
        let totals: Vec<f64> = panel.region("A").map(|(_, o)| o.total).collect();
        assert_eq!(totals, vec![0.0, 30.0, 0.0]);
    }

    #[test]
    fn test_aggregate_sums_regions_per_date() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!(1), "2020-04-01", json!(1), json!(10), json!(0)),
                row(json!(1), "2020-04-02", json!(4), json!(30), json!(1)),
                row(json!(2), "2020-04-01", json!(10), json!(100), json!(0)),
                row(json!(2), "2020-04-02", json!(17), json!(150), json!(0)),
            ],
        );

        let panel = RegionalNormalizer::new().normalize(&table).unwrap();

        assert_eq!(
            panel.get(AGGREGATE_REGION, day(2)),
            Some(&Observation::new(10.0, 70.0, Some(1.0)))
        );
        assert_eq!(
            panel.get(AGGREGATE_REGION, day(1)),
            Some(&Observation::new(0.0, 0.0, Some(0.0)))
        );
        assert_eq!(
            panel.regions().into_iter().collect::<Vec<_>>(),
            vec!["1", "2", AGGREGATE_REGION]
        );
    }

    #[test]
    fn test_gap_is_differenced_across() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-01", json!(2), json!(0), json!(0)),
                row(json!("A"), "2020-04-05", json!(12), json!(0), json!(0)),
            ],
        );

        let panel = RegionalNormalizer::new().normalize(&table).unwrap();
        assert_eq!(panel.get("A", day(5)).unwrap().positive, 10.0);
        assert!(panel.get("A", day(3)).is_none());
    }

    #[test]
    fn test_duplicate_rows_last_one_wins_before_differencing() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-01", json!(5), json!(0), json!(0)),
                row(json!("A"), "2020-04-02", json!(6), json!(0), json!(0)),
                row(json!("A"), "2020-04-02", json!(8), json!(0), json!(0)),
            ],
        );

        let panel = RegionalNormalizer::new().normalize(&table).unwrap();
        assert_eq!(positives(&panel, "A"), vec![0.0, 3.0]);
    }

    #[test]
    fn test_drop_row_policy_skips_undefined_increments() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-01", json!(5), json!(1), json!(0)),
                row(json!("A"), "2020-04-02", json!(9), json!(3), json!(0)),
            ],
        );

        let panel = RegionalNormalizer::with_policy(MissingIncrementPolicy::DropRow)
            .normalize(&table)
            .unwrap();

        assert_eq!(positives(&panel, "A"), vec![4.0]);
        assert_eq!(positives(&panel, AGGREGATE_REGION), vec![4.0]);
    }

    #[test]
    fn test_raw_aggregate_label_is_left_out_of_the_sums() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-01", json!(1), json!(10), json!(0)),
                row(json!("A"), "2020-04-02", json!(3), json!(15), json!(0)),
                row(json!(AGGREGATE_REGION), "2020-04-01", json!(100), json!(1000), json!(0)),
                row(json!(AGGREGATE_REGION), "2020-04-02", json!(150), json!(1300), json!(4)),
            ],
        );

        let panel = RegionalNormalizer::new().normalize(&table).unwrap();

        assert_eq!(positives(&panel, "A"), vec![0.0, 2.0]);
        assert_eq!(positives(&panel, AGGREGATE_REGION), vec![0.0, 2.0]);
        assert_eq!(
            panel.get(AGGREGATE_REGION, day(2)),
            Some(&Observation::new(2.0, 5.0, Some(0.0)))
        );
    }

    #[test]
    fn test_bad_date_fails_the_whole_table() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[
                row(json!("A"), "2020-04-01", json!(1), json!(10), json!(0)),
                row(json!("A"), "02/04/2020", json!(3), json!(15), json!(0)),
            ],
        );

        let err = RegionalNormalizer::new().normalize(&table).unwrap_err();
        match err {
            PanelError::Parse { column, row, value, .. } => {
                assert_eq!(column, DATE_COLUMN);
                assert_eq!(row, 1);
                assert!(value.contains("02/04/2020"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_cumulative_column_is_schema_error() {
        let table = RawRecordTable::from_objects(
            "regional",
            &[json!({
                "Date": "2020-04-01",
                "City_Code": "A",
                "Cumulative_verified_cases": 1,
                "Cumulated_deaths": 0
            })],
        );

        let err = RegionalNormalizer::new().normalize(&table).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains(REGIONAL_TOTAL_COLUMN));
    }
}
