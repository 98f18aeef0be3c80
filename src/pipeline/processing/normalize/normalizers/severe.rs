use tracing::{debug, instrument};

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::constants::{AGGREGATE_REGION, DATE_COLUMN, SEVERE_POSITIVE_COLUMN};
use crate::domain::{CanonicalPanel, Observation, PanelKey};
use crate::error::Result;
use crate::types::{RawRecordTable, SourceKind};

/// Normalizer for the daily new-severe-cases feed.
///
/// The feed has no testing volume, so `total` is a fixed placeholder that only
/// gives the panel its shape. Consumers must not read it as a real count.
#[derive(Debug)]
pub struct SevereNormalizer {
    placeholder_total: f64,
}

impl SevereNormalizer {
    pub fn new(placeholder_total: f64) -> Self {
        Self { placeholder_total }
    }

    pub fn placeholder_total(&self) -> f64 {
        self.placeholder_total
    }
}

impl SourceNormalizer for SevereNormalizer {
    #[instrument(skip_all, fields(source = %self.source_kind(), rows = table.len()))]
    fn normalize(&self, table: &RawRecordTable) -> Result<CanonicalPanel> {
        let date_col = table.require_column(DATE_COLUMN)?;
        let positive_col = table.require_column(SEVERE_POSITIVE_COLUMN)?;

        let mut panel = CanonicalPanel::new();
        for row in 0..table.len() {
            let date = NormalizerUtils::parse_date(table, row, date_col)?;
            let positive = NormalizerUtils::parse_count(table, row, positive_col)?;

            NormalizerUtils::insert_last_wins(
                &mut panel,
                PanelKey::new(AGGREGATE_REGION, date),
                Observation::new(positive, self.placeholder_total, None),
                self.source_kind(),
            );
        }

        debug!("normalized {} severe-case rows", panel.len());
        Ok(panel)
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Severe
    }

    fn name(&self) -> &str {
        "Severe Cases Feed Normalizer"
    }
}
