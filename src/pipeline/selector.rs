use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::apis::{HttpRecordSource, RecordSource};
use crate::config::{Config, PlaceholderConfig};
use crate::constants::AGGREGATE_REGION;
use crate::domain::{CanonicalPanel, Observation};
use crate::error::Result;
use crate::infra::ReqwestHttp;
use crate::pipeline::processing::normalize::NormalizationRegistry;
use crate::pipeline::processing::truncate::truncate;
use crate::types::{RawRecordTable, SourceKind};

/// Post-processing switches applied after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOptions {
    /// When false, `total` is replaced by the configured constant (relative-trend modelling)
    pub normalize_denominator: bool,
    /// When false, only the `Israel` aggregate rows are kept
    pub include_regions: bool,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            normalize_denominator: true,
            include_regions: true,
        }
    }
}

/// Picks the feed, runs its normalizer, applies the options and the as-of cut.
///
/// Errors from retrieval or normalization are returned as-is; nothing is retried here.
pub struct SourceSelector {
    source: Arc<dyn RecordSource>,
    registry: NormalizationRegistry,
    placeholders: PlaceholderConfig,
}

impl SourceSelector {
    pub fn new(source: Arc<dyn RecordSource>, config: &Config) -> Self {
        Self {
            source,
            registry: NormalizationRegistry::new(&config.placeholders),
            placeholders: config.placeholders.clone(),
        }
    }

    pub fn with_registry(
        source: Arc<dyn RecordSource>,
        registry: NormalizationRegistry,
        placeholders: PlaceholderConfig,
    ) -> Self {
        Self {
            source,
            registry,
            placeholders,
        }
    }

    /// Selector fetching the live feeds configured in `config`
    pub fn over_http(config: &Config) -> Result<Self> {
        let http = Arc::new(ReqwestHttp::new()?);
        let source = Arc::new(HttpRecordSource::new(http, config.sources.clone()));
        Ok(Self::new(source, config))
    }

    /// Fetch the feed for `kind` and build its as-of panel
    #[instrument(skip(self))]
    pub async fn load(
        &self,
        kind: SourceKind,
        run_date: NaiveDate,
        options: SelectorOptions,
    ) -> Result<CanonicalPanel> {
        let table = self.source.fetch(kind).await?;
        self.process(kind, &table, run_date, options)
    }

    /// Build the as-of panel from a table the caller already holds
    pub fn process(
        &self,
        kind: SourceKind,
        table: &RawRecordTable,
        run_date: NaiveDate,
        options: SelectorOptions,
    ) -> Result<CanonicalPanel> {
        let mut panel = self.registry.normalize(kind, table)?;

        if !options.include_regions {
            panel = panel.filter(|key, _| key.region == AGGREGATE_REGION);
        }

        if !options.normalize_denominator {
            let placeholder = self.placeholders.unnormalized_total;
            panel = panel.map_observations(|_, observation| Observation {
                total: placeholder,
                ..observation
            });
        }

        let panel = truncate(&panel, run_date);
        info!(
            source = %kind,
            %run_date,
            rows = panel.len(),
            regions = panel.regions().len(),
            first = ?panel.first_date(),
            last = ?panel.last_date(),
            "built as-of panel"
        );
        Ok(panel)
    }
}
