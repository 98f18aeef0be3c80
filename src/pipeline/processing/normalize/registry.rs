use std::collections::BTreeMap;

use super::normalizers::{
    MetricsNormalizer, NationalNormalizer, RegionalNormalizer, SevereNormalizer, SourceNormalizer,
};
use crate::config::PlaceholderConfig;
use crate::domain::CanonicalPanel;
use crate::error::{PanelError, Result};
use crate::types::{RawRecordTable, SourceKind};

/// Registry for source-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: BTreeMap<SourceKind, Box<dyn SourceNormalizer>>,
}

impl NormalizationRegistry {
    /// Create a registry with the three built-in normalizers, each wrapped with metrics
    pub fn new(placeholders: &PlaceholderConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(MetricsNormalizer::new(NationalNormalizer::new())));
        registry.register(Box::new(MetricsNormalizer::new(RegionalNormalizer::new())));
        registry.register(Box::new(MetricsNormalizer::new(SevereNormalizer::new(
            placeholders.severe_total,
        ))));
        registry
    }

    pub fn empty() -> Self {
        Self {
            normalizers: BTreeMap::new(),
        }
    }

    /// Register a normalizer, replacing any existing one for the same source
    pub fn register(&mut self, normalizer: Box<dyn SourceNormalizer>) {
        self.normalizers.insert(normalizer.source_kind(), normalizer);
    }

    /// Get the appropriate normalizer for a source
    pub fn get_normalizer(&self, kind: SourceKind) -> Option<&dyn SourceNormalizer> {
        self.normalizers.get(&kind).map(|n| n.as_ref())
    }

    /// Normalize a table using the normalizer registered for `kind`
    pub fn normalize(&self, kind: SourceKind, table: &RawRecordTable) -> Result<CanonicalPanel> {
        match self.get_normalizer(kind) {
            Some(normalizer) => normalizer.normalize(table),
            None => Err(PanelError::UnknownSource(kind.to_string())),
        }
    }

    /// List all registered sources
    pub fn list_sources(&self) -> Vec<SourceKind> {
        self.normalizers.keys().copied().collect()
    }
}
