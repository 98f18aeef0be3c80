//! Counters for the ingestion and normalization steps.
//!
//! Recording goes through the `metrics` facade; with no recorder installed
//! the calls are no-ops, so library users opt in by installing their own.

use std::fmt;

/// Enum representing all metric names used in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Sources
    SourcesRequestsSuccess,
    SourcesRequestsError,
    SourcesRequestDuration,
    SourcesPayloadBytes,
    SourcesPagesFetched,

    // Normalize
    NormalizeRowsIn,
    NormalizeRowsOut,
    NormalizeDuplicateKeys,
    NormalizeErrors,

    // Truncate
    TruncateRowsDropped,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesRequestsSuccess => "il_panel_sources_requests_success_total",
            MetricName::SourcesRequestsError => "il_panel_sources_requests_error_total",
            MetricName::SourcesRequestDuration => "il_panel_sources_request_duration_seconds",
            MetricName::SourcesPayloadBytes => "il_panel_sources_payload_bytes",
            MetricName::SourcesPagesFetched => "il_panel_sources_pages_fetched_total",
            MetricName::NormalizeRowsIn => "il_panel_normalize_rows_in_total",
            MetricName::NormalizeRowsOut => "il_panel_normalize_rows_out_total",
            MetricName::NormalizeDuplicateKeys => "il_panel_normalize_duplicate_keys_total",
            MetricName::NormalizeErrors => "il_panel_normalize_errors_total",
            MetricName::TruncateRowsDropped => "il_panel_truncate_rows_dropped_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod sources {
    use super::MetricName;

    pub fn request_success(source: &'static str) {
        ::metrics::counter!(MetricName::SourcesRequestsSuccess.as_str(), "source" => source)
            .increment(1);
    }

    pub fn request_error(source: &'static str) {
        ::metrics::counter!(MetricName::SourcesRequestsError.as_str(), "source" => source)
            .increment(1);
    }

    pub fn request_duration(source: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::SourcesRequestDuration.as_str(), "source" => source)
            .record(secs);
    }

    pub fn payload_bytes(source: &'static str, bytes: usize) {
        ::metrics::histogram!(MetricName::SourcesPayloadBytes.as_str(), "source" => source)
            .record(bytes as f64);
    }

    pub fn page_fetched(source: &'static str) {
        ::metrics::counter!(MetricName::SourcesPagesFetched.as_str(), "source" => source)
            .increment(1);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn rows_in(source: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::NormalizeRowsIn.as_str(), "source" => source)
            .increment(rows as u64);
    }

    pub fn rows_out(source: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::NormalizeRowsOut.as_str(), "source" => source)
            .increment(rows as u64);
    }

    pub fn duplicate_key(source: &'static str) {
        ::metrics::counter!(MetricName::NormalizeDuplicateKeys.as_str(), "source" => source)
            .increment(1);
    }

    pub fn error(source: &'static str) {
        ::metrics::counter!(MetricName::NormalizeErrors.as_str(), "source" => source).increment(1);
    }
}

pub mod truncate {
    use super::MetricName;

    pub fn rows_dropped(rows: usize) {
        ::metrics::counter!(MetricName::TruncateRowsDropped.as_str()).increment(rows as u64);
    }
}
