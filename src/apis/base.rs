use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{csv_feed, datastore};
use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::config::SourcesConfig;
use crate::error::{PanelError, Result};
use crate::observability::metrics;
use crate::types::{RawRecordTable, SourceKind};

/// Retrieval capability: hand back the complete raw table of a feed
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, kind: SourceKind) -> Result<RawRecordTable>;
}

/// Fetches the public feeds over HTTP: CSV downloads for the national and
/// severe feeds, the paginated datastore API for the per-city table.
pub struct HttpRecordSource {
    http: Arc<dyn HttpClientPort>,
    sources: SourcesConfig,
}

impl HttpRecordSource {
    pub fn new(http: Arc<dyn HttpClientPort>, sources: SourcesConfig) -> Self {
        Self { http, sources }
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    #[instrument(skip(self))]
    async fn fetch(&self, kind: SourceKind) -> Result<RawRecordTable> {
        let table = match kind {
            SourceKind::National => {
                csv_feed::fetch_csv(self.http.as_ref(), &self.sources.national.url, kind).await?
            }
            SourceKind::Severe => {
                csv_feed::fetch_csv(self.http.as_ref(), &self.sources.severe.url, kind).await?
            }
            SourceKind::Regional => {
                datastore::fetch_all_pages(self.http.as_ref(), &self.sources.regional, kind).await?
            }
        };

        info!(
            "Successfully fetched {} rows ({} columns) for source {}",
            table.len(),
            table.columns.len(),
            kind
        );
        Ok(table)
    }
}

/// GET a URL, recording metrics, and fail on a non-2xx status
pub(crate) async fn get_checked(
    http: &dyn HttpClientPort,
    url: &str,
    kind: SourceKind,
) -> Result<HttpGetResult> {
    let source = kind.as_str();
    let t0 = Instant::now();

    let resp = match http.get(url).await {
        Ok(resp) => resp,
        Err(e) => {
            metrics::sources::request_error(source);
            return Err(e);
        }
    };

    if !resp.is_success() {
        metrics::sources::request_error(source);
        warn!(url, status = resp.status, "source request failed");
        return Err(PanelError::Api {
            message: format!("GET {} for source {} returned HTTP {}", url, kind, resp.status),
        });
    }

    metrics::sources::request_success(source);
    metrics::sources::request_duration(source, t0.elapsed().as_secs_f64());
    metrics::sources::payload_bytes(source, resp.bytes.len());
    debug!(
        url,
        bytes = resp.bytes.len(),
        content_length = resp.content_length,
        content_type = %resp.content_type,
        "fetched payload"
    );
    Ok(resp)
}
