//! Paginated CKAN `datastore_search` retrieval.
//!
//! Each page carries `result.records` plus a `result._links.next` path. Pages
//! are followed until no next link comes back, a page is empty, or the
//! advertised `total` has been collected. All pages land in one raw table.

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::base::get_checked;
use crate::app::ports::HttpClientPort;
use crate::config::DatastoreConfig;
use crate::error::{PanelError, Result};
use crate::observability::metrics;
use crate::types::{RawRecordTable, SourceKind};

#[derive(Debug, Deserialize)]
struct DatastoreResponse {
    success: bool,
    #[serde(default)]
    result: Option<DatastoreResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DatastoreResult {
    #[serde(default)]
    fields: Vec<DatastoreField>,
    #[serde(default)]
    records: Vec<Value>,
    #[serde(rename = "_links", default)]
    links: Option<DatastoreLinks>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DatastoreField {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DatastoreLinks {
    #[serde(default)]
    next: Option<String>,
}

/// URL of the first page for the configured resource
pub fn first_page_url(config: &DatastoreConfig) -> Result<Url> {
    Url::parse_with_params(
        &config.base_url,
        &[
            ("resource_id", config.resource_id.as_str()),
            ("limit", &config.page_limit.to_string()),
        ],
    )
    .map_err(|e| {
        PanelError::Config(format!("invalid datastore base_url '{}': {}", config.base_url, e))
    })
}

/// Follow every page of the datastore resource and concatenate the records
#[instrument(skip(http, config), fields(resource_id = %config.resource_id))]
pub async fn fetch_all_pages(
    http: &dyn HttpClientPort,
    config: &DatastoreConfig,
    kind: SourceKind,
) -> Result<RawRecordTable> {
    let mut url = first_page_url(config)?;
    let mut table: Option<RawRecordTable> = None;

    for page in 1..=config.max_pages {
        let resp = get_checked(http, url.as_str(), kind).await?;
        let parsed: DatastoreResponse = serde_json::from_slice(&resp.bytes)?;
        if !parsed.success {
            return Err(PanelError::Api {
                message: format!(
                    "datastore reported failure for {}: {}",
                    url,
                    parsed.error.map(|e| e.to_string()).unwrap_or_else(|| "no error detail".into())
                ),
            });
        }
        let result = parsed.result.ok_or_else(|| PanelError::Api {
            message: format!("datastore response for {} has no result", url),
        })?;
        metrics::sources::page_fetched(kind.as_str());

        let collected = table
            .get_or_insert_with(|| RawRecordTable::new(kind.as_str(), page_columns(&result)));
        if result.records.is_empty() {
            debug!(page, "empty page; pagination finished");
            return Ok(table.unwrap_or_default());
        }
        for record in &result.records {
            collected.push_object(record);
        }
        debug!(
            page,
            records = result.records.len(),
            collected = collected.len(),
            "fetched datastore page"
        );

        if let Some(total) = result.total {
            if collected.len() as u64 >= total {
                return Ok(table.unwrap_or_default());
            }
        }

        match result.links.and_then(|links| links.next) {
            Some(next) => {
                url = url.join(&next).map_err(|e| PanelError::Api {
                    message: format!("invalid next link '{}': {}", next, e),
                })?;
            }
            None => return Ok(table.unwrap_or_default()),
        }
    }

    Err(PanelError::Api {
        message: format!(
            "datastore pagination for source {} exceeded max_pages = {}",
            kind, config.max_pages
        ),
    })
}

/// Column names from the field list, or from the first record when the API omits it
fn page_columns(result: &DatastoreResult) -> Vec<String> {
    if !result.fields.is_empty() {
        return result.fields.iter().map(|f| f.id.clone()).collect();
    }
    result
        .records
        .first()
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default()
}
