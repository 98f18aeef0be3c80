use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Canned-response HTTP client for development/testing.
/// Unknown URLs answer 404; every requested URL is recorded in order.
#[derive(Clone, Default)]
pub struct InMemoryHttp {
    responses: Arc<Mutex<HashMap<String, HttpGetResult>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl InMemoryHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        &self,
        url: impl Into<String>,
        status: u16,
        content_type: &str,
        body: impl Into<Vec<u8>>,
    ) {
        let bytes = body.into();
        let response = HttpGetResult {
            status,
            content_length: bytes.len() as u64,
            bytes,
            content_type: content_type.to_string(),
        };
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), response);
    }

    pub fn respond_csv(&self, url: impl Into<String>, body: &str) {
        self.respond(url, 200, "text/csv", body.as_bytes().to_vec());
    }

    pub fn respond_json(&self, url: impl Into<String>, body: &serde_json::Value) {
        self.respond(url, 200, "application/json", body.to_string().into_bytes());
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl HttpClientPort for InMemoryHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned();

        debug!(url, hit = response.is_some(), "in-memory GET");
        Ok(response.unwrap_or_else(|| HttpGetResult {
            status: 404,
            bytes: Vec::new(),
            content_type: "text/plain".to_string(),
            content_length: 0,
        }))
    }
}
