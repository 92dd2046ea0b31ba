use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::BlogPost;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("Invalid data format: expected a JSON array, got {0}")]
    InvalidFormat(&'static str),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Client for the blog JSON endpoint
///
/// One call is one attempt. Callers decide how often to retry.
#[derive(Debug, Clone)]
pub struct BlogClient {
    client: reqwest::Client,
    endpoint: String,
}

impl BlogClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(15))
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Folio/0.1.0"));
        // Equivalent of fetch(..., { cache: "no-store" })
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every post from the endpoint
    ///
    /// Fails on a non-2xx status and on any body that is not a JSON array.
    /// Elements of the array that are not posts are skipped.
    pub async fn fetch_posts(&self) -> Result<Vec<BlogPost>> {
        debug!("GET {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let items = match serde_json::from_slice::<Value>(&bytes)? {
            Value::Array(items) => items,
            other => return Err(ApiError::InvalidFormat(json_kind(&other))),
        };

        let total = items.len();
        let posts: Vec<BlogPost> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(_) => serde_json::from_value(item)
                    .map_err(|e| warn!("Skipping malformed post: {}", e))
                    .ok(),
                other => {
                    warn!("Skipping {} in post list", json_kind(&other));
                    None
                }
            })
            .collect();

        debug!("Fetched {} posts ({} skipped)", posts.len(), total - posts.len());
        Ok(posts)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
