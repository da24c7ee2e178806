//! Single-window requests against the full-studies search endpoint.
//!
//! [`WindowedFetcher`] is the seam the aggregation loop drives; the
//! production implementation is [`HttpFetcher`]. One call issues exactly one
//! `GET` and either returns a decoded [`ResponseEnvelope`] or a
//! [`FetchError`]. Nothing is retried or cached.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{FetchError, FetchErrorKind};
use crate::models::ResponseEnvelope;

/// Fetch one rank window of search results.
#[async_trait]
pub trait WindowedFetcher: Send + Sync {
    async fn fetch(
        &self,
        expr: &str,
        min_rank: u64,
        max_rank: u64,
    ) -> Result<ResponseEnvelope, FetchError>;
}

/// [`WindowedFetcher`] backed by a `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("ctscrape/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl WindowedFetcher for HttpFetcher {
    async fn fetch(
        &self,
        expr: &str,
        min_rank: u64,
        max_rank: u64,
    ) -> Result<ResponseEnvelope, FetchError> {
        let fail = |kind| FetchError::new(expr, min_rank, max_rank, kind);

        debug!(min_rank, max_rank, "requesting window");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("expr", expr.to_string()),
                ("min_rnk", min_rank.to_string()),
                ("max_rnk", max_rank.to_string()),
                ("fmt", "json".to_string()),
            ])
            .send()
            .await
            .map_err(|e| fail(FetchErrorKind::Transport(e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(FetchErrorKind::Status(status)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| fail(FetchErrorKind::Transport(e)))?;

        decode_envelope(&body).map_err(|msg| fail(FetchErrorKind::Decode(msg)))
    }
}

/// Decode a `FullStudiesResponse` body.
///
/// `NStudiesFound` may be a number or a numeric string. A missing
/// `FullStudies` list means an empty page.
pub fn decode_envelope(body: &str) -> Result<ResponseEnvelope, String> {
    let root: Value = serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;

    let envelope = root
        .get("FullStudiesResponse")
        .ok_or_else(|| "missing FullStudiesResponse".to_string())?;

    let total_found = match envelope.get("NStudiesFound") {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| format!("NStudiesFound is not a non-negative integer: {}", n))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("NStudiesFound is not an integer: {:?}", s))?,
        Some(other) => return Err(format!("unexpected NStudiesFound: {}", other)),
        None => return Err("missing NStudiesFound".to_string()),
    };

    let records = match envelope.get("FullStudies") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => return Err(format!("FullStudies is not a list: {}", other)),
    };

    Ok(ResponseEnvelope {
        total_found,
        records,
    })
}
