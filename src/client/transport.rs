use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use tracing::debug;

use crate::error::{AppError, Result};

const USER_AGENT_VALUE: &str = "sports-ingest/0.1";

/// One fully-resolved outbound GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

/// What came back, before any status interpretation.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Raw `Retry-After` header text, if sent.
    pub retry_after: Option<String>,
    pub body: String,
}

/// The network seam. `RateLimitedClient` owns retry policy; a transport
/// performs exactly one round trip per call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &OutboundRequest) -> Result<UpstreamResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &OutboundRequest) -> Result<UpstreamResponse> {
        let mut req = self
            .client
            .get(&request.url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/json");
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        let resp = req.send().await.map_err(|e| classify(&request.url, e))?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = resp.text().await.map_err(|e| classify(&request.url, e))?;

        debug!(url = %request.url, status, bytes = body.len(), "upstream response");
        Ok(UpstreamResponse { status, retry_after, body })
    }
}

fn classify(url: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout { url: url.to_string() }
    } else {
        AppError::Network(format!("{url}: {e}"))
    }
}

/// Header pair for bearer placement.
pub fn bearer(key: &str) -> (String, String) {
    (AUTHORIZATION.as_str().to_string(), format!("Bearer {key}"))
}
