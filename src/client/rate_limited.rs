use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::retry::{parse_retry_after, RetryStep, RetryState};
use crate::client::transport::{bearer, OutboundRequest, Transport};
use crate::config::{AuthPlacement, Config, ProviderConfig};
use crate::error::{AppError, Result};
use crate::types::RawPayload;

const TOO_MANY_REQUESTS: u16 = 429;

/// Extra per-call parameters on top of the provider's credentials.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
}

/// Authenticated GETs against one upstream provider, retrying only on 429.
///
/// Stateless across calls: every `request` starts a fresh `RetryState`.
/// One call, 429 waits included, never runs longer than
/// `request_timeout * max_attempts`.
pub struct RateLimitedClient {
    provider: ProviderConfig,
    transport: Arc<dyn Transport>,
    max_attempts: u32,
    base_delay: Duration,
    request_timeout: Duration,
}

impl RateLimitedClient {
    pub fn new(provider: ProviderConfig, transport: Arc<dyn Transport>, cfg: &Config) -> Self {
        Self::with_policy(
            provider,
            transport,
            cfg.rate_limit_max_attempts,
            cfg.rate_limit_base_delay,
            cfg.request_timeout,
        )
    }

    pub fn with_policy(
        provider: ProviderConfig,
        transport: Arc<dyn Transport>,
        max_attempts: u32,
        base_delay: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            transport,
            max_attempts: max_attempts.max(1),
            base_delay,
            request_timeout,
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider.name
    }

    /// `path` is relative to the provider base URL; absolute URLs pass through.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<RawPayload> {
        let outbound = self.build_request(path, options);
        let mut retry = RetryState::new(self.max_attempts, self.base_delay, self.request_timeout);
        let budget = self.request_timeout.saturating_mul(self.max_attempts);
        let started = Instant::now();

        loop {
            let remaining = budget.saturating_sub(started.elapsed());
            let resp = match tokio::time::timeout(remaining, self.transport.get(&outbound)).await {
                Ok(resp) => resp?,
                Err(_) => return Err(AppError::Timeout { url: outbound.url.clone() }),
            };

            if resp.status == TOO_MANY_REQUESTS {
                let retry_after = resp
                    .retry_after
                    .as_deref()
                    .and_then(|raw| parse_retry_after(raw, chrono::Utc::now()));
                match retry.on_rate_limited(&outbound.url, retry_after) {
                    RetryStep::Wait(wait) if started.elapsed().saturating_add(wait) >= budget => {
                        warn!(
                            provider = %self.provider.name,
                            url = %outbound.url,
                            wait_ms = wait.as_millis() as u64,
                            "Rate limited (429), next wait would overrun the call budget"
                        );
                        return Err(AppError::RateLimited {
                            url: outbound.url.clone(),
                            attempts: retry.attempt(),
                        });
                    }
                    RetryStep::Wait(wait) => {
                        warn!(
                            provider = %self.provider.name,
                            url = %outbound.url,
                            attempt = retry.attempt(),
                            wait_ms = wait.as_millis() as u64,
                            "Rate limited (429), retrying in {}ms",
                            wait.as_millis(),
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    RetryStep::GiveUp(err) => {
                        warn!(provider = %self.provider.name, url = %outbound.url, "Rate limit retries exhausted");
                        return Err(err);
                    }
                }
            }

            if !(200..300).contains(&resp.status) {
                return Err(AppError::Status {
                    status: resp.status,
                    url: outbound.url.clone(),
                });
            }

            debug!(provider = %self.provider.name, url = %outbound.url, "fetched");
            // An empty 2xx body is treated as an empty object, not a parse failure.
            if resp.body.trim().is_empty() {
                return Ok(RawPayload::Object(Default::default()));
            }
            return Ok(serde_json::from_str(&resp.body)?);
        }
    }

    fn build_request(&self, path: &str, options: RequestOptions) -> OutboundRequest {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.provider.base_url, path.trim_start_matches('/'))
        };

        let key = &self.provider.api_key;
        let mut headers = Vec::new();
        let mut query = Vec::new();
        match self.provider.auth {
            AuthPlacement::Header => headers.push((self.provider.key_header.clone(), key.clone())),
            AuthPlacement::Query => query.push((self.provider.key_param.clone(), key.clone())),
            AuthPlacement::Both => {
                headers.push((self.provider.key_header.clone(), key.clone()));
                query.push((self.provider.key_param.clone(), key.clone()));
            }
            AuthPlacement::Bearer => headers.push(bearer(key)),
        }
        query.extend(options.query);

        OutboundRequest { url, headers, query }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::transport::UpstreamResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport: pops one canned response per call, records requests.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<UpstreamResponse>>>,
        pub(crate) requests: Mutex<Vec<OutboundRequest>>,
        /// Simulated upstream latency per call.
        latency: Duration,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<UpstreamResponse>>) -> Arc<Self> {
            Self::slow(responses, Duration::ZERO)
        }

        pub(crate) fn slow(responses: Vec<Result<UpstreamResponse>>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                latency,
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, request: &OutboundRequest) -> Result<UpstreamResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Network("script exhausted".to_string())))
        }
    }

    pub(crate) fn ok(body: &str) -> Result<UpstreamResponse> {
        Ok(UpstreamResponse { status: 200, retry_after: None, body: body.to_string() })
    }

    pub(crate) fn throttled(retry_after: Option<&str>) -> Result<UpstreamResponse> {
        Ok(UpstreamResponse {
            status: 429,
            retry_after: retry_after.map(str::to_string),
            body: String::new(),
        })
    }

    pub(crate) fn provider(auth: AuthPlacement) -> ProviderConfig {
        ProviderConfig {
            name: "test".to_string(),
            base_url: "http://upstream.test/v7".to_string(),
            api_key: "secret".to_string(),
            auth,
            key_header: "x-api-key".to_string(),
            key_param: "api_key".to_string(),
        }
    }

    pub(crate) fn client(transport: Arc<ScriptedTransport>) -> RateLimitedClient {
        RateLimitedClient::with_policy(
            provider(AuthPlacement::Both),
            transport,
            3,
            Duration::from_millis(1_000),
            Duration::from_secs(15),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_header_sets_first_wait() {
        let transport = ScriptedTransport::new(vec![throttled(Some("2")), ok(r#"{"games":[]}"#)]);
        let client = client(transport.clone());

        let started = tokio::time::Instant::now();
        let payload = client.request("games/2024/07/04/schedule.json", RequestOptions::default()).await.unwrap();
        let waited = started.elapsed();

        assert_eq!(payload["games"], serde_json::json!([]));
        assert_eq!(transport.calls(), 2);
        assert!(waited >= Duration::from_millis(2_000), "waited {waited:?}");
        assert!(waited < Duration::from_millis(2_100), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn three_429s_surface_rate_limit_error() {
        let transport =
            ScriptedTransport::new(vec![throttled(None), throttled(None), throttled(None), ok("{}")]);
        let client = client(transport.clone());

        let started = tokio::time::Instant::now();
        let err = client.request("x.json", RequestOptions::default()).await.unwrap_err();

        assert!(err.is_rate_limit(), "got {err:?}");
        assert_eq!(transport.calls(), 3);
        // Linear backoff: 1s then 2s.
        assert!(started.elapsed() >= Duration::from_millis(3_000));
    }

    #[tokio::test(start_paused = true)]
    async fn long_retry_after_is_capped_at_the_request_timeout() {
        let transport = ScriptedTransport::new(vec![
            throttled(Some("100")),
            throttled(Some("1e20")),
            ok("{}"),
        ]);
        let client = client(transport.clone());

        let started = tokio::time::Instant::now();
        client.request("x.json", RequestOptions::default()).await.unwrap();

        assert_eq!(transport.calls(), 3);
        // Two waits of one 15s timeout each, inside the 3 x 15s call budget.
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_upstream_gives_up_before_overrunning_the_budget() {
        let transport = ScriptedTransport::slow(
            vec![throttled(Some("100")), throttled(Some("100")), ok("{}")],
            Duration::from_secs(10),
        );
        let client = client(transport.clone());

        let started = tokio::time::Instant::now();
        let err = client.request("x.json", RequestOptions::default()).await.unwrap_err();

        // 10s call, 15s wait, 10s call; a second 15s wait would end at 50s.
        assert!(err.is_rate_limit(), "got {err:?}");
        assert_eq!(transport.calls(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_upstream_times_out_at_the_budget() {
        let transport = ScriptedTransport::slow(vec![ok("{}")], Duration::from_secs(600));
        let client = client(transport.clone());

        let started = tokio::time::Instant::now();
        let err = client.request("x.json", RequestOptions::default()).await.unwrap_err();

        assert!(matches!(err, AppError::Timeout { .. }), "got {err:?}");
        assert_eq!(started.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test]
    async fn non_429_status_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Ok(UpstreamResponse { status: 503, retry_after: None, body: "down".to_string() }),
            ok("{}"),
        ]);
        let client = client(transport.clone());

        let err = client.request("x.json", RequestOptions::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Status { status: 503, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn network_errors_propagate_immediately() {
        let transport = ScriptedTransport::new(vec![
            Err(AppError::Timeout { url: "x".to_string() }),
            ok("{}"),
        ]);
        let client = client(transport.clone());

        let err = client.request("x.json", RequestOptions::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn credentials_follow_auth_placement() {
        let transport = ScriptedTransport::new(vec![ok("{}"), ok("{}")]);
        let both = client(transport.clone());
        both.request(
            "/players/p1/profile.json",
            RequestOptions { query: vec![("season".to_string(), "2024".to_string())] },
        )
        .await
        .unwrap();

        let bearer_client = RateLimitedClient::with_policy(
            provider(AuthPlacement::Bearer),
            transport.clone(),
            3,
            Duration::from_millis(1),
            Duration::from_secs(15),
        );
        bearer_client.request("x.json", RequestOptions::default()).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].url, "http://upstream.test/v7/players/p1/profile.json");
        assert_eq!(requests[0].headers, vec![("x-api-key".to_string(), "secret".to_string())]);
        assert_eq!(
            requests[0].query,
            vec![
                ("api_key".to_string(), "secret".to_string()),
                ("season".to_string(), "2024".to_string()),
            ]
        );
        assert_eq!(requests[1].headers, vec![("authorization".to_string(), "Bearer secret".to_string())]);
        assert!(requests[1].query.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let transport = ScriptedTransport::new(vec![ok("<html>oops</html>")]);
        let err = client(transport).request("x.json", RequestOptions::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }
}
