use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const SCHEDULE_API_URL: &str = "https://api.sportradar.us/mlb/trial/v7/en";
pub const STATS_API_URL: &str = "https://api.sportradar.us/mlb/trial/v7/en";

/// Per-request timeout applied by the HTTP transport (seconds). Also caps each
/// 429 wait; a whole call, waits included, gets `timeout * max attempts`.
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Total attempts (first call included) before a 429 surfaces as `RateLimited`.
pub const RATE_LIMIT_MAX_ATTEMPTS: u32 = 3;

/// Linear backoff unit when the provider sends no usable `Retry-After`.
pub const RATE_LIMIT_BASE_DELAY_MS: u64 = 1_000;

/// Entities per batch.
pub const BATCH_SIZE: usize = 50;

/// Pause after each entity write, to stay under downstream write limits.
pub const WRITE_PACING_MS: u64 = 100;

/// Pause between batches.
pub const BATCH_PACING_MS: u64 = 1_000;

/// Where the upstream credential goes on each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlacement {
    Header,
    Query,
    Both,
    Bearer,
}

impl AuthPlacement {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "header" => Some(AuthPlacement::Header),
            "query" => Some(AuthPlacement::Query),
            "both" => Some(AuthPlacement::Both),
            "bearer" => Some(AuthPlacement::Bearer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Short label used in logs ("schedule", "stats").
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub auth: AuthPlacement,
    /// Header carrying the key for `Header`/`Both` placement.
    pub key_header: String,
    /// Query parameter carrying the key for `Query`/`Both` placement.
    pub key_param: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub schedule_api: ProviderConfig,
    pub stats_api: ProviderConfig,
    pub cache_dir: PathBuf,
    /// Read-through skips entries older than this; None keeps them fresh forever.
    pub cache_fresh_for: Option<Duration>,
    pub db_path: String,
    pub log_level: String,
    pub request_timeout: Duration,
    pub rate_limit_base_delay: Duration,
    pub rate_limit_max_attempts: u32,
    pub batch_size: usize,
    pub write_pacing: Duration,
    pub batch_pacing: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            schedule_api: provider_from_lookup("schedule", "SCHEDULE_API", SCHEDULE_API_URL, &get)?,
            stats_api: provider_from_lookup("stats", "STATS_API", STATS_API_URL, &get)?,
            cache_dir: PathBuf::from(get("CACHE_DIR").unwrap_or_else(|| "cache".to_string())),
            cache_fresh_for: get("CACHE_FRESH_SECS")
                .map(|v| parse_num::<u64>("CACHE_FRESH_SECS", &v))
                .transpose()?
                .map(Duration::from_secs),
            db_path: get("DB_PATH").unwrap_or_else(|| "ingest.db".to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            request_timeout: Duration::from_secs(num_or("REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS, &get)?.max(1)),
            rate_limit_base_delay: Duration::from_millis(num_or(
                "RATE_LIMIT_BASE_DELAY_MS",
                RATE_LIMIT_BASE_DELAY_MS,
                &get,
            )?),
            rate_limit_max_attempts: num_or("RATE_LIMIT_MAX_ATTEMPTS", RATE_LIMIT_MAX_ATTEMPTS, &get)?.max(1),
            batch_size: num_or("BATCH_SIZE", BATCH_SIZE, &get)?.max(1),
            write_pacing: Duration::from_millis(num_or("WRITE_PACING_MS", WRITE_PACING_MS, &get)?),
            batch_pacing: Duration::from_millis(num_or("BATCH_PACING_MS", BATCH_PACING_MS, &get)?),
        })
    }
}

fn provider_from_lookup<G>(name: &str, prefix: &str, default_url: &str, get: &G) -> Result<ProviderConfig>
where
    G: Fn(&str) -> Option<String>,
{
    let key_var = format!("{prefix}_KEY");
    let api_key = get(&key_var)
        .filter(|k| !is_placeholder(k))
        .ok_or_else(|| AppError::Config(format!("{key_var} is not set")))?;

    let auth_var = format!("{prefix}_AUTH");
    let auth = match get(&auth_var) {
        Some(raw) => AuthPlacement::parse(&raw).ok_or_else(|| {
            AppError::Config(format!("{auth_var} must be one of header, query, both, bearer"))
        })?,
        None => AuthPlacement::Both,
    };

    Ok(ProviderConfig {
        name: name.to_string(),
        base_url: get(&format!("{prefix}_BASE_URL"))
            .unwrap_or_else(|| default_url.to_string())
            .trim_end_matches('/')
            .to_string(),
        api_key,
        auth,
        key_header: get(&format!("{prefix}_KEY_HEADER")).unwrap_or_else(|| "x-api-key".to_string()),
        key_param: get(&format!("{prefix}_KEY_PARAM")).unwrap_or_else(|| "api_key".to_string()),
    })
}

/// `.env.example` values like `your_api_key_here` count as unset.
fn is_placeholder(key: &str) -> bool {
    let k = key.to_lowercase();
    k.starts_with("your_") || k.ends_with("_here") || k == "changeme"
}

fn num_or<T, G>(key: &str, default: T, get: &G) -> Result<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => parse_num(key, &v),
        None => Ok(default),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}
