use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::Fingerprint;
use crate::error::Result;
use crate::types::Cacheable;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// On-disk record. `payload` is the normalized entity, not the raw response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub fingerprint: String,
    pub fetched_at: DateTime<Utc>,
    pub payload: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Served from a usable cache entry; no network call.
    Cached,
    /// Fetched upstream just now.
    Fetched,
    /// Fetch failed; an older entry was served instead.
    Stale,
    /// Fetch failed and nothing was cached.
    Missing,
}

#[derive(Debug, Clone)]
pub struct CacheOutcome<T> {
    pub value: Option<T>,
    pub freshness: Freshness,
}

/// File-backed read-through cache, one JSON file per fingerprint.
///
/// Nothing is ever evicted. `max_age` only decides whether an entry is good
/// enough to skip the network; any entry stays eligible as the stale fallback.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    max_age: Option<Duration>,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>, max_age: Option<Duration>) -> Self {
        Self { root: root.into(), max_age }
    }

    pub fn path_for(&self, fp: &Fingerprint) -> PathBuf {
        self.root.join(fp.file_name())
    }

    /// Never fails: fetch errors degrade to `Stale` or `Missing`.
    pub async fn get_or_fetch<T, F, Fut>(&self, fp: &Fingerprint, fetch: F) -> CacheOutcome<T>
    where
        T: Serialize + DeserializeOwned + Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let existing = self.read::<T>(fp).await;

        if let Some(entry) = &existing {
            if entry.payload.is_usable() && self.is_fresh(entry.fetched_at) {
                debug!(fingerprint = %fp, "cache hit");
                return CacheOutcome {
                    value: existing.map(|e| e.payload),
                    freshness: Freshness::Cached,
                };
            }
        }

        match fetch().await {
            Ok(value) => {
                if value.is_usable() {
                    if let Err(e) = self.write(fp, &value).await {
                        warn!(fingerprint = %fp, "Cache write failed: {e}");
                    }
                }
                CacheOutcome { value: Some(value), freshness: Freshness::Fetched }
            }
            Err(e) => match existing {
                Some(entry) => {
                    warn!(
                        fingerprint = %fp,
                        fetched_at = %entry.fetched_at,
                        "Fetch failed, serving stale cache: {e}"
                    );
                    CacheOutcome { value: Some(entry.payload), freshness: Freshness::Stale }
                }
                None => {
                    warn!(fingerprint = %fp, "Fetch failed and nothing cached: {e}");
                    CacheOutcome { value: None, freshness: Freshness::Missing }
                }
            },
        }
    }

    /// Missing files are a silent miss; unreadable or corrupt ones are logged.
    pub async fn read<T: DeserializeOwned>(&self, fp: &Fingerprint) -> Option<CacheEntry<T>> {
        let path = self.path_for(fp);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(fingerprint = %fp, path = %path.display(), "Cache read failed: {e}");
                return None;
            }
        };
        match serde_json::from_slice::<CacheEntry<T>>(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(fingerprint = %fp, path = %path.display(), "Cache entry unreadable: {e}");
                None
            }
        }
    }

    /// Whole-file replacement via a sibling temp file and rename.
    pub async fn write<T: Serialize>(&self, fp: &Fingerprint, payload: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let entry = CacheEntry {
            fingerprint: fp.as_str().to_string(),
            fetched_at: Utc::now(),
            payload,
        };
        let bytes = serde_json::to_vec_pretty(&entry)?;

        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .root
            .join(format!(".{}.{}.{}.tmp", fp.as_str(), std::process::id(), seq));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(fp)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(fingerprint = %fp, bytes = bytes.len(), "cache written");
        Ok(())
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>) -> bool {
        let Some(max_age) = self.max_age else {
            return true;
        };
        match Utc::now().signed_duration_since(fetched_at).to_std() {
            Ok(age) => age <= max_age,
            // Timestamp in the future: clock skew, treat as fresh.
            Err(_) => true,
        }
    }
}
