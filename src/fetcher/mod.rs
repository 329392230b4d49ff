//! Get-or-fetch per logical entity: cache first, then one upstream call
//! (plus the client's own 429 retries), then the stale fallback.

pub mod endpoints;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::cache::{CacheOutcome, CacheStore, Fingerprint, Freshness};
use crate::client::{RateLimitedClient, RequestOptions};
use crate::types::{Cacheable, Game, GameDetail, PlayerStat, RawPayload};

pub use endpoints::{GameSummary, PlayerProfile, Schedule};

/// One upstream resource: where it lives, how it is keyed in the cache, and
/// how its payload becomes a canonical value.
pub trait Endpoint {
    type Key: ?Sized + std::fmt::Display;
    type Output: Serialize + DeserializeOwned + Cacheable;
    const KIND: &'static str;

    fn path(key: &Self::Key) -> String;
    fn fingerprint(key: &Self::Key) -> Fingerprint;
    fn normalize(raw: &RawPayload) -> Self::Output;
}

pub struct EntityFetcher<E> {
    client: Arc<RateLimitedClient>,
    cache: CacheStore,
    _endpoint: PhantomData<E>,
}

pub type ScheduleFetcher = EntityFetcher<Schedule>;
pub type DetailFetcher = EntityFetcher<GameSummary>;
pub type PlayerFetcher = EntityFetcher<PlayerProfile>;

impl<E: Endpoint> EntityFetcher<E> {
    pub fn new(client: Arc<RateLimitedClient>, cache: CacheStore) -> Self {
        Self { client, cache, _endpoint: PhantomData }
    }

    /// Full outcome, including whether the value came from cache or is stale.
    pub async fn fetch_outcome(&self, key: &E::Key) -> CacheOutcome<E::Output> {
        let fp = E::fingerprint(key);
        let path = E::path(key);
        let outcome = self
            .cache
            .get_or_fetch(&fp, || async {
                let raw = self.client.request(&path, RequestOptions::default()).await?;
                Ok(E::normalize(&raw))
            })
            .await;

        match outcome.freshness {
            Freshness::Fetched => info!(kind = E::KIND, key = %key, provider = self.client.provider_name(), "fetched"),
            Freshness::Stale => info!(kind = E::KIND, key = %key, "served stale"),
            Freshness::Cached | Freshness::Missing => {}
        }
        outcome
    }
}

impl ScheduleFetcher {
    /// Empty when the day has no games or nothing could be fetched or cached.
    pub async fn fetch(&self, date: &chrono::NaiveDate) -> Vec<Game> {
        self.fetch_outcome(date).await.value.unwrap_or_default()
    }
}

impl DetailFetcher {
    /// `None` when nothing usable could be fetched or cached.
    pub async fn fetch(&self, game_id: &str) -> Option<GameDetail> {
        self.fetch_outcome(game_id).await.value.filter(Cacheable::is_usable)
    }
}

impl PlayerFetcher {
    pub async fn fetch(&self, player_id: &str) -> Option<PlayerStat> {
        self.fetch_outcome(player_id).await.value.filter(Cacheable::is_usable)
    }
}
