//! Wires fetchers, scorer and store into the two batch jobs the CLI runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::batch::{BatchSummary, BatchUpdater, EntityJob, PageSource};
use crate::cache::CacheStore;
use crate::client::{RateLimitedClient, Transport};
use crate::config::Config;
use crate::db::{EphemerisSource, Store};
use crate::error::{AppError, Result};
use crate::fetcher::{DetailFetcher, PlayerFetcher, ScheduleFetcher};
use crate::scorer::{score_player, EphemerisDay};
use crate::types::Game;

pub struct Pipeline {
    schedule: ScheduleFetcher,
    details: DetailFetcher,
    players: PlayerFetcher,
    store: Arc<dyn Store>,
    ephemeris: Arc<dyn EphemerisSource>,
    updater: BatchUpdater,
}

impl Pipeline {
    pub fn new(
        cfg: &Config,
        transport: Arc<dyn Transport>,
        store: Arc<dyn Store>,
        ephemeris: Arc<dyn EphemerisSource>,
    ) -> Self {
        let schedule_client = Arc::new(RateLimitedClient::new(cfg.schedule_api.clone(), transport.clone(), cfg));
        let stats_client = Arc::new(RateLimitedClient::new(cfg.stats_api.clone(), transport, cfg));
        let cache = CacheStore::new(cfg.cache_dir.clone(), cfg.cache_fresh_for);

        Self {
            schedule: ScheduleFetcher::new(schedule_client.clone(), cache.clone()),
            details: DetailFetcher::new(schedule_client, cache.clone()),
            players: PlayerFetcher::new(stats_client, cache),
            store,
            ephemeris,
            updater: BatchUpdater::from_config(cfg),
        }
    }

    pub async fn schedule(&self, date: NaiveDate) -> Vec<Game> {
        let games = self.schedule.fetch(&date).await;
        info!(date = %date, games = games.len(), "Schedule loaded");
        games
    }

    /// Schedule → per-game detail → upsert game and register its roster.
    pub async fn sync_games(&self, date: NaiveDate) -> BatchSummary {
        let games = self.schedule(date).await;
        let ids: Vec<String> = games.iter().map(|g| g.id.clone()).collect();
        let job = GameSyncJob {
            details: &self.details,
            store: self.store.as_ref(),
            scheduled: games.into_iter().map(|g| (g.id.clone(), g)).collect(),
        };
        self.updater.run_all(&job, &ids).await
    }

    /// Score the given players, or every registered player page by page.
    pub async fn score_players(&self, ids: Option<Vec<String>>, date: NaiveDate) -> BatchSummary {
        let day = match self.ephemeris.day(date).await {
            Ok(Some(day)) => Some(day),
            Ok(None) => {
                warn!(date = %date, "No ephemeris for date, influence scores will be neutral-based");
                None
            }
            Err(e) => {
                warn!(date = %date, "Ephemeris lookup failed: {e}");
                None
            }
        };
        let job = PlayerScoringJob {
            players: &self.players,
            store: self.store.as_ref(),
            day,
        };
        match ids {
            Some(ids) => self.updater.run_all(&job, &ids).await,
            None => {
                let pages = StorePages { store: self.store.as_ref() };
                self.updater.run_paged(&job, &pages).await
            }
        }
    }
}

struct GameSyncJob<'a> {
    details: &'a DetailFetcher,
    store: &'a dyn Store,
    /// Schedule-level records, written when the detail is unavailable.
    scheduled: HashMap<String, Game>,
}

#[async_trait]
impl EntityJob for GameSyncJob<'_> {
    fn name(&self) -> &'static str {
        "sync_games"
    }

    async fn process(&self, id: &str) -> Result<()> {
        match self.details.fetch(id).await {
            Some(detail) => {
                persisted("game", id, self.store.upsert_game(&detail.game).await)?;
                persisted("roster", id, self.store.register_players(&detail.game.id, &detail.player_ids).await)?;
                debug!(game = %id, players = detail.player_ids.len(), "game synced");
                Ok(())
            }
            None => match self.scheduled.get(id) {
                Some(game) => {
                    warn!(game = %id, "No detail available, keeping schedule record");
                    persisted("game", id, self.store.upsert_game(game).await)
                }
                None => Err(AppError::Unavailable(format!("game {id}"))),
            },
        }
    }
}

struct PlayerScoringJob<'a> {
    players: &'a PlayerFetcher,
    store: &'a dyn Store,
    day: Option<EphemerisDay>,
}

#[async_trait]
impl EntityJob for PlayerScoringJob<'_> {
    fn name(&self) -> &'static str {
        "score_players"
    }

    async fn process(&self, id: &str) -> Result<()> {
        let stat = self
            .players
            .fetch(id)
            .await
            .ok_or_else(|| AppError::Unavailable(format!("player {id}")))?;
        let score = score_player(&stat, self.day.as_ref());

        persisted("player stat", id, self.store.upsert_player_stat(&stat).await)?;
        persisted("score", id, self.store.upsert_score(&score).await)?;
        debug!(
            player = %id,
            impact = score.impact_score,
            influence = score.influence_score,
            "player scored"
        );
        Ok(())
    }
}

/// Store write failures carry the entity they were for.
fn persisted(what: &str, id: &str, result: Result<()>) -> Result<()> {
    result.map_err(|e| AppError::Persistence(format!("{what} {id}: {e}")))
}

struct StorePages<'a> {
    store: &'a dyn Store,
}

#[async_trait]
impl PageSource for StorePages<'_> {
    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<String>> {
        self.store.player_ids(offset, limit).await
    }
}
