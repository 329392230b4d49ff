//! Persistence boundary. Every write is an upsert keyed by a stable id;
//! nothing is ever deleted.

pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::scorer::EphemerisDay;
use crate::types::{Game, PlayerStat, ScoreRecord};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_game(&self, game: &Game) -> Result<()>;
    async fn upsert_player_stat(&self, stat: &PlayerStat) -> Result<()>;
    async fn upsert_score(&self, score: &ScoreRecord) -> Result<()>;
    /// Remember roster ids seen on `game_id` so they can be paged later.
    async fn register_players(&self, game_id: &str, player_ids: &[String]) -> Result<()>;
    /// Registered player ids in stable (id) order.
    async fn player_ids(&self, offset: usize, limit: usize) -> Result<Vec<String>>;
}

/// The ephemeris collaborator: sign, phase and aspect values per date.
#[async_trait]
pub trait EphemerisSource: Send + Sync {
    async fn day(&self, date: NaiveDate) -> Result<Option<EphemerisDay>>;
}
