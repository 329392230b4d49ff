use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use crate::db::{EphemerisSource, Store};
use crate::error::Result;
use crate::scorer::EphemerisDay;
use crate::types::{Game, PlayerStat, ScoreRecord};

/// Process-local store for `--memory` runs and tests. Same upsert semantics
/// as SQLite: last write per key wins.
#[derive(Default)]
pub struct MemoryStore {
    games: DashMap<String, Game>,
    stats: DashMap<String, PlayerStat>,
    scores: DashMap<String, ScoreRecord>,
    /// player id → last game it was seen on.
    players: DashMap<String, String>,
    ephemeris: DashMap<NaiveDate, EphemerisDay>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn score_count(&self) -> usize {
        self.scores.len()
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn insert_ephemeris(&self, day: EphemerisDay) {
        self.ephemeris.insert(day.date, day);
    }

    pub fn game(&self, id: &str) -> Option<Game> {
        self.games.get(id).map(|g| g.clone())
    }

    pub fn stat(&self, player_id: &str) -> Option<PlayerStat> {
        self.stats.get(player_id).map(|s| s.clone())
    }

    pub fn score(&self, entity_id: &str) -> Option<ScoreRecord> {
        self.scores.get(entity_id).map(|s| s.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_game(&self, game: &Game) -> Result<()> {
        self.games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    async fn upsert_player_stat(&self, stat: &PlayerStat) -> Result<()> {
        self.stats.insert(stat.player_id.clone(), stat.clone());
        Ok(())
    }

    async fn upsert_score(&self, score: &ScoreRecord) -> Result<()> {
        self.scores.insert(score.entity_id.clone(), score.clone());
        Ok(())
    }

    async fn register_players(&self, game_id: &str, player_ids: &[String]) -> Result<()> {
        for id in player_ids {
            self.players.insert(id.clone(), game_id.to_string());
        }
        Ok(())
    }

    async fn player_ids(&self, offset: usize, limit: usize) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.players.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        Ok(ids.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl EphemerisSource for MemoryStore {
    async fn day(&self, date: NaiveDate) -> Result<Option<EphemerisDay>> {
        Ok(self.ephemeris.get(&date).map(|d| d.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn player_ids_page_in_id_order() {
        let store = MemoryStore::new();
        let ids: Vec<String> = ["c", "a", "b", "e", "d"].iter().map(|s| s.to_string()).collect();
        store.register_players("g1", &ids).await.unwrap();
        // Re-registering is an upsert, not a duplicate.
        store.register_players("g2", &ids[..2]).await.unwrap();

        assert_eq!(store.player_ids(0, 2).await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.player_ids(2, 2).await.unwrap(), vec!["c", "d"]);
        assert_eq!(store.player_ids(4, 2).await.unwrap(), vec!["e"]);
        assert!(store.player_ids(5, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ephemeris_lookup_by_date() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 7, 21).unwrap();
        store.insert_ephemeris(EphemerisDay {
            date,
            moon_phase: 0.5,
            sun_sign: None,
            moon_sign: None,
            mercury_retrograde: true,
            aspects: Vec::new(),
        });
        assert!(store.day(date).await.unwrap().unwrap().mercury_retrograde);
        assert!(store.day(date.succ_opt().unwrap()).await.unwrap().is_none());
    }
}
