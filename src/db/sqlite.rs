use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::models::EphemerisRow;
use crate::db::{EphemerisSource, Store};
use crate::error::Result;
use crate::scorer::EphemerisDay;
use crate::types::{Game, PlayerStat, ScoreRecord, ScoreSource, TeamSide};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and apply migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        // Writes are paced and sequential; one connection is plenty.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database ready at {path}");
        Ok(Self { pool })
    }
}

fn source_label(source: ScoreSource) -> &'static str {
    match source {
        ScoreSource::Reported => "reported",
        ScoreSource::PeriodSum => "period_sum",
        ScoreSource::Absent => "absent",
    }
}

fn side_values(side: &TeamSide) -> (i64, &'static str, i64, i64) {
    (
        i64::from(side.runs),
        source_label(side.runs_source),
        i64::from(side.hits),
        i64::from(side.errors),
    )
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_game(&self, game: &Game) -> Result<()> {
        let (home_runs, home_src, home_hits, home_errors) = side_values(&game.home_team);
        let (away_runs, away_src, away_hits, away_errors) = side_values(&game.away_team);

        sqlx::query(
            r#"
            INSERT INTO games (
                id, status, scheduled_at, venue_name,
                home_team_id, home_team_name, home_team_market,
                home_runs, home_runs_source, home_hits, home_errors, home_record,
                away_team_id, away_team_name, away_team_market,
                away_runs, away_runs_source, away_hits, away_errors, away_record,
                updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                scheduled_at = excluded.scheduled_at,
                venue_name = excluded.venue_name,
                home_team_id = excluded.home_team_id,
                home_team_name = excluded.home_team_name,
                home_team_market = excluded.home_team_market,
                home_runs = excluded.home_runs,
                home_runs_source = excluded.home_runs_source,
                home_hits = excluded.home_hits,
                home_errors = excluded.home_errors,
                home_record = excluded.home_record,
                away_team_id = excluded.away_team_id,
                away_team_name = excluded.away_team_name,
                away_team_market = excluded.away_team_market,
                away_runs = excluded.away_runs,
                away_runs_source = excluded.away_runs_source,
                away_hits = excluded.away_hits,
                away_errors = excluded.away_errors,
                away_record = excluded.away_record,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&game.id)
        .bind(game.status.to_string())
        .bind(game.scheduled_at.map(|t| t.to_rfc3339()))
        .bind(&game.venue_name)
        .bind(&game.home_team.id)
        .bind(&game.home_team.name)
        .bind(&game.home_team.market)
        .bind(home_runs)
        .bind(home_src)
        .bind(home_hits)
        .bind(home_errors)
        .bind(&game.home_team.record)
        .bind(&game.away_team.id)
        .bind(&game.away_team.name)
        .bind(&game.away_team.market)
        .bind(away_runs)
        .bind(away_src)
        .bind(away_hits)
        .bind(away_errors)
        .bind(&game.away_team.record)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_player_stat(&self, s: &PlayerStat) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO player_stats (
                player_id, full_name, team_id, birth_date,
                games_played, at_bats, hits, home_runs, rbi, stolen_bases,
                batting_average, strikeouts, era, points, assists, rebounds,
                field_goal_pct, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(player_id) DO UPDATE SET
                full_name = excluded.full_name,
                team_id = excluded.team_id,
                birth_date = excluded.birth_date,
                games_played = excluded.games_played,
                at_bats = excluded.at_bats,
                hits = excluded.hits,
                home_runs = excluded.home_runs,
                rbi = excluded.rbi,
                stolen_bases = excluded.stolen_bases,
                batting_average = excluded.batting_average,
                strikeouts = excluded.strikeouts,
                era = excluded.era,
                points = excluded.points,
                assists = excluded.assists,
                rebounds = excluded.rebounds,
                field_goal_pct = excluded.field_goal_pct,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&s.player_id)
        .bind(&s.full_name)
        .bind(&s.team_id)
        .bind(s.birth_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(i64::from(s.games_played))
        .bind(i64::from(s.at_bats))
        .bind(i64::from(s.hits))
        .bind(i64::from(s.home_runs))
        .bind(i64::from(s.rbi))
        .bind(i64::from(s.stolen_bases))
        .bind(s.batting_average)
        .bind(i64::from(s.strikeouts))
        .bind(s.era)
        .bind(i64::from(s.points))
        .bind(i64::from(s.assists))
        .bind(i64::from(s.rebounds))
        .bind(s.field_goal_pct)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_score(&self, score: &ScoreRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scores (entity_id, impact_score, influence_score, computed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(entity_id) DO UPDATE SET
                impact_score = excluded.impact_score,
                influence_score = excluded.influence_score,
                computed_at = excluded.computed_at
            "#,
        )
        .bind(&score.entity_id)
        .bind(score.impact_score)
        .bind(score.influence_score)
        .bind(score.computed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn register_players(&self, game_id: &str, player_ids: &[String]) -> Result<()> {
        if player_ids.is_empty() {
            return Ok(());
        }
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for id in player_ids {
            sqlx::query(
                r#"
                INSERT INTO players (id, last_game_id, registered_at)
                VALUES (?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET last_game_id = excluded.last_game_id
                "#,
            )
            .bind(id)
            .bind(game_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn player_ids(&self, offset: usize, limit: usize) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM players ORDER BY id LIMIT ? OFFSET ?")
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl EphemerisSource for SqliteStore {
    async fn day(&self, date: NaiveDate) -> Result<Option<EphemerisDay>> {
        let row = sqlx::query_as::<_, EphemerisRow>(
            r#"
            SELECT date, moon_phase, sun_sign, moon_sign, mercury_retrograde, aspects
            FROM ephemeris
            WHERE date = ?
            "#,
        )
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(EphemerisRow::into_day))
    }
}
