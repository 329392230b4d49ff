use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_ID: &str = "unknown";
pub const UNKNOWN_NAME: &str = "Unknown";

/// Opaque provider response. Consumed once by the normalizer.
pub type RawPayload = serde_json::Value;

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub status: GameStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue_name: String,
    /// Always present; a sentinel `TeamSide::unknown()` when upstream omitted it.
    pub home_team: TeamSide,
    pub away_team: TeamSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    Postponed,
    Canceled,
}

impl GameStatus {
    /// Map free-form provider status text. Unknown text is `Scheduled`.
    ///
    /// An "incomplete" game was stopped and will be resumed, so it sits with
    /// suspended games rather than finished ones.
    pub fn from_provider(raw: &str) -> Self {
        const PAUSED: &[&str] = &["halftime", "end period", "end of period", "intermission", "delay"];

        let s = raw.to_lowercase().replace(['_', '-'], " ");
        if s.contains("postpon") || s.contains("suspend") || s.contains("incomplete") {
            GameStatus::Postponed
        } else if s.contains("cancel") {
            GameStatus::Canceled
        } else if s.contains("inprogress")
            || s.contains("in progress")
            || s == "live"
            || PAUSED.iter().any(|p| s.contains(p))
        {
            GameStatus::InProgress
        } else if s.contains("final") || s.contains("closed") || s.contains("complete") {
            GameStatus::Final
        } else {
            GameStatus::Scheduled
        }
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::InProgress => "in_progress",
            GameStatus::Final => "final",
            GameStatus::Postponed => "postponed",
            GameStatus::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// TeamSide
// ---------------------------------------------------------------------------

/// Where a side's `runs` came from. Keeps a real 0-0 apart from "no totals sent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Upstream sent a top-level total.
    Reported,
    /// Summed from inning/period sub-scores.
    PeriodSum,
    /// Neither totals nor periods were present; `runs` is 0.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSide {
    pub id: String,
    pub name: String,
    pub market: String,
    pub runs: u32,
    pub runs_source: ScoreSource,
    pub hits: u32,
    pub errors: u32,
    pub wins: u32,
    pub losses: u32,
    /// `"{wins}-{losses}"`.
    pub record: String,
}

impl TeamSide {
    pub fn unknown() -> Self {
        Self {
            id: UNKNOWN_ID.to_string(),
            name: UNKNOWN_NAME.to_string(),
            market: UNKNOWN_NAME.to_string(),
            runs: 0,
            runs_source: ScoreSource::Absent,
            hits: 0,
            errors: 0,
            wins: 0,
            losses: 0,
            record: format_record(0, 0),
        }
    }
}

pub fn format_record(wins: u32, losses: u32) -> String {
    format!("{wins}-{losses}")
}

// ---------------------------------------------------------------------------
// PlayerStat
// ---------------------------------------------------------------------------

/// Season line for one player. Covers the baseball and basketball feeds;
/// fields a feed doesn't carry resolve to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub player_id: String,
    pub full_name: String,
    pub team_id: String,
    pub birth_date: Option<chrono::NaiveDate>,
    pub games_played: u32,
    pub at_bats: u32,
    pub hits: u32,
    pub home_runs: u32,
    pub rbi: u32,
    pub stolen_bases: u32,
    pub batting_average: f64,
    pub strikeouts: u32,
    pub era: f64,
    pub points: u32,
    pub assists: u32,
    pub rebounds: u32,
    /// Fraction in `[0, 1]`; percentages from upstream are scaled down.
    pub field_goal_pct: f64,
}

// ---------------------------------------------------------------------------
// ScoreRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub entity_id: String,
    /// `[0, 100]`.
    pub impact_score: i64,
    /// `[-100, 100]`, 0 is neutral.
    pub influence_score: i64,
    pub computed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Cache validity
// ---------------------------------------------------------------------------

/// Whether a cached value is worth serving without refetching.
pub trait Cacheable {
    fn is_usable(&self) -> bool;
}

impl Cacheable for Vec<Game> {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

impl Cacheable for Game {
    fn is_usable(&self) -> bool {
        self.id != UNKNOWN_ID
    }
}

impl Cacheable for GameDetail {
    fn is_usable(&self) -> bool {
        self.game.is_usable()
    }
}

impl Cacheable for PlayerStat {
    fn is_usable(&self) -> bool {
        self.player_id != UNKNOWN_ID
    }
}

/// A game summary plus the roster ids found alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetail {
    pub game: Game,
    #[serde(default)]
    pub player_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(GameStatus::from_provider("Scheduled"), GameStatus::Scheduled);
        assert_eq!(GameStatus::from_provider("InProgress"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_provider("in_progress"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_provider("Final"), GameStatus::Final);
        assert_eq!(GameStatus::from_provider("closed"), GameStatus::Final);
        assert_eq!(GameStatus::from_provider("Postponed"), GameStatus::Postponed);
        assert_eq!(GameStatus::from_provider("Canceled"), GameStatus::Canceled);
        assert_eq!(GameStatus::from_provider("cancelled"), GameStatus::Canceled);
        assert_eq!(GameStatus::from_provider(""), GameStatus::Scheduled);
    }

    #[test]
    fn espn_status_names() {
        assert_eq!(GameStatus::from_provider("STATUS_SCHEDULED"), GameStatus::Scheduled);
        assert_eq!(GameStatus::from_provider("STATUS_IN_PROGRESS"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_provider("STATUS_HALFTIME"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_provider("STATUS_END_PERIOD"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_provider("STATUS_DELAYED"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_provider("STATUS_RAIN_DELAY"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_provider("STATUS_FINAL"), GameStatus::Final);
        assert_eq!(GameStatus::from_provider("STATUS_POSTPONED"), GameStatus::Postponed);
        assert_eq!(GameStatus::from_provider("STATUS_CANCELED"), GameStatus::Canceled);
    }

    #[test]
    fn incomplete_is_not_final() {
        assert_eq!(GameStatus::from_provider("incomplete"), GameStatus::Postponed);
        assert_eq!(GameStatus::from_provider("Completed Early"), GameStatus::Final);
        assert_eq!(GameStatus::from_provider("complete"), GameStatus::Final);
    }

    #[test]
    fn unknown_side_is_fully_defaulted() {
        let side = TeamSide::unknown();
        assert_eq!(side.id, UNKNOWN_ID);
        assert_eq!(side.name, "Unknown");
        assert_eq!(side.record, "0-0");
        assert_eq!(side.runs_source, ScoreSource::Absent);
    }
}
