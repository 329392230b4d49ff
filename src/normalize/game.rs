use serde_json::Value;

use crate::normalize::accessor::{
    as_count, as_date_time, as_text, first, itself, resolve, text, Accessor, Accessor::Path,
};
use crate::types::{
    format_record, Game, GameDetail, GameStatus, ScoreSource, TeamSide, UNKNOWN_ID, UNKNOWN_NAME,
};

// ---------------------------------------------------------------------------
// Game-level field tables
// ---------------------------------------------------------------------------

const GAME_ID: &[Accessor] = &[
    Path("id"),
    Path("game_id"),
    Path("gameId"),
    Path("GameID"),
    Path("gamePk"),
];

const STATUS: &[Accessor] = &[
    Path("status"),
    Path("status.detailedState"),
    Path("status.type.name"),
    Path("Status"),
    Path("state"),
];

const SCHEDULED_AT: &[Accessor] = &[
    Path("scheduled"),
    Path("start_time"),
    Path("startTime"),
    Path("gameDate"),
    Path("DateTime"),
    Path("date"),
];

const VENUE: &[Accessor] = &[
    Path("venue.name"),
    Path("venue_name"),
    Path("venue.fullName"),
    Path("competitions.0.venue.fullName"),
    Path("StadiumName"),
    Path("Stadium.Name"),
    Path("venue"),
];

/// Where the game list sits in a schedule response, when it isn't the root.
const SCHEDULE_GAMES: &[Accessor] = &[
    Path("games"),
    Path("league.games"),
    Path("date.games"),
    Path("dates.0.games"),
    Path("events"),
];

const DETAIL_ROOT: &[Accessor] = &[Path("game"), Path("summary.game")];

// ---------------------------------------------------------------------------
// Side field tables
// ---------------------------------------------------------------------------

// Relative to a side object (`home_team`, `home`, `teams.home`, ...).
const SIDE_ID: &[Accessor] = &[Path("id"), Path("team.id"), Path("team_id")];
const SIDE_NAME: &[Accessor] = &[Path("name"), Path("team.name"), Path("team.displayName"), Path("abbr")];
const SIDE_MARKET: &[Accessor] = &[Path("market"), Path("team.location"), Path("city")];
const SIDE_RUNS: &[Accessor] = &[Path("runs"), Path("scoring.runs"), Path("score"), Path("points")];
const SIDE_HITS: &[Accessor] = &[Path("hits"), Path("scoring.hits"), Path("h")];
const SIDE_ERRORS: &[Accessor] = &[Path("errors"), Path("scoring.errors"), Path("e")];
const SIDE_WINS: &[Accessor] = &[
    Path("win"),
    Path("wins"),
    Path("record.wins"),
    Path("leagueRecord.wins"),
];
const SIDE_LOSSES: &[Accessor] = &[
    Path("loss"),
    Path("losses"),
    Path("record.losses"),
    Path("leagueRecord.losses"),
];
const SIDE_PERIODS: &[Accessor] = &[
    Path("innings"),
    Path("scoring.innings"),
    Path("scoring"),
    Path("periods"),
    Path("linescores"),
];
/// Runs inside one element of a side's period list.
const PERIOD_RUNS: &[Accessor] = &[Path("runs"), Path("points"), Path("score"), Path("value"), Accessor::With(itself)];

const NONE: &[Accessor] = &[];

/// Game-level period lists whose elements carry both sides.
const GAME_PERIODS: &[Accessor] = &[Path("innings"), Path("periods"), Path("linescore.innings")];

struct SideTable {
    roots: &'static [Accessor],
    /// Flat, game-level keys (SportsData style).
    flat_id: &'static [Accessor],
    flat_name: &'static [Accessor],
    flat_runs: &'static [Accessor],
    flat_wins: &'static [Accessor],
    flat_losses: &'static [Accessor],
    /// Runs for this side inside one element of a game-level period list.
    game_period_runs: &'static [Accessor],
}

const HOME: SideTable = SideTable {
    roots: &[
        Path("home_team"),
        Path("home"),
        Path("teams.home"),
        Accessor::With(home_competitor),
    ],
    flat_id: &[Path("HomeTeamID"), Path("home_team_id"), Path("homeTeamId")],
    flat_name: &[Path("HomeTeamName"), Path("HomeTeam"), Path("home_team_name")],
    flat_runs: &[
        Path("HomeTeamRuns"),
        Path("HomeTeamScore"),
        Path("home_score"),
        Path("scoring.home.runs"),
    ],
    flat_wins: &[Path("HomeTeamWins")],
    flat_losses: &[Path("HomeTeamLosses")],
    game_period_runs: &[Path("scoring.home.runs"), Path("home.runs"), Path("home")],
};

const AWAY: SideTable = SideTable {
    roots: &[
        Path("away_team"),
        Path("away"),
        Path("teams.away"),
        Accessor::With(away_competitor),
    ],
    flat_id: &[Path("AwayTeamID"), Path("away_team_id"), Path("awayTeamId")],
    flat_name: &[Path("AwayTeamName"), Path("AwayTeam"), Path("away_team_name")],
    flat_runs: &[
        Path("AwayTeamRuns"),
        Path("AwayTeamScore"),
        Path("away_score"),
        Path("scoring.away.runs"),
    ],
    flat_wins: &[Path("AwayTeamWins")],
    flat_losses: &[Path("AwayTeamLosses")],
    game_period_runs: &[Path("scoring.away.runs"), Path("away.runs"), Path("away")],
};

fn home_competitor(v: &Value) -> Option<&Value> {
    competitor(v, "home")
}

fn away_competitor(v: &Value) -> Option<&Value> {
    competitor(v, "away")
}

/// ESPN-style `competitions[0].competitors[]` tagged with `homeAway`.
fn competitor<'a>(v: &'a Value, side: &str) -> Option<&'a Value> {
    v.get("competitions")?
        .get(0)?
        .get("competitors")?
        .as_array()?
        .iter()
        .find(|c| c.get("homeAway").and_then(Value::as_str) == Some(side))
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// One game object. Total: any JSON value yields a `Game`.
pub fn normalize_game(raw: &Value) -> Game {
    Game {
        id: text(raw, GAME_ID, UNKNOWN_ID),
        status: resolve(&[raw], STATUS, as_text)
            .map(|s| GameStatus::from_provider(&s))
            .unwrap_or(GameStatus::Scheduled),
        scheduled_at: resolve(&[raw], SCHEDULED_AT, as_date_time),
        venue_name: text(raw, VENUE, UNKNOWN_NAME),
        home_team: normalize_side(raw, &HOME),
        away_team: normalize_side(raw, &AWAY),
    }
}

/// A schedule response: `games`, `league.games`, or a bare array.
/// Non-object entries are skipped.
pub fn normalize_schedule(raw: &Value) -> Vec<Game> {
    let list = match raw {
        Value::Array(items) => Some(items),
        _ => first(raw, SCHEDULE_GAMES).and_then(Value::as_array),
    };
    list.map(|items| {
        items
            .iter()
            .filter(|g| g.is_object())
            .map(normalize_game)
            .collect()
    })
    .unwrap_or_default()
}

/// A game summary, nested under `game` or flat, plus any roster ids in it.
pub fn normalize_detail(raw: &Value) -> GameDetail {
    let root = first(raw, DETAIL_ROOT).filter(|g| g.is_object()).unwrap_or(raw);
    let mut player_ids = roster_ids(root);
    if !std::ptr::eq(root, raw) {
        for id in roster_ids(raw) {
            if !player_ids.contains(&id) {
                player_ids.push(id);
            }
        }
    }
    GameDetail { game: normalize_game(root), player_ids }
}

fn normalize_side(raw: &Value, table: &SideTable) -> TeamSide {
    let objs: Vec<&Value> = table.roots.iter().filter_map(|a| a.get(raw)).filter(|v| v.is_object()).collect();

    let side_count = |rel: &[Accessor], flat: &[Accessor]| {
        resolve(&objs, rel, as_count).or_else(|| resolve(&[raw], flat, as_count))
    };
    let side_text = |rel: &[Accessor], flat: &[Accessor]| {
        resolve(&objs, rel, as_text).or_else(|| resolve(&[raw], flat, as_text))
    };

    let (runs, runs_source) = reconcile_runs(side_count(SIDE_RUNS, table.flat_runs), period_sum(raw, &objs, table));
    let wins = side_count(SIDE_WINS, table.flat_wins).unwrap_or_default();
    let losses = side_count(SIDE_LOSSES, table.flat_losses).unwrap_or_default();

    // Anything upstream left out keeps the sentinel side's value.
    let unknown = TeamSide::unknown();
    TeamSide {
        id: side_text(SIDE_ID, table.flat_id).unwrap_or(unknown.id),
        name: side_text(SIDE_NAME, table.flat_name).unwrap_or(unknown.name),
        market: side_text(SIDE_MARKET, NONE).unwrap_or(unknown.market),
        runs,
        runs_source,
        hits: side_count(SIDE_HITS, NONE).unwrap_or(unknown.hits),
        errors: side_count(SIDE_ERRORS, NONE).unwrap_or(unknown.errors),
        wins,
        losses,
        record: format_record(wins, losses),
    }
}

/// Totals vs inning sub-scores.
///
/// A reported total wins, including a genuine 0. The one exception is a
/// reported 0 while the innings already add up to more: upstream fills
/// totals late, so the innings are believed.
fn reconcile_runs(total: Option<u32>, periods: Option<u32>) -> (u32, ScoreSource) {
    match (total, periods) {
        (Some(0), Some(p)) if p > 0 => (p, ScoreSource::PeriodSum),
        (Some(t), _) => (t, ScoreSource::Reported),
        (None, Some(p)) => (p, ScoreSource::PeriodSum),
        (None, None) => (0, ScoreSource::Absent),
    }
}

/// Sum of this side's per-inning runs, from a side-level list or a
/// game-level list. `None` when neither list exists.
fn period_sum(raw: &Value, objs: &[&Value], table: &SideTable) -> Option<u32> {
    let side_list = objs.iter().find_map(|o| first_array(o, SIDE_PERIODS));
    if let Some(items) = side_list {
        return Some(sum_periods(items, PERIOD_RUNS));
    }

    let game_list = first_array(raw, GAME_PERIODS)?;
    Some(sum_periods(game_list, table.game_period_runs))
}

/// `scoring` is a list for some feeds and an object for others.
fn first_array<'a>(root: &'a Value, accessors: &[Accessor]) -> Option<&'a Vec<Value>> {
    accessors.iter().filter_map(|a| a.get(root)).find_map(Value::as_array)
}

fn sum_periods(items: &[Value], runs: &[Accessor]) -> u32 {
    items
        .iter()
        .filter_map(|p| resolve(&[p], runs, as_count))
        .fold(0u32, u32::saturating_add)
}

/// Roster player ids: top-level `players` plus each side's `players`.
pub fn roster_ids(root: &Value) -> Vec<String> {
    const LISTS: &[Accessor] = &[
        Path("players"),
        Path("home.players"),
        Path("away.players"),
        Path("home_team.players"),
        Path("away_team.players"),
    ];
    const PLAYER_ID: &[Accessor] = &[Path("id"), Path("player_id"), Path("PlayerID"), Path("person.id")];

    let mut ids: Vec<String> = Vec::new();
    for list in LISTS.iter().filter_map(|a| a.get(root)).filter_map(Value::as_array) {
        for id in list.iter().filter_map(|p| resolve(&[p], PLAYER_ID, as_text)) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_home_team_shape() {
        let raw = json!({
            "id": "g-1",
            "status": "closed",
            "scheduled": "2024-07-04T18:05:00+00:00",
            "venue": {"name": "Fenway Park"},
            "home_team": {"id": "bos", "name": "Red Sox", "market": "Boston", "runs": 5, "hits": 9, "errors": 1, "win": 50, "loss": 40},
            "away_team": {"id": "nyy", "name": "Yankees", "market": "New York", "runs": 3}
        });
        let g = normalize_game(&raw);
        assert_eq!(g.id, "g-1");
        assert_eq!(g.status, GameStatus::Final);
        assert_eq!(g.venue_name, "Fenway Park");
        assert!(g.scheduled_at.is_some());
        assert_eq!(g.home_team.name, "Red Sox");
        assert_eq!(g.home_team.runs, 5);
        assert_eq!(g.home_team.record, "50-40");
        assert_eq!(g.away_team.runs, 3);
        assert_eq!(g.away_team.runs_source, ScoreSource::Reported);
    }

    #[test]
    fn flat_sportsdata_shape() {
        let raw = json!({
            "GameID": 61234,
            "Status": "InProgress",
            "DateTime": "2024-07-04T19:10:00",
            "StadiumName": "Wrigley Field",
            "HomeTeamID": 3, "HomeTeam": "CHC", "HomeTeamRuns": 2,
            "AwayTeamID": 9, "AwayTeam": "STL", "AwayTeamRuns": null
        });
        let g = normalize_game(&raw);
        assert_eq!(g.id, "61234");
        assert_eq!(g.status, GameStatus::InProgress);
        assert_eq!(g.venue_name, "Wrigley Field");
        assert_eq!(g.home_team.id, "3");
        assert_eq!(g.home_team.name, "CHC");
        assert_eq!(g.home_team.runs, 2);
        assert_eq!(g.away_team.runs, 0);
        assert_eq!(g.away_team.runs_source, ScoreSource::Absent);
    }

    #[test]
    fn espn_competitors_shape() {
        let raw = json!({
            "id": "401",
            "status": {"type": {"name": "STATUS_FINAL"}},
            "competitions": [{
                "venue": {"fullName": "Dodger Stadium"},
                "competitors": [
                    {"homeAway": "away", "score": "1", "team": {"id": "sf", "displayName": "Giants"}},
                    {"homeAway": "home", "score": "6", "team": {"id": "lad", "displayName": "Dodgers"}}
                ]
            }]
        });
        let g = normalize_game(&raw);
        assert_eq!(g.status, GameStatus::Final);
        assert_eq!(g.venue_name, "Dodger Stadium");
        assert_eq!(g.home_team.id, "lad");
        assert_eq!(g.home_team.name, "Dodgers");
        assert_eq!(g.home_team.runs, 6);
        assert_eq!(g.away_team.name, "Giants");
        assert_eq!(g.away_team.runs, 1);
    }

    #[test]
    fn malformed_payloads_resolve_to_defaults() {
        for raw in [json!(null), json!({}), json!([]), json!("garbage"), json!({"home": 7, "away_team": []})] {
            let g = normalize_game(&raw);
            assert_eq!(g.id, "unknown");
            assert_eq!(g.status, GameStatus::Scheduled);
            assert_eq!(g.venue_name, "Unknown");
            for side in [&g.home_team, &g.away_team] {
                assert_eq!(side.id, UNKNOWN_ID);
                assert_eq!(side.name, "Unknown");
                assert_eq!((side.runs, side.hits, side.errors, side.wins, side.losses), (0, 0, 0, 0, 0));
                assert_eq!(side.record, "0-0");
            }
        }
    }

    #[test]
    fn wrong_typed_leaves_under_every_side_shape() {
        for (leaf, count) in crate::normalize::hostile_leaves() {
            let side = json!({
                "id": leaf, "runs": leaf, "hits": leaf, "errors": leaf,
                "win": leaf, "loss": leaf, "innings": [leaf, {"runs": leaf}],
            });
            let espn = json!({
                "homeAway": "home", "team": {"id": leaf}, "score": leaf, "hits": leaf,
                "errors": leaf, "wins": leaf, "losses": leaf, "linescores": [{"value": leaf}],
            });
            // (payload, whether hits/errors are reachable in that shape)
            let shapes = [
                (json!({"home_team": side, "scheduled": leaf, "status": leaf}), true),
                (json!({"home": side, "start_time": leaf, "state": leaf}), true),
                (json!({"teams": {"home": side}, "gameDate": leaf, "status": {"detailedState": leaf}}), true),
                (json!({"competitions": [{"competitors": [espn]}], "date": leaf, "status": {"type": {"name": leaf}}}), true),
                (
                    json!({
                        "HomeTeamID": leaf, "HomeTeamRuns": leaf, "HomeTeamWins": leaf,
                        "HomeTeamLosses": leaf, "innings": [{"home": leaf}], "DateTime": leaf,
                    }),
                    false,
                ),
            ];

            let expected_id = as_text(&leaf).unwrap_or_else(|| UNKNOWN_ID.to_string());
            let n = count.unwrap_or(0);
            for (raw, has_hits) in shapes {
                let g = normalize_game(&raw);
                assert_eq!(g.status, GameStatus::Scheduled, "{raw}");
                assert!(g.scheduled_at.is_none(), "{raw}");
                let home = &g.home_team;
                assert_eq!(home.id, expected_id, "{raw}");
                assert_eq!(home.runs, n, "{raw}");
                assert_eq!((home.wins, home.losses), (n, n), "{raw}");
                assert_eq!(home.record, format_record(n, n), "{raw}");
                if has_hits {
                    assert_eq!((home.hits, home.errors), (n, n), "{raw}");
                }
                assert_eq!(g.away_team.id, UNKNOWN_ID, "{raw}");
                assert_eq!(g.away_team.runs, 0, "{raw}");
            }

            // The side root itself is the bad leaf.
            let raw = json!({"home_team": leaf, "home": leaf, "teams": {"home": leaf}, "competitions": leaf});
            assert_eq!(normalize_game(&raw).home_team, TeamSide::unknown(), "{raw}");
        }
    }

    #[test]
    fn genuine_zero_zero_is_reported_not_absent() {
        let raw = json!({"home": {"id": "a", "runs": 0}, "away": {"id": "b", "runs": 0}});
        let g = normalize_game(&raw);
        assert_eq!(g.home_team.runs_source, ScoreSource::Reported);
        assert_eq!(g.away_team.runs_source, ScoreSource::Reported);

        let absent = normalize_game(&json!({"home": {"id": "a"}, "away": {"id": "b"}}));
        assert_eq!(absent.home_team.runs_source, ScoreSource::Absent);
        assert_eq!(absent.home_team.runs, 0);
    }

    #[test]
    fn zero_total_with_scored_innings_uses_inning_sum() {
        let raw = json!({
            "home": {"id": "a", "runs": 0, "scoring": {"innings": [{"runs": 1}, {"runs": 0}, {"runs": 2}]}},
            "away": {"id": "b", "innings": [0, 0, "1"]}
        });
        let g = normalize_game(&raw);
        assert_eq!(g.home_team.runs, 3);
        assert_eq!(g.home_team.runs_source, ScoreSource::PeriodSum);
        assert_eq!(g.away_team.runs, 1);
        assert_eq!(g.away_team.runs_source, ScoreSource::PeriodSum);
    }

    #[test]
    fn game_level_innings_are_split_by_side() {
        let raw = json!({
            "home": {"id": "a"},
            "away": {"id": "b"},
            "innings": [
                {"scoring": {"home": {"runs": 2}, "away": {"runs": 0}}},
                {"scoring": {"home": {"runs": 0}, "away": {"runs": 4}}}
            ]
        });
        let g = normalize_game(&raw);
        assert_eq!((g.home_team.runs, g.away_team.runs), (2, 4));
        assert_eq!(g.home_team.runs_source, ScoreSource::PeriodSum);
    }

    #[test]
    fn nested_scoring_runs_path() {
        let raw = json!({"scoring": {"home": {"runs": 7}, "away": {"runs": 2}}});
        let g = normalize_game(&raw);
        assert_eq!((g.home_team.runs, g.away_team.runs), (7, 2));
        assert_eq!(g.home_team.runs_source, ScoreSource::Reported);
    }

    #[test]
    fn schedule_envelopes() {
        let game = json!({"id": "g1"});
        assert_eq!(normalize_schedule(&json!({"games": [game.clone()]})).len(), 1);
        assert_eq!(normalize_schedule(&json!({"league": {"games": [game.clone(), game.clone()]}})).len(), 2);
        assert_eq!(normalize_schedule(&json!([game.clone(), 5, null])).len(), 1);
        assert!(normalize_schedule(&json!({"games": []})).is_empty());
        assert!(normalize_schedule(&json!({"message": "no games"})).is_empty());
    }

    #[test]
    fn detail_nested_or_flat_with_roster() {
        let nested = json!({
            "game": {
                "id": "g9",
                "home": {"id": "a", "players": [{"id": "p1"}, {"id": "p2"}]},
                "away": {"id": "b", "players": [{"id": "p3"}, {"id": "p1"}]}
            }
        });
        let d = normalize_detail(&nested);
        assert_eq!(d.game.id, "g9");
        assert_eq!(d.player_ids, vec!["p1", "p2", "p3"]);

        let flat = normalize_detail(&json!({"id": "g10", "players": [{"player_id": 42}]}));
        assert_eq!(flat.game.id, "g10");
        assert_eq!(flat.player_ids, vec!["42"]);
    }
}
