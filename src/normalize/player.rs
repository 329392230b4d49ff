use serde_json::Value;

use crate::normalize::accessor::{as_count, as_date, as_ratio, as_text, first, resolve, Accessor, Accessor::Path};
use crate::types::{PlayerStat, UNKNOWN_ID, UNKNOWN_NAME};

const PLAYER_ROOT: &[Accessor] = &[Path("player"), Path("person"), Path("athlete")];

const PLAYER_ID: &[Accessor] = &[Path("id"), Path("player_id"), Path("playerId"), Path("PlayerID")];
const FULL_NAME: &[Accessor] = &[
    Path("full_name"),
    Path("fullName"),
    Path("displayName"),
    Path("name"),
];
const FIRST_NAME: &[Accessor] = &[Path("first_name"), Path("firstName"), Path("FirstName")];
const LAST_NAME: &[Accessor] = &[Path("last_name"), Path("lastName"), Path("LastName")];
const TEAM_ID: &[Accessor] = &[
    Path("team.id"),
    Path("team_id"),
    Path("teamId"),
    Path("TeamID"),
    Path("currentTeam.id"),
    Path("seasons.0.teams.0.id"),
];
const BIRTH_DATE: &[Accessor] = &[
    Path("birthdate"),
    Path("birth_date"),
    Path("BirthDate"),
    Path("birthDate"),
    Path("dateOfBirth"),
];

/// Where the season stat block lives. The player object itself is tried last
/// for flat feeds.
const STAT_ROOTS: &[Accessor] = &[
    Path("seasons.0.teams.0.statistics"),
    Path("seasons.0.totals.statistics"),
    Path("statistics"),
    Path("stats"),
    Path("season.statistics"),
];

const GAMES_PLAYED: &[Accessor] = &[
    Path("games_played"),
    Path("gp"),
    Path("gamesPlayed"),
    Path("Games"),
    Path("hitting.overall.games.play"),
    Path("games.played"),
    Path("games"),
];
const AT_BATS: &[Accessor] = &[Path("at_bats"), Path("ab"), Path("atBats"), Path("AtBats"), Path("hitting.overall.ab")];
const HITS: &[Accessor] = &[Path("hits"), Path("h"), Path("Hits"), Path("hitting.overall.onbase.h")];
const HOME_RUNS: &[Accessor] = &[
    Path("home_runs"),
    Path("hr"),
    Path("homeRuns"),
    Path("HomeRuns"),
    Path("hitting.overall.onbase.hr"),
];
const RBI: &[Accessor] = &[
    Path("rbi"),
    Path("RBI"),
    Path("runs_batted_in"),
    Path("RunsBattedIn"),
    Path("hitting.overall.rbi"),
];
const STOLEN_BASES: &[Accessor] = &[
    Path("stolen_bases"),
    Path("sb"),
    Path("stolenBases"),
    Path("StolenBases"),
    Path("hitting.overall.steal.stolen"),
];
const BATTING_AVERAGE: &[Accessor] = &[
    Path("batting_average"),
    Path("avg"),
    Path("battingAverage"),
    Path("BattingAverage"),
    Path("hitting.overall.avg"),
];
const STRIKEOUTS: &[Accessor] = &[
    Path("strikeouts"),
    Path("so"),
    Path("strikeOuts"),
    Path("PitchingStrikeouts"),
    Path("pitching.overall.outs.ktotal"),
];
const ERA: &[Accessor] = &[
    Path("era"),
    Path("ERA"),
    Path("earned_run_average"),
    Path("EarnedRunAverage"),
    Path("pitching.overall.era"),
];
const POINTS: &[Accessor] = &[Path("points"), Path("pts"), Path("Points"), Path("points.total")];
const ASSISTS: &[Accessor] = &[Path("assists"), Path("ast"), Path("Assists"), Path("assists.total")];
const REBOUNDS: &[Accessor] = &[Path("rebounds"), Path("reb"), Path("Rebounds"), Path("rebounds.total")];
const FIELD_GOAL_PCT: &[Accessor] = &[
    Path("field_goal_pct"),
    Path("fg_pct"),
    Path("fieldGoalPct"),
    Path("fieldGoals.percentage"),
    Path("FieldGoalsPercentage"),
];

/// A player profile or season line. Total: any JSON value yields a `PlayerStat`.
pub fn normalize_player(raw: &Value) -> PlayerStat {
    let root = first(raw, PLAYER_ROOT).filter(|p| p.is_object()).unwrap_or(raw);

    // Stat blocks first, then the player object for flat feeds.
    let mut stat_roots: Vec<&Value> = STAT_ROOTS
        .iter()
        .filter_map(|a| a.get(root))
        .filter(|v| v.is_object())
        .collect();
    stat_roots.push(root);

    let count = |acc: &[Accessor]| resolve(&stat_roots, acc, as_count).unwrap_or(0);
    let ratio = |acc: &[Accessor]| resolve(&stat_roots, acc, as_ratio).unwrap_or(0.0);

    PlayerStat {
        player_id: resolve(&[root], PLAYER_ID, as_text).unwrap_or_else(|| UNKNOWN_ID.to_string()),
        full_name: full_name(root),
        team_id: resolve(&[root], TEAM_ID, as_text).unwrap_or_else(|| UNKNOWN_ID.to_string()),
        birth_date: resolve(&[root], BIRTH_DATE, as_date),
        games_played: count(GAMES_PLAYED),
        at_bats: count(AT_BATS),
        hits: count(HITS),
        home_runs: count(HOME_RUNS),
        rbi: count(RBI),
        stolen_bases: count(STOLEN_BASES),
        batting_average: ratio(BATTING_AVERAGE),
        strikeouts: count(STRIKEOUTS),
        era: ratio(ERA),
        points: count(POINTS),
        assists: count(ASSISTS),
        rebounds: count(REBOUNDS),
        field_goal_pct: as_fraction(ratio(FIELD_GOAL_PCT)),
    }
}

fn full_name(root: &Value) -> String {
    if let Some(name) = resolve(&[root], FULL_NAME, as_text) {
        return name;
    }
    let parts: Vec<String> = [FIRST_NAME, LAST_NAME]
        .iter()
        .filter_map(|acc| resolve(&[root], acc, as_text))
        .collect();
    if parts.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        parts.join(" ")
    }
}

/// Percentages above 1 are taken as 0-100 and scaled down.
fn as_fraction(pct: f64) -> f64 {
    if pct > 1.0 {
        (pct / 100.0).min(1.0)
    } else {
        pct
    }
}
