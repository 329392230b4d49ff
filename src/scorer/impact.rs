use crate::types::PlayerStat;

pub const IMPACT_MIN: i64 = 0;
pub const IMPACT_MAX: i64 = 100;

// Sub-range caps. They sum to IMPACT_MAX so no single line dominates.
const VOLUME_MAX: f64 = 30.0;
const POWER_MAX: f64 = 20.0;
const SUPPORT_MAX: f64 = 20.0;
const EFFICIENCY_MAX: f64 = 20.0;
const PITCHING_MAX: f64 = 10.0;

/// Performance score in `[0, 100]` from a season line.
///
/// Baseball and basketball lines share one struct; each component takes the
/// better of the two sports' per-game rates against an elite benchmark, so a
/// field the feed doesn't carry simply contributes nothing.
pub fn impact_score(stat: &PlayerStat) -> i64 {
    // Zero games played would divide by zero; treat as one.
    let gp = f64::from(stat.games_played.max(1));
    let per_game = |n: u32| f64::from(n) / gp;

    let volume = scaled(
        ratio(per_game(stat.hits), 1.5).max(ratio(per_game(stat.points), 30.0)),
        VOLUME_MAX,
    );
    let power = scaled(
        ratio(per_game(stat.home_runs), 0.35).max(ratio(per_game(stat.rebounds), 12.0)),
        POWER_MAX,
    );
    let support = scaled(
        ratio(per_game(stat.rbi), 1.0)
            .max(ratio(per_game(stat.assists), 10.0))
            .max(ratio(per_game(stat.stolen_bases), 0.4)),
        SUPPORT_MAX,
    );
    let efficiency = scaled(
        ratio(stat.batting_average, 0.350).max(ratio(stat.field_goal_pct, 0.60)),
        EFFICIENCY_MAX,
    );
    let pitching = pitching_component(stat, per_game(stat.strikeouts));

    let total = volume + power + support + efficiency + pitching;
    clamp_round(total, IMPACT_MIN, IMPACT_MAX)
}

/// Half from run prevention, half from strikeouts. An ERA of 0 means "no
/// pitching line", not a perfect season.
fn pitching_component(stat: &PlayerStat, k_per_game: f64) -> f64 {
    let half = PITCHING_MAX / 2.0;
    let prevention = if finite(stat.era) > 0.0 {
        ((6.0 - stat.era) / 4.0).clamp(0.0, 1.0) * half
    } else {
        0.0
    };
    prevention + ratio(k_per_game, 6.0) * half
}

/// `value / benchmark` in `[0, 1]`; NaN and negatives are 0.
fn ratio(value: f64, benchmark: f64) -> f64 {
    (finite(value) / benchmark).clamp(0.0, 1.0)
}

fn scaled(fraction: f64, max: f64) -> f64 {
    fraction * max
}

pub(crate) fn finite(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

pub(crate) fn clamp_round(x: f64, min: i64, max: i64) -> i64 {
    (finite(x).round() as i64).clamp(min, max)
}
