//! Two independent bounded metrics per player. Both are pure and total.

pub mod impact;
pub mod influence;
pub mod zodiac;

use chrono::Utc;

use crate::types::{PlayerStat, ScoreRecord};

pub use impact::impact_score;
pub use influence::{influence_score, Aspect, EphemerisDay, InfluenceInputs};
pub use zodiac::ZodiacSign;

/// Score one player against the day's ephemeris (if any).
pub fn score_player(stat: &PlayerStat, day: Option<&EphemerisDay>) -> ScoreRecord {
    let inputs = InfluenceInputs::new(stat.birth_date, day);
    ScoreRecord {
        entity_id: stat.player_id.clone(),
        impact_score: impact_score(stat),
        influence_score: influence_score(&inputs),
        computed_at: Utc::now(),
    }
}
