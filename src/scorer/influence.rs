use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::scorer::impact::clamp_round;
use crate::scorer::zodiac::ZodiacSign;

pub const INFLUENCE_MIN: i64 = -100;
pub const INFLUENCE_MAX: i64 = 100;
pub const INFLUENCE_NEUTRAL: i64 = 0;

const ELEMENT_WEIGHT: f64 = 15.0;
const SOLAR_RETURN_BONUS: f64 = 10.0;
const MOON_PHASE_WEIGHT: f64 = 20.0;
const MERCURY_RETROGRADE_PENALTY: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl Aspect {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "conjunction" => Some(Aspect::Conjunction),
            "sextile" => Some(Aspect::Sextile),
            "square" => Some(Aspect::Square),
            "trine" => Some(Aspect::Trine),
            "opposition" => Some(Aspect::Opposition),
            _ => None,
        }
    }

    fn weight(self) -> f64 {
        match self {
            Aspect::Conjunction => 10.0,
            Aspect::Trine => 8.0,
            Aspect::Sextile => 5.0,
            Aspect::Square => -8.0,
            Aspect::Opposition => -10.0,
        }
    }
}

/// One day of ephemeris data, as supplied by the ephemeris collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisDay {
    pub date: NaiveDate,
    /// Fraction of the lunar cycle: 0 new, 0.5 full.
    pub moon_phase: f64,
    pub sun_sign: Option<ZodiacSign>,
    pub moon_sign: Option<ZodiacSign>,
    pub mercury_retrograde: bool,
    #[serde(default)]
    pub aspects: Vec<Aspect>,
}

/// Opaque inputs to the influence score. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfluenceInputs {
    pub subject_sign: Option<ZodiacSign>,
    pub sun_sign: Option<ZodiacSign>,
    pub moon_sign: Option<ZodiacSign>,
    pub moon_phase: Option<f64>,
    pub mercury_retrograde: Option<bool>,
    pub aspects: Vec<Aspect>,
}

impl InfluenceInputs {
    pub fn new(birth_date: Option<NaiveDate>, day: Option<&EphemerisDay>) -> Self {
        Self {
            subject_sign: birth_date.map(ZodiacSign::from_birth_date),
            sun_sign: day.and_then(|d| d.sun_sign),
            moon_sign: day.and_then(|d| d.moon_sign),
            moon_phase: day.map(|d| d.moon_phase),
            mercury_retrograde: day.map(|d| d.mercury_retrograde),
            aspects: day.map(|d| d.aspects.clone()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InfluenceError {
    #[error("moon phase is not a finite number: {0}")]
    MoonPhase(f64),
    #[error("influence sum is not finite")]
    NonFinite,
}

/// Astrology-derived score in `[-100, 100]`. Any calculation error yields 0.
pub fn influence_score(inputs: &InfluenceInputs) -> i64 {
    match raw_influence(inputs) {
        Ok(total) => clamp_round(total, INFLUENCE_MIN, INFLUENCE_MAX),
        Err(e) => {
            debug!("influence falls back to neutral: {e}");
            INFLUENCE_NEUTRAL
        }
    }
}

fn raw_influence(inputs: &InfluenceInputs) -> Result<f64, InfluenceError> {
    let mut total = 0.0;

    if let (Some(subject), Some(moon)) = (inputs.subject_sign, inputs.moon_sign) {
        total += f64::from(subject.element().harmony(moon.element())) * ELEMENT_WEIGHT;
    }
    if inputs.subject_sign.is_some() && inputs.subject_sign == inputs.sun_sign {
        total += SOLAR_RETURN_BONUS;
    }
    if let Some(phase) = inputs.moon_phase {
        if !phase.is_finite() {
            return Err(InfluenceError::MoonPhase(phase));
        }
        // Full moon +weight, new moon -weight.
        let angle = phase.rem_euclid(1.0) * std::f64::consts::TAU;
        total += -angle.cos() * MOON_PHASE_WEIGHT;
    }
    if inputs.mercury_retrograde == Some(true) {
        total -= MERCURY_RETROGRADE_PENALTY;
    }
    total += inputs.aspects.iter().map(|a| a.weight()).sum::<f64>();

    if total.is_finite() {
        Ok(total)
    } else {
        Err(InfluenceError::NonFinite)
    }
}
