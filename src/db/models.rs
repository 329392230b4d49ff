//! Row types read back with `sqlx::query_as`.

use chrono::NaiveDate;
use tracing::warn;

use crate::scorer::{Aspect, EphemerisDay, ZodiacSign};

#[derive(Debug, sqlx::FromRow)]
pub struct EphemerisRow {
    pub date: String,
    pub moon_phase: f64,
    pub sun_sign: Option<String>,
    pub moon_sign: Option<String>,
    pub mercury_retrograde: i64,
    pub aspects: String,
}

impl EphemerisRow {
    /// `None` when the date column itself is unreadable. Unknown signs and
    /// aspect names are dropped.
    pub fn into_day(self) -> Option<EphemerisDay> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let aspects = match serde_json::from_str::<Vec<String>>(&self.aspects) {
            Ok(names) => names.iter().filter_map(|n| Aspect::parse(n)).collect(),
            Err(e) => {
                warn!(date = %self.date, "ephemeris aspects unreadable: {e}");
                Vec::new()
            }
        };
        Some(EphemerisDay {
            date,
            moon_phase: self.moon_phase,
            sun_sign: self.sun_sign.as_deref().and_then(ZodiacSign::parse),
            moon_sign: self.moon_sign.as_deref().and_then(ZodiacSign::parse),
            mercury_retrograde: self.mercury_retrograde != 0,
            aspects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(aspects: &str) -> EphemerisRow {
        EphemerisRow {
            date: "2024-07-21".to_string(),
            moon_phase: 0.5,
            sun_sign: Some("Cancer".to_string()),
            moon_sign: Some("not-a-sign".to_string()),
            mercury_retrograde: 1,
            aspects: aspects.to_string(),
        }
    }

    #[test]
    fn row_converts_to_day() {
        let day = row(r#"["trine", "quincunx", "Square"]"#).into_day().unwrap();
        assert_eq!(day.sun_sign, Some(ZodiacSign::Cancer));
        assert_eq!(day.moon_sign, None);
        assert!(day.mercury_retrograde);
        assert_eq!(day.aspects, vec![Aspect::Trine, Aspect::Square]);
    }

    #[test]
    fn bad_aspects_json_is_empty() {
        assert!(row("{oops").into_day().unwrap().aspects.is_empty());
    }
}
