use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

impl Element {
    /// +1 same or complementary element, -1 clashing, 0 neutral.
    pub fn harmony(self, other: Element) -> i8 {
        use Element::*;
        match (self, other) {
            (a, b) if a == b => 1,
            (Fire, Air) | (Air, Fire) | (Earth, Water) | (Water, Earth) => 1,
            (Fire, Water) | (Water, Fire) | (Earth, Air) | (Air, Earth) => -1,
            _ => 0,
        }
    }
}

const ALL: [ZodiacSign; 12] = [
    ZodiacSign::Aries,
    ZodiacSign::Taurus,
    ZodiacSign::Gemini,
    ZodiacSign::Cancer,
    ZodiacSign::Leo,
    ZodiacSign::Virgo,
    ZodiacSign::Libra,
    ZodiacSign::Scorpio,
    ZodiacSign::Sagittarius,
    ZodiacSign::Capricorn,
    ZodiacSign::Aquarius,
    ZodiacSign::Pisces,
];

/// (month, first day) each sign begins, in calendar order from Capricorn's
/// January tail.
const CUSPS: [(u32, u32, ZodiacSign); 12] = [
    (1, 20, ZodiacSign::Aquarius),
    (2, 19, ZodiacSign::Pisces),
    (3, 21, ZodiacSign::Aries),
    (4, 20, ZodiacSign::Taurus),
    (5, 21, ZodiacSign::Gemini),
    (6, 21, ZodiacSign::Cancer),
    (7, 23, ZodiacSign::Leo),
    (8, 23, ZodiacSign::Virgo),
    (9, 23, ZodiacSign::Libra),
    (10, 23, ZodiacSign::Scorpio),
    (11, 22, ZodiacSign::Sagittarius),
    (12, 22, ZodiacSign::Capricorn),
];

impl ZodiacSign {
    pub fn element(self) -> Element {
        use ZodiacSign::*;
        match self {
            Aries | Leo | Sagittarius => Element::Fire,
            Taurus | Virgo | Capricorn => Element::Earth,
            Gemini | Libra | Aquarius => Element::Air,
            Cancer | Scorpio | Pisces => Element::Water,
        }
    }

    /// Case-insensitive English name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        ALL.iter().copied().find(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        use ZodiacSign::*;
        match self {
            Aries => "aries",
            Taurus => "taurus",
            Gemini => "gemini",
            Cancer => "cancer",
            Leo => "leo",
            Virgo => "virgo",
            Libra => "libra",
            Scorpio => "scorpio",
            Sagittarius => "sagittarius",
            Capricorn => "capricorn",
            Aquarius => "aquarius",
            Pisces => "pisces",
        }
    }

    /// Tropical sun sign for a birth date.
    pub fn from_birth_date(date: NaiveDate) -> Self {
        let md = (date.month(), date.day());
        CUSPS
            .iter()
            .rev()
            .find(|(m, d, _)| md >= (*m, *d))
            .map(|(_, _, sign)| *sign)
            .unwrap_or(ZodiacSign::Capricorn)
    }
}

impl std::fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, m, day).unwrap()
    }

    #[test]
    fn cusp_boundaries() {
        assert_eq!(ZodiacSign::from_birth_date(d(1, 1)), ZodiacSign::Capricorn);
        assert_eq!(ZodiacSign::from_birth_date(d(1, 19)), ZodiacSign::Capricorn);
        assert_eq!(ZodiacSign::from_birth_date(d(1, 20)), ZodiacSign::Aquarius);
        assert_eq!(ZodiacSign::from_birth_date(d(3, 20)), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_birth_date(d(3, 21)), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_birth_date(d(7, 5)), ZodiacSign::Cancer);
        assert_eq!(ZodiacSign::from_birth_date(d(12, 21)), ZodiacSign::Sagittarius);
        assert_eq!(ZodiacSign::from_birth_date(d(12, 31)), ZodiacSign::Capricorn);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ZodiacSign::parse(" Leo "), Some(ZodiacSign::Leo));
        assert_eq!(ZodiacSign::parse("SAGITTARIUS"), Some(ZodiacSign::Sagittarius));
        assert_eq!(ZodiacSign::parse("ophiuchus"), None);
    }

    #[test]
    fn element_harmony() {
        assert_eq!(ZodiacSign::Aries.element().harmony(ZodiacSign::Leo.element()), 1);
        assert_eq!(ZodiacSign::Aries.element().harmony(ZodiacSign::Gemini.element()), 1);
        assert_eq!(ZodiacSign::Aries.element().harmony(ZodiacSign::Cancer.element()), -1);
        assert_eq!(ZodiacSign::Aries.element().harmony(ZodiacSign::Taurus.element()), 0);
    }
}
