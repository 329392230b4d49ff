use chrono::{Datelike, NaiveDate};

use crate::cache::Fingerprint;
use crate::fetcher::Endpoint;
use crate::normalize::{normalize_detail, normalize_player, normalize_schedule};
use crate::types::{Game, GameDetail, PlayerStat, RawPayload};

/// `games/{YYYY}/{MM}/{DD}/schedule.json`
pub struct Schedule;

impl Endpoint for Schedule {
    type Key = NaiveDate;
    type Output = Vec<Game>;
    const KIND: &'static str = "schedule";

    fn path(date: &NaiveDate) -> String {
        format!("games/{:04}/{:02}/{:02}/schedule.json", date.year(), date.month(), date.day())
    }

    fn fingerprint(date: &NaiveDate) -> Fingerprint {
        Fingerprint::schedule(*date)
    }

    fn normalize(raw: &RawPayload) -> Vec<Game> {
        normalize_schedule(raw)
    }
}

/// `games/{id}/summary.json`
pub struct GameSummary;

impl Endpoint for GameSummary {
    type Key = str;
    type Output = GameDetail;
    const KIND: &'static str = "game";

    fn path(id: &str) -> String {
        format!("games/{}/summary.json", urlencoding::encode(id))
    }

    fn fingerprint(id: &str) -> Fingerprint {
        Fingerprint::game(id)
    }

    fn normalize(raw: &RawPayload) -> GameDetail {
        normalize_detail(raw)
    }
}

/// `players/{id}/profile.json`
pub struct PlayerProfile;

impl Endpoint for PlayerProfile {
    type Key = str;
    type Output = PlayerStat;
    const KIND: &'static str = "player";

    fn path(id: &str) -> String {
        format!("players/{}/profile.json", urlencoding::encode(id))
    }

    fn fingerprint(id: &str) -> Fingerprint {
        Fingerprint::player(id)
    }

    fn normalize(raw: &RawPayload) -> PlayerStat {
        normalize_player(raw)
    }
}
