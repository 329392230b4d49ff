use std::fmt::Write as _;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Deterministic cache key for one logical request. Doubles as the file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn schedule(date: NaiveDate) -> Self {
        Self(format!("schedule_{}", date.format("%Y-%m-%d")))
    }

    pub fn game(id: &str) -> Self {
        Self(format!("game_{}", sanitize(id)))
    }

    pub fn player(id: &str) -> Self {
        Self(format!("player_{}", sanitize(id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ids come from upstream; keep them from escaping the cache root. When
/// anything had to be replaced, a short digest of the raw id keeps distinct
/// ids (`a.b`, `a/b`, `a_b`) on distinct files.
fn sanitize(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned == id && !cleaned.is_empty() {
        return cleaned;
    }
    let trimmed = cleaned.trim_matches('_');
    let stem = if trimmed.is_empty() { "unknown" } else { trimmed };
    format!("{stem}_{}", short_digest(id))
}

fn short_digest(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
