//! Provider JSON → canonical `Game` / `TeamSide` / `PlayerStat`.
//!
//! Pure functions only. Malformed or partial input never errors; it
//! resolves field by field to defaults.

pub mod accessor;
pub mod game;
pub mod player;

pub use game::{normalize_detail, normalize_schedule};
pub use player::normalize_player;

/// Wrong-typed leaves seen where a number or date belongs, with the count
/// each should resolve to.
#[cfg(test)]
pub(crate) fn hostile_leaves() -> Vec<(serde_json::Value, Option<u32>)> {
    use serde_json::json;
    vec![
        (json!([1]), None),
        (json!(true), None),
        (json!(null), None),
        (json!({}), None),
        (json!(-5), Some(0)),
        (json!("-0.4"), Some(0)),
        (json!(1e300), Some(u32::MAX)),
        (json!(f64::MAX), Some(u32::MAX)),
        (json!(u64::MAX), Some(u32::MAX)),
        (json!("1e400"), None),
        (json!("NaN"), None),
        (json!("日本語"), None),
        (json!("2024-07-0日"), None),
        (json!("２０２４-０７-０４"), None),
    ]
}
