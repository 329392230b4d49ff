//! Ordered field lookup over untyped provider JSON.
//!
//! Every canonical field is described by a slice of `Accessor`s tried in
//! order; the first one that yields a convertible value wins, otherwise the
//! field's default applies. Nothing here can fail.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

#[derive(Clone, Copy)]
pub enum Accessor {
    /// Dotted path. Numeric segments index into arrays: `"seasons.0.totals"`.
    Path(&'static str),
    /// Arbitrary lookup for shapes a path can't express (e.g. "the element
    /// whose `homeAway` is `home`").
    With(fn(&Value) -> Option<&Value>),
}

impl Accessor {
    /// `None` for missing keys and explicit `null`s alike.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let found = match self {
            Accessor::Path(path) => lookup(root, path),
            Accessor::With(f) => f(root),
        };
        found.filter(|v| !v.is_null())
    }
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accessor::Path(p) => write!(f, "Path({p:?})"),
            Accessor::With(_) => f.write_str("With(..)"),
        }
    }
}

pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, seg| match node {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// The node itself. Used for arrays of bare numbers.
pub fn itself(v: &Value) -> Option<&Value> {
    Some(v)
}

/// First value any accessor yields on any root that `conv` accepts.
pub fn resolve<T>(roots: &[&Value], accessors: &[Accessor], conv: fn(&Value) -> Option<T>) -> Option<T> {
    roots
        .iter()
        .flat_map(|root| accessors.iter().filter_map(move |a| a.get(root)))
        .find_map(conv)
}

/// First non-null node (any type).
pub fn first<'a>(root: &'a Value, accessors: &[Accessor]) -> Option<&'a Value> {
    accessors.iter().find_map(|a| a.get(root))
}

// ---------------------------------------------------------------------------
// Converters
// ---------------------------------------------------------------------------

/// Non-negative whole number. Accepts numbers and numeric strings; rounds
/// fractions, floors negatives at 0, saturates at `u32::MAX`.
pub fn as_count(v: &Value) -> Option<u32> {
    let n = as_number(v)?;
    Some(n.round().clamp(0.0, u32::MAX as f64) as u32)
}

/// Non-negative finite float (averages, ERA, percentages).
pub fn as_ratio(v: &Value) -> Option<f64> {
    as_number(v).map(|n| n.max(0.0))
}

fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Non-blank text. Numbers are accepted so numeric ids come through.
pub fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
pub fn as_date_time(v: &Value) -> Option<DateTime<Utc>> {
    let s = v.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD`, ignoring any time suffix.
pub fn as_date(v: &Value) -> Option<NaiveDate> {
    let s = v.as_str()?.trim();
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Single-root shorthands
// ---------------------------------------------------------------------------

pub fn text(root: &Value, accessors: &[Accessor], default: &str) -> String {
    resolve(&[root], accessors, as_text).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_walk_objects_and_arrays() {
        let v = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(lookup(&v, "a.b.1.c"), Some(&json!(2)));
        assert_eq!(lookup(&v, "a.b.x"), None);
        assert_eq!(lookup(&v, "a.b.9.c"), None);
        assert_eq!(lookup(&json!(7), "a"), None);
    }

    #[test]
    fn first_convertible_value_wins() {
        let v = json!({"runs": null, "score": "n/a", "r": "4"});
        let acc = [Accessor::Path("runs"), Accessor::Path("score"), Accessor::Path("r")];
        assert_eq!(resolve(&[&v], &acc, as_count), Some(4));
        assert_eq!(resolve(&[&json!({})], &acc, as_count), None);
    }

    #[test]
    fn counts_are_whole_and_non_negative() {
        assert_eq!(as_count(&json!(2.6)), Some(3));
        assert_eq!(as_count(&json!(-5)), Some(0));
        assert_eq!(as_count(&json!(" 12 ")), Some(12));
        assert_eq!(as_count(&json!(true)), None);
        assert_eq!(as_count(&json!({"total": 3})), None);
    }

    #[test]
    fn ratios_accept_baseball_style_strings() {
        assert_eq!(as_ratio(&json!(".312")), Some(0.312));
        assert_eq!(as_ratio(&json!("47.5%")), Some(47.5));
        assert_eq!(as_ratio(&json!("NaN")), None);
    }

    #[test]
    fn text_rejects_blank_and_accepts_numeric_ids() {
        assert_eq!(as_text(&json!("  ")), None);
        assert_eq!(as_text(&json!(12345)), Some("12345".to_string()));
        assert_eq!(text(&json!({}), &[Accessor::Path("name")], "Unknown"), "Unknown");
    }

    #[test]
    fn with_accessor_runs_custom_lookup() {
        fn second(v: &Value) -> Option<&Value> {
            v.as_array()?.get(1)
        }
        let v = json!([10, 20]);
        assert_eq!(resolve(&[&v], &[Accessor::With(second)], as_count), Some(20));
    }

    #[test]
    fn timestamps_in_common_layouts() {
        let a = as_date_time(&json!("2024-07-04T18:05:00+00:00")).unwrap();
        let b = as_date_time(&json!("2024-07-04T18:05:00")).unwrap();
        assert_eq!(a, b);
        assert_eq!(as_date(&json!("1990-03-21T00:00:00")), NaiveDate::from_ymd_opt(1990, 3, 21));
        assert_eq!(as_date(&json!("soon")), None);
    }
}
