// Field access and coercion for loosely-typed records.
//
// All the "dirty" value handling lives here so aggregators can work with
// typed values and a single `Absent` failure channel.
use crate::error::Absent;
use crate::types::{Field, FieldKind, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Strings that coerce to `false` for flag fields (compared case-insensitively).
const FALSE_WORDS: [&str; 5] = ["false", "no", "n", "off", "null"];

/// Resolve `field` on `record` as the requested kind.
///
/// Flags never fail: a missing flag reads as `false`, so "never answered"
/// and "answered no" are indistinguishable here.
pub fn get(record: &Record, field: &str, kind: FieldKind) -> Result<Field, Absent> {
    match kind {
        FieldKind::Text => text(record, field).map(Field::Text),
        FieldKind::Number => number(record, field).map(Field::Number),
        FieldKind::Flag => Ok(Field::Flag(flag(record, field))),
        FieldKind::Date => date(record, field).map(Field::Date),
    }
}

/// Trimmed, non-empty text. Numbers and booleans are rendered as text.
pub fn text(record: &Record, field: &str) -> Result<String, Absent> {
    match record.get(field) {
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Err(Absent)
            } else {
                Ok(s.to_string())
            }
        }
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        _ => Err(Absent),
    }
}

/// Finite floating point value; never yields NaN or infinity.
pub fn number(record: &Record, field: &str) -> Result<f64, Absent> {
    let value = match record.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_f64_safe(Some(s)),
        _ => None,
    };
    value.filter(|v| v.is_finite()).ok_or(Absent)
}

pub fn flag(record: &Record, field: &str) -> bool {
    match record.get(field) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Some(Value::String(s)) => parse_flag(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}

pub fn date(record: &Record, field: &str) -> Result<NaiveDate, Absent> {
    match record.get(field) {
        Some(Value::String(s)) => parse_date_safe(Some(s)).ok_or(Absent),
        _ => Err(Absent),
    }
}

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues common in form input (thousands separators, spaces).
///
/// Values containing letters other than an exponent marker (`12e3`) are
/// rejected rather than partially parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || FALSE_WORDS.iter().any(|w| s.eq_ignore_ascii_case(w)) {
        return false;
    }
    match parse_f64_safe(Some(s)) {
        Some(v) => v != 0.0,
        None => true,
    }
}

/// Calendar date from the formats seen in stored records.
///
/// First tries a strict parse (`YYYY-MM-DD`, RFC 3339, ISO date-time). If that
/// fails the value is split on separators to recover at least year and month;
/// an unusable day collapses to the 1st.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    parse_calendar_date(s).or_else(|| recover_year_month(s))
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    // Keep the stored local date; no timezone conversion.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn recover_year_month(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s
        .split(|c: char| matches!(c, '-' | '/' | '.' | ' ' | 'T' | ','))
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 2 {
        return None;
    }
    let num = |p: &str| p.parse::<u32>().ok();

    let (year, month, day) = if parts[0].len() == 4 {
        // 2024-03-05, 2024/3, 2024-03-05 10:00:00+00
        let year = parts[0].parse::<i32>().ok()?;
        (year, num(parts[1])?, parts.get(2).and_then(|p| num(p)))
    } else if parts.len() >= 3 && parts[2].len() == 4 {
        // 05/03/2024 is month-first unless the first value cannot be a month.
        let year = parts[2].parse::<i32>().ok()?;
        let (first, second) = (num(parts[0])?, num(parts[1])?);
        if first <= 12 {
            (year, first, Some(second))
        } else {
            (year, second, Some(first))
        }
    } else if parts[1].len() == 4 {
        // 03/2024
        (parts[1].parse::<i32>().ok()?, num(parts[0])?, None)
    } else {
        return None;
    };

    let day = day
        .filter(|d| NaiveDate::from_ymd_opt(year, month, *d).is_some())
        .unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)
}
