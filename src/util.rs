// Formatting helpers for console output and derived statistics.
use num_format::{Locale, ToFormattedString};

/// Share of `part` in `whole` as a percentage; 0 when `whole` is 0 so the
/// caller never sees a NaN.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// `40.0%` style rendering used by breakdown lines and the overview table.
pub fn format_share(pct: f64) -> String {
    format!("{:.1}%", pct)
}

/// Thousands-separated integers for console messages (`9,855 rows loaded`).
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Lowercase file-name slug for a section title.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('_');
            last_dash = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("section");
    }
    out
}
