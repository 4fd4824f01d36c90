//! Calendar bucketing of a date field by day, ISO week or month.
//!
//! Labels are always returned in chronological order, never lexicographic.

use crate::accessor;
use crate::types::{Granularity, Record, SummaryResult, Tally};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

/// Month names used for labels; fixed so output does not depend on locale.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Bucket key for one date. The derived ordering is chronological within a
/// granularity: weeks and months compare by year first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Day(NaiveDate),
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl PeriodKey {
    pub fn of(date: NaiveDate, granularity: Granularity) -> Option<PeriodKey> {
        match granularity {
            Granularity::Day => Some(PeriodKey::Day(date)),
            Granularity::IsoWeek => {
                let (year, week) = iso_week(date)?;
                Some(PeriodKey::Week { year, week })
            }
            Granularity::Month => Some(PeriodKey::Month {
                year: date.year(),
                month: date.month(),
            }),
        }
    }

    pub fn label(&self) -> String {
        match self {
            PeriodKey::Day(date) => date.format("%Y-%m-%d").to_string(),
            PeriodKey::Week { year, week } => format!("Week {}, {}", week, year),
            PeriodKey::Month { year, month } => {
                let name = MONTH_NAMES
                    .get(month.saturating_sub(1) as usize)
                    .copied()
                    .unwrap_or("Unknown");
                format!("{} {}", name, year)
            }
        }
    }
}

/// ISO-8601 `(year, week)` for a date.
///
/// The date is moved to the Thursday of its week (Sunday counts as day 7);
/// that Thursday's calendar year is the week's year, and the week number is
/// `ceil(ordinal / 7)` where the ordinal is days since Jan 1 plus one.
/// Returns `None` only when the shift leaves chrono's representable range.
pub fn iso_week(date: NaiveDate) -> Option<(i32, u32)> {
    let weekday = i64::from(date.weekday().number_from_monday());
    let thursday = date.checked_add_signed(Duration::days(4 - weekday))?;
    let week = (thursday.ordinal() + 6) / 7;
    Some((thursday.year(), week))
}

/// Count records per calendar period of `field`. Records with an
/// unparsable date are excluded and counted nowhere.
pub fn aggregate(
    records: &[Record],
    name: &str,
    field: &str,
    granularity: Granularity,
) -> SummaryResult {
    let mut periods: BTreeMap<PeriodKey, usize> = BTreeMap::new();
    let mut total = 0usize;
    let mut excluded = 0usize;

    for record in records {
        let key = accessor::date(record, field)
            .ok()
            .and_then(|date| PeriodKey::of(date, granularity));
        match key {
            Some(key) => {
                *periods.entry(key).or_insert(0) += 1;
                total += 1;
            }
            None => excluded += 1,
        }
    }

    let mut tally = Tally::discover();
    for (key, count) in periods {
        tally.add(&key.label(), count);
    }
    tally.into_result(name, total, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dated(field: &str, dates: &[&str]) -> Vec<Record> {
        dates
            .iter()
            .map(|d| {
                let mut record = Record::new();
                record.insert(field.to_string(), Value::String(d.to_string()));
                record
            })
            .collect()
    }

    #[test]
    fn test_iso_week_year_boundaries() {
        // Wednesday
        assert_eq!(iso_week(ymd(2025, 1, 1)), Some((2025, 1)));
        // Monday that belongs to the next ISO year
        assert_eq!(iso_week(ymd(2024, 12, 30)), Some((2025, 1)));
        // Friday that belongs to the previous ISO year
        assert_eq!(iso_week(ymd(2021, 1, 1)), Some((2020, 53)));
        // Sunday closing week 52
        assert_eq!(iso_week(ymd(2023, 1, 1)), Some((2022, 52)));
        assert_eq!(iso_week(ymd(2026, 12, 31)), Some((2026, 53)));
    }

    #[test]
    fn test_iso_week_matches_chrono_over_several_years() {
        let mut date = ymd(2019, 12, 20);
        let end = ymd(2027, 1, 10);
        while date <= end {
            let iso = date.iso_week();
            assert_eq!(iso_week(date), Some((iso.year(), iso.week())), "{}", date);
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_month_labels_sorted_chronologically() {
        let data = dated(
            "date_of_registration",
            &["2025-03-10", "2024-12-01", "2025-01-15", "2025-03-02", "2024-11-30"],
        );
        let result = aggregate(&data, "monthly", "date_of_registration", Granularity::Month);
        assert_eq!(
            result.labels,
            vec!["November 2024", "December 2024", "January 2025", "March 2025"]
        );
        assert_eq!(result.count("March 2025"), 2);
        assert_eq!(result.peak_label.as_deref(), Some("March 2025"));
    }

    #[test]
    fn test_week_labels_sorted_by_year_then_week() {
        let data = dated(
            "enquiry_date",
            &["2025-01-08", "2024-12-30", "2024-12-20", "2025-01-01"],
        );
        let result = aggregate(&data, "timeline", "enquiry_date", Granularity::IsoWeek);
        assert_eq!(result.labels, vec!["Week 51, 2024", "Week 1, 2025", "Week 2, 2025"]);
        assert_eq!(result.count("Week 1, 2025"), 2);
    }

    #[test]
    fn test_day_labels_not_lexicographic() {
        let data = dated("d", &["2025-01-10", "2025-01-09", "2024-12-31", "05/01/2025"]);
        let result = aggregate(&data, "daily", "d", Granularity::Day);
        assert_eq!(
            result.labels,
            vec!["2024-12-31", "2025-01-09", "2025-01-10", "2025-05-01"]
        );
    }

    #[test]
    fn test_peak_tie_uses_chronological_order() {
        let data = dated("d", &["2025-05-01", "2025-05-02", "2025-02-01", "2025-02-03"]);
        let result = aggregate(&data, "monthly", "d", Granularity::Month);
        assert_eq!(result.labels, vec!["February 2025", "May 2025"]);
        assert_eq!(result.peak_label.as_deref(), Some("February 2025"));
    }

    #[test]
    fn test_unparsable_dates_are_excluded() {
        let mut data = dated("d", &["2025-01-01", "not a date", ""]);
        data.push(serde_json::Map::new());
        let result = aggregate(&data, "daily", "d", Granularity::Day);
        assert_eq!(result.total, 1);
        assert_eq!(result.excluded, 3);
        assert_eq!(result.counts.values().sum::<usize>(), 1);
    }
}
