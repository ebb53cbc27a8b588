//! Optional dates and date filters.
//!
//! An entry or schedule item without a date is a valid, storable record. When
//! ordering, `None` sorts strictly before every dated value, which is exactly
//! how `Option<NaiveDate>` already orders. Filters decide explicitly whether
//! undated records pass.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Compare two optional dates, treating `None` as infinitely long ago.
#[must_use]
pub fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    a.cmp(&b)
}

/// Last day of the given month.
///
/// Month numbers outside `1..=12` roll over into the neighbouring years, so
/// `month_end(2024, 13)` is `2025-01-31` and `month_end(2024, 0)` is `2023-12-31`.
///
/// ```
/// use tally_core::date::month_end;
/// use chrono::NaiveDate;
///
/// assert_eq!(month_end(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// assert_eq!(month_end(2024, 14), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
/// ```
#[must_use]
pub fn month_end(year: i32, month: i32) -> NaiveDate {
    let months = year * 12 + (month - 1);
    let (y, m) = (months.div_euclid(12), months.rem_euclid(12) as u32 + 1);
    let (ny, nm) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Normalize a date to the last day of its month.
#[must_use]
pub fn to_month_end(date: NaiveDate) -> NaiveDate {
    month_end(date.year(), date.month() as i32)
}

/// Add a number of months to a date, clamping the day to the target month.
#[must_use]
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let end = month_end(date.year(), date.month() as i32 + months);
    NaiveDate::from_ymd_opt(end.year(), end.month(), date.day().min(end.day())).unwrap_or(end)
}

/// Add a number of years to a date, clamping Feb 29 to Feb 28.
#[must_use]
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    add_months(date, years * 12)
}

/// Add a number of days to a date, saturating at the calendar bounds.
#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// A filter over optional dates.
///
/// Both bounds are inclusive. `nullable` decides whether undated values pass;
/// `null_only` restricts the filter to undated values alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateFilter {
    /// Only undated values pass (bounds and `nullable` are ignored).
    pub null_only: bool,
    /// Undated values pass.
    pub nullable: bool,
    /// Inclusive lower bound.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub end: Option<NaiveDate>,
}

impl DateFilter {
    /// A filter over `[start, end]`. Undated values pass only when there is no lower bound.
    #[must_use]
    pub const fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            null_only: false,
            nullable: start.is_none(),
            start,
            end,
        }
    }

    /// A filter that accepts everything, undated values included.
    #[must_use]
    pub const fn unconstrained() -> Self {
        Self::new(None, None)
    }

    /// A filter that accepts only undated values.
    #[must_use]
    pub const fn null_only() -> Self {
        Self {
            null_only: true,
            nullable: true,
            start: None,
            end: None,
        }
    }

    /// A filter over a single day.
    #[must_use]
    pub const fn day(date: NaiveDate) -> Self {
        Self::new(Some(date), Some(date))
    }

    /// Whether the filter accepts everything.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        !self.null_only && self.nullable && self.start.is_none() && self.end.is_none()
    }

    /// Whether an optional date passes the filter.
    #[must_use]
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.null_only {
            return date.is_none();
        }
        let Some(date) = date else {
            return self.nullable;
        };
        if self.start.is_some_and(|s| date < s) {
            return false;
        }
        if self.end.is_some_and(|e| date > e) {
            return false;
        }
        true
    }

    /// Whether a dated value lies before the lower bound but within the upper bound.
    ///
    /// These are the values that a collapsing update folds into undated entries.
    #[must_use]
    pub fn precedes(&self, date: NaiveDate) -> bool {
        !self.null_only
            && self.start.is_some_and(|s| date < s)
            && self.end.map_or(true, |e| date <= e)
    }
}

impl Default for DateFilter {
    fn default() -> Self {
        Self::unconstrained()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_undated_sorts_first() {
        assert_eq!(compare_dates(None, Some(date(1900, 1, 1))), Ordering::Less);
        assert_eq!(compare_dates(Some(date(1900, 1, 1)), None), Ordering::Greater);
        assert_eq!(compare_dates(None, None), Ordering::Equal);
    }

    #[test]
    fn test_month_end_rollover() {
        assert_eq!(month_end(2024, 1), date(2024, 1, 31));
        assert_eq!(month_end(2023, 2), date(2023, 2, 28));
        assert_eq!(month_end(2024, 13), date(2025, 1, 31));
        assert_eq!(month_end(2024, 0), date(2023, 12, 31));
        assert_eq!(month_end(2024, -11), date(2023, 1, 31));
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(add_months(date(2024, 3, 15), -3), date(2023, 12, 15));
        assert_eq!(add_years(date(2024, 2, 29), 1), date(2025, 2, 28));
    }

    #[test]
    fn test_filter_nullable_follows_start() {
        let open = DateFilter::new(None, Some(date(2024, 6, 30)));
        assert!(open.contains(None));
        assert!(open.contains(Some(date(2000, 1, 1))));
        assert!(!open.contains(Some(date(2024, 7, 1))));

        let bounded = DateFilter::new(Some(date(2024, 1, 1)), Some(date(2024, 6, 30)));
        assert!(!bounded.contains(None));
        assert!(bounded.contains(Some(date(2024, 1, 1))));
        assert!(bounded.contains(Some(date(2024, 6, 30))));
        assert!(!bounded.contains(Some(date(2023, 12, 31))));
    }

    #[test]
    fn test_null_only() {
        let f = DateFilter::null_only();
        assert!(f.contains(None));
        assert!(!f.contains(Some(date(2024, 1, 1))));
    }

    #[test]
    fn test_precedes() {
        let f = DateFilter::new(Some(date(2024, 3, 1)), Some(date(2024, 6, 30)));
        assert!(f.precedes(date(2024, 2, 29)));
        assert!(!f.precedes(date(2024, 3, 1)));
        assert!(!DateFilter::unconstrained().precedes(date(2024, 1, 1)));
    }
}
