//! Book value lookups over a regularized schedule.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::Instrument;

/// Book value (or amortization residue) of an instrument on a date.
///
/// Returns `None` before the declared date, and for undated instruments.
/// Passing `None` looks only at undated items. The schedule must be
/// regularized.
#[must_use]
pub fn book_value_on(instrument: &Instrument, date: Option<NaiveDate>) -> Option<Decimal> {
    let declared = instrument.date?;
    if date.is_some_and(|d| d < declared) {
        return None;
    }
    instrument
        .schedule
        .iter()
        .take_while(|i| i.date <= date)
        .last()
        .map(|i| i.value)
        .or(instrument.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recompute;
    use rust_decimal_macros::dec;
    use tally_core::{AmortParams, AmortizeInterval, EntryKind, EntryTemplate};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_residue_on_dates() {
        let mut rent = Instrument::amortization(
            "r1",
            "Prepaid rent",
            date(2024, 1, 1),
            dec!(1200),
            AmortParams {
                total_days: Some(360),
                interval: Some(AmortizeInterval::SameDayOfMonth),
                template: EntryTemplate::new(EntryKind::Amortization),
            },
        );
        recompute(&mut rent).unwrap();
        assert_eq!(book_value_on(&rent, Some(date(2023, 12, 31))), None);
        assert_eq!(book_value_on(&rent, Some(date(2024, 1, 1))), Some(dec!(1100)));
        assert_eq!(book_value_on(&rent, Some(date(2024, 3, 15))), Some(dec!(900)));
        assert_eq!(book_value_on(&rent, Some(date(2030, 1, 1))), Some(dec!(0)));
        assert_eq!(book_value_on(&rent, None), Some(dec!(1200)));
    }
}
