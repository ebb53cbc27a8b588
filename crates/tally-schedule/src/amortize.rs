//! Amortization schedules.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tally_core::date::{add_days, add_months, add_years, month_end, to_month_end};
use tally_core::{AmortizeInterval, Instrument, InstrumentParams, ItemKind, ScheduleItem};

use crate::error::ScheduleError;

/// Decimal places kept on an even step; the last step takes the rest.
const STEP_DP: u32 = 8;

/// The first amortization date on or after `date`.
#[must_use]
pub fn first_anchor(interval: AmortizeInterval, date: NaiveDate) -> NaiveDate {
    match interval {
        AmortizeInterval::EveryDay | AmortizeInterval::SameDayOfWeek => date,
        AmortizeInterval::SameDayOfYear => {
            if date.month() == 2 && date.day() == 29 {
                add_days(date, 1)
            } else {
                date
            }
        }
        AmortizeInterval::SameDayOfMonth => {
            if date.day() > 28 {
                month_end(date.year(), date.month() as i32 + 1)
                    .with_day(1)
                    .unwrap_or(date)
            } else {
                date
            }
        }
        AmortizeInterval::LastDayOfWeek => {
            let from_sunday = i64::from(date.weekday().num_days_from_sunday());
            add_days(date, (7 - from_sunday) % 7)
        }
        AmortizeInterval::LastDayOfMonth => to_month_end(date),
        AmortizeInterval::LastDayOfYear => month_end(date.year(), 12),
    }
}

/// The amortization date following the anchor `last`.
#[must_use]
pub fn next_anchor(interval: AmortizeInterval, last: NaiveDate) -> NaiveDate {
    match interval {
        AmortizeInterval::EveryDay => add_days(last, 1),
        AmortizeInterval::SameDayOfWeek | AmortizeInterval::LastDayOfWeek => add_days(last, 7),
        AmortizeInterval::SameDayOfMonth => add_months(last, 1),
        AmortizeInterval::LastDayOfMonth => month_end(last.year(), last.month() as i32 + 1),
        AmortizeInterval::SameDayOfYear => add_years(last, 1),
        AmortizeInterval::LastDayOfYear => month_end(last.year() + 1, 12),
    }
}

/// Anchor dates within `total_days` days from `start`; never empty.
#[must_use]
pub fn anchors(interval: AmortizeInterval, start: NaiveDate, total_days: u32) -> Vec<NaiveDate> {
    let end = add_days(start, i64::from(total_days) - 1);
    let mut cur = first_anchor(interval, start);
    let mut out = vec![cur];
    loop {
        cur = next_anchor(interval, cur);
        if cur > end {
            break;
        }
        out.push(cur);
    }
    out
}

/// Derive the amortization steps of an instrument.
///
/// The declared value is split evenly across the anchor dates, the last step
/// taking the rounding residue. Ignored steps are kept as they are and their
/// amounts come off the total first. Links and remarks of replaced steps are
/// carried over by date.
pub fn amortize(instrument: &mut Instrument) -> Result<(), ScheduleError> {
    let InstrumentParams::Amortization(params) = &instrument.params else {
        return Ok(());
    };
    let id = instrument.id.as_str();
    let start = instrument.date.ok_or_else(|| ScheduleError::missing(id, "date"))?;
    let value = instrument.value.ok_or_else(|| ScheduleError::missing(id, "value"))?;
    let total_days = params
        .total_days
        .ok_or_else(|| ScheduleError::missing(id, "total_days"))?;
    let interval = params
        .interval
        .ok_or_else(|| ScheduleError::missing(id, "interval"))?;

    let (fixed, old): (Vec<_>, Vec<_>) = instrument.schedule.drain(..).partition(|i| i.ignored);
    let fixed_total: Decimal = fixed
        .iter()
        .map(|i| match i.kind {
            ItemKind::Amortization { amount } => amount,
            _ => Decimal::ZERO,
        })
        .sum();
    let free: Vec<NaiveDate> = anchors(interval, start, total_days)
        .into_iter()
        .filter(|d| !fixed.iter().any(|i| i.date == Some(*d)))
        .collect();

    let mut schedule = fixed;
    if let Some(last) = free.len().checked_sub(1) {
        let remaining = value - fixed_total;
        let step = (remaining / Decimal::from(free.len()))
            .round_dp_with_strategy(STEP_DP, RoundingStrategy::ToZero);
        let mut residue = remaining;
        for (n, date) in free.into_iter().enumerate() {
            let amount = if n == last { residue } else { step };
            residue -= amount;
            let mut item = ScheduleItem::amortization(Some(date), amount);
            if let Some(prev) = old.iter().find(|i| i.date == Some(date)) {
                item.entry_id.clone_from(&prev.entry_id);
                item.remark.clone_from(&prev.remark);
            }
            schedule.push(item);
        }
    }
    tracing::debug!(id = %instrument.id, steps = schedule.len(), "amortized");
    instrument.schedule = schedule;
    Ok(())
}
