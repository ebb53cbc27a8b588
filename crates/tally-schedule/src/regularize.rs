//! Schedule regularization.
//!
//! Regularizing normalizes item dates, sorts the schedule and recomputes every
//! running value from the top. It runs on every load and after every edit, so
//! it must be idempotent.

use rust_decimal::Decimal;
use std::mem;
use tally_core::amount;
use tally_core::date::to_month_end;
use tally_core::{Instrument, InstrumentParams, ItemKind, ScheduleItem};

/// Regularize an instrument's schedule in place.
///
/// Ignored instruments and instruments without a declared date or value are
/// left untouched.
pub fn regularize(instrument: &mut Instrument) {
    if instrument.ignored {
        return;
    }
    let (Some(date), Some(value)) = (instrument.date, instrument.value) else {
        return;
    };
    match instrument.params {
        InstrumentParams::Asset(_) => regularize_asset(&mut instrument.schedule, date, value),
        InstrumentParams::Amortization(_) => regularize_amortization(&mut instrument.schedule, value),
    }
}

fn sort_items(items: &mut [ScheduleItem]) {
    items.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.kind.priority().cmp(&b.kind.priority()))
    });
}

fn regularize_asset(schedule: &mut Vec<ScheduleItem>, date: chrono::NaiveDate, value: Decimal) {
    let mut items = mem::take(schedule);
    for item in &mut items {
        if matches!(
            item.kind,
            ItemKind::Depreciation { .. } | ItemKind::Devaluation { .. }
        ) {
            item.date = item.date.map(to_month_end);
        }
    }

    // The acquisition already heading the schedule keeps its slot.
    let mut acquisition = if items.first().is_some_and(ScheduleItem::is_acquisition) {
        Some(items.remove(0))
    } else {
        None
    };
    sort_items(&mut items);
    if acquisition.is_none() {
        // later acquisitions are additions, not the initial one
        acquisition = items
            .iter()
            .position(|i| i.is_acquisition() && i.date <= Some(date))
            .map(|p| items.remove(p));
    }
    let mut head = acquisition.unwrap_or_else(|| ScheduleItem::acquisition(Some(date), value));
    if !head.ignored {
        head.date = Some(date);
        head.kind = ItemKind::Acquisition { orig_value: value };
    }
    items.insert(0, head);

    let mut book_value = Decimal::ZERO;
    schedule.reserve(items.len());
    for mut item in items {
        match &mut item.kind {
            ItemKind::Acquisition { orig_value } => book_value += *orig_value,
            ItemKind::Depreciation { amount } | ItemKind::Amortization { amount } => {
                book_value -= *amount;
            }
            ItemKind::Devaluation { fair_value } => {
                if !item.ignored && !amount::is_positive(book_value - *fair_value) {
                    tracing::debug!(date = ?item.date, %fair_value, %book_value, "dropping devaluation");
                    continue;
                }
                book_value = *fair_value;
            }
            ItemKind::Disposition { net_value } => {
                if item.ignored {
                    book_value -= *net_value;
                } else {
                    *net_value = book_value;
                    book_value = Decimal::ZERO;
                }
            }
        }
        item.value = book_value;
        schedule.push(item);
    }
}

fn regularize_amortization(schedule: &mut [ScheduleItem], value: Decimal) {
    schedule.sort_by(|a, b| a.date.cmp(&b.date));
    let mut residue = value;
    for item in schedule {
        if let ItemKind::Amortization { amount } = item.kind {
            residue -= amount;
        }
        item.value = residue;
    }
}
