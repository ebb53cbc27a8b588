//! Asset depreciation.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tally_core::amount;
use tally_core::date::month_end;
use tally_core::{AssetParams, DepreciationMethod, Instrument, InstrumentParams, ItemKind, ScheduleItem};

use crate::error::ScheduleError;
use crate::regularize::regularize;

/// Re-derive the depreciation items of an asset.
///
/// Non-ignored depreciation items are discarded and regenerated. The schedule
/// is regularized before and after.
pub fn depreciate(instrument: &mut Instrument) -> Result<(), ScheduleError> {
    let InstrumentParams::Asset(params) = &instrument.params else {
        return Ok(());
    };
    let params = params.clone();
    match params.method {
        DepreciationMethod::None => Ok(()),
        DepreciationMethod::StraightLine => straight_line(instrument, &params),
        DepreciationMethod::SumOfTheYear => sum_of_the_years(instrument, &params),
        method @ DepreciationMethod::DoubleDeclineMethod => Err(ScheduleError::NotSupported { method }),
    }
}

struct Plan {
    acquired: NaiveDate,
    months: u32,
    salvage: Decimal,
}

fn plan(instrument: &Instrument, params: &AssetParams) -> Result<Plan, ScheduleError> {
    let id = instrument.id.as_str();
    let acquired = instrument.date.ok_or_else(|| ScheduleError::missing(id, "date"))?;
    instrument.value.ok_or_else(|| ScheduleError::missing(id, "value"))?;
    let life = params.life.ok_or_else(|| ScheduleError::missing(id, "life"))?;
    Ok(Plan {
        acquired,
        months: life * 12,
        salvage: params.salvage.unwrap_or_default(),
    })
}

/// Month-end `n` months after the acquisition month.
fn nth_month_end(acquired: NaiveDate, n: u32) -> NaiveDate {
    month_end(acquired.year(), acquired.month() as i32 + n as i32)
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn drop_generated(instrument: &mut Instrument) {
    instrument
        .schedule
        .retain(|i| i.ignored || !matches!(i.kind, ItemKind::Depreciation { .. }));
}

/// Book value just before a depreciation on `date` would apply.
fn book_value_before(schedule: &[ScheduleItem], date: NaiveDate) -> Decimal {
    let depreciation = ItemKind::Depreciation {
        amount: Decimal::ZERO,
    }
    .priority();
    schedule
        .iter()
        .take_while(|i| {
            i.date < Some(date) || (i.date == Some(date) && i.kind.priority() < depreciation)
        })
        .last()
        .map_or(Decimal::ZERO, |i| i.value)
}

fn straight_line(instrument: &mut Instrument, params: &AssetParams) -> Result<(), ScheduleError> {
    let plan = plan(instrument, params)?;
    drop_generated(instrument);
    regularize(instrument);

    for m in 1..=plan.months {
        let month = nth_month_end(plan.acquired, m);
        let blocked = instrument.schedule.iter().any(|i| {
            i.date.is_some_and(|d| match i.kind {
                ItemKind::Acquisition { .. } | ItemKind::Disposition { .. } => same_month(d, month),
                ItemKind::Depreciation { .. } => i.ignored && d == month,
                _ => false,
            })
        });
        if blocked {
            continue;
        }

        let amount = book_value_before(&instrument.schedule, month) - plan.salvage;
        if !amount::is_positive(amount) {
            if instrument.schedule.iter().any(|i| i.date > Some(month)) {
                continue;
            }
            break;
        }
        let step = amount / Decimal::from(plan.months - m + 1);
        instrument
            .schedule
            .push(ScheduleItem::depreciation(Some(month), step));
        regularize(instrument);
    }
    tracing::debug!(id = %instrument.id, items = instrument.schedule.len(), "straight-line depreciation");
    Ok(())
}

/// Sum-of-the-years'-digits depreciation.
///
/// Life years are counted from the acquisition month: the `j`th month end
/// after it falls in life year `ceil(j / 12)`, and each year's share is
/// spread evenly over its twelve months. Calendar years play no part.
fn sum_of_the_years(instrument: &mut Instrument, params: &AssetParams) -> Result<(), ScheduleError> {
    let plan = plan(instrument, params)?;
    let id = instrument.id.as_str();
    if instrument.schedule.iter().any(|i| i.ignored) {
        return Err(ScheduleError::unsupported(id, "ignored items present"));
    }
    if instrument
        .schedule
        .iter()
        .any(|i| matches!(i.kind, ItemKind::Devaluation { .. }))
    {
        return Err(ScheduleError::unsupported(id, "devaluation items present"));
    }
    let acquisitions = instrument
        .schedule
        .iter()
        .filter(|i| i.is_acquisition())
        .count();
    if acquisitions > 1 {
        return Err(ScheduleError::unsupported(id, "more than one acquisition"));
    }

    drop_generated(instrument);
    regularize(instrument);

    let total = instrument.value.unwrap_or_default() - plan.salvage;
    let life = plan.months / 12;
    let digits = Decimal::from(12 * life * (life + 1) / 2);
    let disposed = instrument
        .schedule
        .iter()
        .find(|i| matches!(i.kind, ItemKind::Disposition { .. }))
        .and_then(|i| i.date);

    let mut allocated = Decimal::ZERO;
    for j in 1..=plan.months {
        let month = nth_month_end(plan.acquired, j);
        if disposed.is_some_and(|d| d <= month) {
            break;
        }
        let year = j.div_ceil(12);
        let amount = if j == plan.months {
            total - allocated
        } else {
            total * Decimal::from(life - year + 1) / digits
        };
        allocated += amount;
        instrument
            .schedule
            .push(ScheduleItem::depreciation(Some(month), amount));
    }
    regularize(instrument);
    tracing::debug!(id = %instrument.id, items = instrument.schedule.len(), "sum-of-the-years depreciation");
    Ok(())
}
