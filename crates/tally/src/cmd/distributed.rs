//! Commands over distributed instruments.
//!
//! Every command returns how many problems it found; the caller turns a
//! non-zero count into a failing exit code.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Write;
use tally_core::{DateFilter, Instrument, ItemKind};
use tally_reconcile::{Reconciler, Unresolved};
use tally_schedule::{book_value_on, recompute};
use tally_store::{MemoryStore, Store};

use super::filter::InstrumentFilter;

/// How far a reset goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResetMode {
    /// Drop links to entries that no longer exist
    Soft,
    /// Drop links in range and delete their entries
    Mixed,
    /// Delete template-shaped entries no item links
    Hard,
}

fn select(store: &MemoryStore, filter: &InstrumentFilter) -> Result<Vec<Instrument>> {
    store
        .select_instruments(&filter.query()?)
        .context("failed to select instruments")
}

fn show_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "[undated]".to_string(), |d| d.to_string())
}

fn payload(kind: &ItemKind) -> Decimal {
    match *kind {
        ItemKind::Acquisition { orig_value: v }
        | ItemKind::Depreciation { amount: v }
        | ItemKind::Devaluation { fair_value: v }
        | ItemKind::Disposition { net_value: v }
        | ItemKind::Amortization { amount: v } => v,
    }
}

fn write_unresolved<W: Write>(out: &mut W, id: &str, unresolved: &[Unresolved]) -> Result<()> {
    for u in unresolved {
        writeln!(
            out,
            "{id} #{} {} {}: {}",
            u.index,
            show_date(u.item.date),
            u.item.kind.label(),
            u.reason
        )?;
    }
    Ok(())
}

/// Print book values on a day, or after the last item when no day is given.
pub fn list<W: Write>(
    store: &MemoryStore,
    filter: &InstrumentFilter,
    on: Option<NaiveDate>,
    out: &mut W,
) -> Result<usize> {
    for instrument in select(store, filter)? {
        let value = match on {
            Some(_) => book_value_on(&instrument, on),
            None => instrument.schedule.last().map(|i| i.value),
        };
        let value = value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        writeln!(
            out,
            "{:<12} {:<13} {:<28} {value:>14}",
            instrument.id,
            instrument.kind().to_string(),
            instrument.name
        )?;
    }
    Ok(0)
}

/// Print the schedules of instruments.
pub fn show<W: Write>(store: &MemoryStore, filter: &InstrumentFilter, out: &mut W) -> Result<usize> {
    for instrument in select(store, filter)? {
        writeln!(
            out,
            "{} {} '{}' {} {}",
            instrument.kind(),
            instrument.id,
            instrument.name,
            show_date(instrument.date),
            instrument
                .value
                .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
        )?;
        for item in &instrument.schedule {
            write!(
                out,
                "  {:<10} {:<13} {:>14.2} {:>14.2}",
                show_date(item.date),
                item.kind.label(),
                payload(&item.kind),
                item.value
            )?;
            if let Some(id) = &item.entry_id {
                write!(out, " ^{id}")?;
            }
            if item.ignored {
                write!(out, " (ignored)")?;
            }
            writeln!(out)?;
        }
    }
    Ok(0)
}

/// Recompute schedules from instrument parameters.
pub fn recal<W: Write>(
    store: &mut MemoryStore,
    filter: &InstrumentFilter,
    out: &mut W,
) -> Result<usize> {
    let instruments = select(store, filter)?;
    for mut instrument in instruments {
        recompute(&mut instrument)
            .with_context(|| format!("failed to recompute {}", instrument.id))?;
        store.upsert_instrument(&mut instrument)?;
        writeln!(out, "{} {} items", instrument.id, instrument.schedule.len())?;
    }
    Ok(0)
}

/// Generate and edit the entries of schedule items in a range.
pub fn apply<W: Write>(
    store: &mut MemoryStore,
    filter: &InstrumentFilter,
    range: &DateFilter,
    collapse: bool,
    out: &mut W,
) -> Result<usize> {
    let mut problems = 0;
    for mut instrument in select(store, filter)? {
        let unresolved = Reconciler::new(store).update(&mut instrument, range, collapse, false)?;
        write_unresolved(out, &instrument.id, &unresolved)?;
        problems += unresolved.len();
    }
    Ok(problems)
}

/// Verify the entries of schedule items up to a day.
pub fn check<W: Write>(
    store: &mut MemoryStore,
    filter: &InstrumentFilter,
    today: NaiveDate,
    out: &mut W,
) -> Result<usize> {
    let mut problems = 0;
    for mut instrument in select(store, filter)? {
        let unresolved = Reconciler::new(store).check(&mut instrument, today)?;
        write_unresolved(out, &instrument.id, &unresolved)?;
        problems += unresolved.len();
    }
    Ok(problems)
}

/// Link entries to schedule items, printing the entries left over.
pub fn register<W: Write>(
    store: &mut MemoryStore,
    filter: &InstrumentFilter,
    range: &DateFilter,
    out: &mut W,
) -> Result<usize> {
    let mut problems = 0;
    for mut instrument in select(store, filter)? {
        let pending = Reconciler::new(store).register_entries(&mut instrument, range, None)?;
        for entry in &pending {
            writeln!(out, "{}: {entry}", instrument.id)?;
        }
        problems += pending.len();
    }
    Ok(problems)
}

/// Drop the links of schedule items in a range.
pub fn unregister<W: Write>(
    store: &mut MemoryStore,
    filter: &InstrumentFilter,
    range: &DateFilter,
    out: &mut W,
) -> Result<usize> {
    for mut instrument in select(store, filter)? {
        let dropped = Reconciler::new(store).unregister(&mut instrument, range, None)?;
        writeln!(out, "{} {dropped} links dropped", instrument.id)?;
    }
    Ok(0)
}

/// Rebuild asset items from entries.
pub fn import<W: Write>(
    store: &mut MemoryStore,
    filter: &InstrumentFilter,
    range: &DateFilter,
    out: &mut W,
) -> Result<usize> {
    for mut instrument in select(store, filter)? {
        let imported = Reconciler::new(store).import_schedule(&mut instrument, range)?;
        writeln!(out, "{} {imported} items imported", instrument.id)?;
    }
    Ok(0)
}

/// Reset schedule links.
pub fn reset<W: Write>(
    store: &mut MemoryStore,
    mode: ResetMode,
    filter: &InstrumentFilter,
    range: &DateFilter,
    out: &mut W,
) -> Result<usize> {
    for mut instrument in select(store, filter)? {
        let mut reconciler = Reconciler::new(store);
        let (count, what) = match mode {
            ResetMode::Soft => (reconciler.reset_soft(&mut instrument, range)?, "links dropped"),
            ResetMode::Mixed => (
                reconciler.reset_mixed(&mut instrument, range)?,
                "entries deleted",
            ),
            ResetMode::Hard => (reconciler.reset_hard(&instrument, range)?, "entries deleted"),
        };
        writeln!(out, "{} {count} {what}", instrument.id)?;
    }
    Ok(0)
}
