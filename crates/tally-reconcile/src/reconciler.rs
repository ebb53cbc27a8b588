//! Syncing instrument schedules with the entries they generate.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{
    amount, DateFilter, Entry, EntryLine, EntryTemplate, Instrument, InstrumentParams, ItemKind,
    ScheduleItem, IGNORE_REMARK,
};
use tally_query::{EntryAtom, LineAtom, Query};
use tally_schedule::regularize;
use tally_store::Store;

use crate::conflict::{SyncConflict, Unresolved};

/// What an item's date becomes on the entry it syncs with.
fn target_date(
    date: Option<NaiveDate>,
    range: &DateFilter,
    collapse: bool,
) -> Option<Option<NaiveDate>> {
    match date {
        Some(d) if range.contains(Some(d)) => Some(Some(d)),
        Some(d) if collapse && range.precedes(d) => Some(None),
        None if collapse || range.contains(None) => Some(None),
        _ => None,
    }
}

fn same_kind(a: &ItemKind, b: &ItemKind) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Reconciler over a store.
///
/// Every pass re-reads the store; nothing is cached between calls.
pub struct Reconciler<'s, S: Store> {
    store: &'s mut S,
}

impl<'s, S: Store> Reconciler<'s, S> {
    /// A reconciler working through a store.
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Entries of an instrument.
    ///
    /// Asset entries carry its content key on some line. Amortization entries
    /// are those matching one of its templates: the template kind plus a line
    /// for every template line.
    fn instrument_entries(instrument: &Instrument, range: &DateFilter) -> Query<EntryAtom> {
        let by_key = || {
            let key = EntryLine::default().with_content(instrument.content_key());
            Query::Atom(EntryAtom::with_lines(LineAtom::new(key)).within(*range))
        };
        if !matches!(instrument.params, InstrumentParams::Amortization(_)) {
            return by_key();
        }
        instrument
            .templates()
            .iter()
            .map(|(_, t)| template_query(t, range))
            .reduce(|a, b| a.union(b))
            .unwrap_or_else(by_key)
    }

    /// Sync the entries of every schedule item selected by a range.
    ///
    /// With `collapse`, items dated before the range and undated items sync
    /// with undated entries. With `edit_only`, missing entries are reported
    /// instead of created and date drift is tolerated. The instrument is
    /// upserted back with its new links, even when a store error cuts the
    /// pass short. Items that could not be synced are returned.
    pub fn update(
        &mut self,
        instrument: &mut Instrument,
        range: &DateFilter,
        collapse: bool,
        edit_only: bool,
    ) -> Result<Vec<Unresolved>, S::Error> {
        if instrument.ignored {
            return Ok(Vec::new());
        }
        regularize(instrument);

        let mut unresolved = Vec::new();
        for index in 0..instrument.schedule.len() {
            let item = &instrument.schedule[index];
            if item.ignored {
                continue;
            }
            let Some(date) = target_date(item.date, range, collapse) else {
                continue;
            };
            let synced = match self.sync_item(instrument, index, date, edit_only) {
                Ok(synced) => synced,
                Err(err) => {
                    // Links made before the failure still point at stored entries.
                    if let Err(save) = self.store.upsert_instrument(instrument) {
                        tracing::warn!(id = %instrument.id, error = %save, "could not save links");
                    }
                    return Err(err);
                }
            };
            if let Some(reason) = synced {
                tracing::warn!(id = %instrument.id, index, %reason, "schedule item unresolved");
                unresolved.push(Unresolved {
                    index,
                    item: instrument.schedule[index].clone(),
                    reason,
                });
            }
        }

        self.store.upsert_instrument(instrument)?;
        tracing::info!(
            id = %instrument.id,
            unresolved = unresolved.len(),
            "updated instrument entries"
        );
        Ok(unresolved)
    }

    fn sync_item(
        &mut self,
        instrument: &mut Instrument,
        index: usize,
        date: Option<NaiveDate>,
        edit_only: bool,
    ) -> Result<Option<SyncConflict>, S::Error> {
        let item = &instrument.schedule[index];
        let not_generatable = SyncConflict::NotGeneratable {
            kind: item.kind.label(),
        };
        let (Some(template), Some(amount)) = (
            instrument.template_for(&item.kind),
            instrument.derived_amount(index),
        ) else {
            return Ok(item.entry_id.is_none().then_some(not_generatable));
        };
        let line_remark = item.remark.clone();

        let stored = match &item.entry_id {
            Some(id) => self.store.select_entry(id)?,
            None => None,
        };
        let Some(mut entry) = stored else {
            if edit_only {
                return Ok(Some(SyncConflict::EntryMissing));
            }
            let mut entry = template.instantiate(date, amount, line_remark.as_deref());
            self.store.upsert_entry(&mut entry)?;
            tracing::debug!(id = %instrument.id, index, entry = ?entry.id, "generated entry");
            instrument.schedule[index].entry_id = entry.id;
            return Ok(None);
        };

        if entry.date != date && !edit_only {
            return Ok(Some(SyncConflict::DateDrift {
                expected: date,
                actual: entry.date,
            }));
        }

        let amortized = matches!(instrument.params, InstrumentParams::Amortization(_));
        if amortized && entry.lines.len() != template.lines.len() && !edit_only {
            let mut fresh = template.instantiate(entry.date, amount, line_remark.as_deref());
            fresh.id = entry.id;
            self.store.upsert_entry(&mut fresh)?;
            tracing::debug!(id = %instrument.id, index, entry = ?fresh.id, "regenerated entry");
            return Ok(None);
        }

        match edit_lines(&mut entry, &template, amount, !amortized) {
            Ok(false) => Ok(None),
            Ok(true) => {
                self.store.upsert_entry(&mut entry)?;
                tracing::debug!(id = %instrument.id, index, entry = ?entry.id, "edited entry");
                Ok(None)
            }
            Err(conflict) => Ok(Some(conflict)),
        }
    }

    /// Link entries of an instrument to its schedule items.
    ///
    /// An entry of the instrument's template shape is linked when exactly one
    /// unlinked item of the template's kind shares its date. Entries that are
    /// neither linked already nor linkable are returned for manual
    /// registration. An acquisition only needs its asset line, so purchases
    /// carrying their payment lines link too. Entries remarked
    /// [`IGNORE_REMARK`] are skipped.
    pub fn register_entries(
        &mut self,
        instrument: &mut Instrument,
        range: &DateFilter,
        filter: Option<&Query<EntryAtom>>,
    ) -> Result<Vec<Entry>, S::Error> {
        if instrument.ignored {
            return Ok(Vec::new());
        }
        regularize(instrument);

        let mut query = Self::instrument_entries(instrument, range);
        if let Some(filter) = filter {
            query = query.intersect(filter.clone());
        }
        let templates = instrument.templates();
        let mut pending = Vec::new();
        let mut linked = 0usize;
        for entry in self.store.select_entries(&query)? {
            if entry.remark.as_deref() == Some(IGNORE_REMARK) {
                continue;
            }
            if instrument
                .schedule
                .iter()
                .any(|i| i.entry_id.is_some() && i.entry_id == entry.id)
            {
                continue;
            }
            let Some((kind, _)) = templates.iter().find(|(kind, t)| {
                if matches!(kind, ItemKind::Acquisition { .. }) {
                    t.covers(&entry)
                } else {
                    t.is_shape_of(&entry)
                }
            }) else {
                pending.push(entry);
                continue;
            };
            let candidates: Vec<usize> = instrument
                .schedule
                .iter()
                .enumerate()
                .filter(|(_, i)| {
                    i.entry_id.is_none() && same_kind(&i.kind, kind) && i.date == entry.date
                })
                .map(|(n, _)| n)
                .collect();
            match candidates.as_slice() {
                [n] => {
                    instrument.schedule[*n].entry_id.clone_from(&entry.id);
                    linked += 1;
                }
                _ => pending.push(entry),
            }
        }

        if linked > 0 {
            self.store.upsert_instrument(instrument)?;
        }
        tracing::info!(id = %instrument.id, linked, pending = pending.len(), "registered entries");
        Ok(pending)
    }

    /// Drop the links of items in a range whose entries match a query.
    ///
    /// Returns how many links were dropped.
    pub fn unregister(
        &mut self,
        instrument: &mut Instrument,
        range: &DateFilter,
        filter: Option<&Query<EntryAtom>>,
    ) -> Result<usize, S::Error> {
        let mut dropped = 0;
        for item in &mut instrument.schedule {
            if !range.contains(item.date) {
                continue;
            }
            let Some(id) = &item.entry_id else {
                continue;
            };
            let matches = match filter {
                None => true,
                Some(q) => self
                    .store
                    .select_entry(id)?
                    .is_some_and(|e| q.evaluate(&e)),
            };
            if matches {
                item.entry_id = None;
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.store.upsert_instrument(instrument)?;
        }
        tracing::info!(id = %instrument.id, dropped, "unregistered entries");
        Ok(dropped)
    }

    /// Rebuild asset acquisitions and dispositions from its entries.
    ///
    /// Every unlinked entry in range with a line on the asset's title and
    /// content key becomes an acquisition when that line is positive and a
    /// disposition otherwise. Returns how many items were imported.
    pub fn import_schedule(
        &mut self,
        instrument: &mut Instrument,
        range: &DateFilter,
    ) -> Result<usize, S::Error> {
        let InstrumentParams::Asset(params) = &instrument.params else {
            return Ok(0);
        };
        let pattern = EntryLine::pattern(params.title).with_content(instrument.content_key());
        let query = Query::Atom(EntryAtom::with_lines(LineAtom::new(pattern.clone())).within(*range));

        let mut imported = 0;
        for entry in self.store.select_entries(&query)? {
            if instrument
                .schedule
                .iter()
                .any(|i| i.entry_id.is_some() && i.entry_id == entry.id)
            {
                continue;
            }
            let value: Decimal = entry
                .lines
                .iter()
                .filter(|l| l.is_match(&pattern))
                .map(EntryLine::amount_or_zero)
                .sum();
            let mut item = if amount::is_positive(value) {
                ScheduleItem::acquisition(entry.date, value)
            } else {
                ScheduleItem::disposition(entry.date)
            };
            item.entry_id.clone_from(&entry.id);
            instrument.schedule.push(item);
            imported += 1;
        }

        regularize(instrument);
        self.store.upsert_instrument(instrument)?;
        tracing::info!(id = %instrument.id, imported, "imported schedule items");
        Ok(imported)
    }

    /// Drop links to entries that no longer exist.
    pub fn reset_soft(
        &mut self,
        instrument: &mut Instrument,
        range: &DateFilter,
    ) -> Result<usize, S::Error> {
        let mut dropped = 0;
        for item in &mut instrument.schedule {
            if !range.contains(item.date) {
                continue;
            }
            let Some(id) = &item.entry_id else {
                continue;
            };
            if self.store.select_entry(id)?.is_none() {
                item.entry_id = None;
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.store.upsert_instrument(instrument)?;
        }
        tracing::info!(id = %instrument.id, dropped, "dropped dangling links");
        Ok(dropped)
    }

    /// Drop links of items in a range and delete the linked entries.
    ///
    /// Returns how many entries were deleted.
    pub fn reset_mixed(
        &mut self,
        instrument: &mut Instrument,
        range: &DateFilter,
    ) -> Result<usize, S::Error> {
        let mut deleted = 0;
        for item in &mut instrument.schedule {
            if !range.contains(item.date) || item.ignored {
                continue;
            }
            let Some(id) = item.entry_id.take() else {
                continue;
            };
            deleted += self
                .store
                .delete_entries(&Query::Atom(EntryAtom::by_id(id)))?;
        }
        self.store.upsert_instrument(instrument)?;
        tracing::info!(id = %instrument.id, deleted, "reset linked entries");
        Ok(deleted)
    }

    /// Delete entries of the instrument's template shapes that no item links.
    ///
    /// Entries remarked [`IGNORE_REMARK`] are kept. Returns how many entries
    /// were deleted.
    pub fn reset_hard(
        &mut self,
        instrument: &Instrument,
        range: &DateFilter,
    ) -> Result<usize, S::Error> {
        let templates: Vec<EntryTemplate> =
            instrument.templates().into_iter().map(|(_, t)| t).collect();
        let mut deleted = 0;
        for entry in self
            .store
            .select_entries(&Self::instrument_entries(instrument, range))?
        {
            let Some(id) = entry.id.clone() else {
                continue;
            };
            if entry.remark.as_deref() == Some(IGNORE_REMARK)
                || instrument
                    .schedule
                    .iter()
                    .any(|i| i.entry_id.as_deref() == Some(id.as_str()))
                || !templates.iter().any(|t| t.is_shape_of(&entry))
            {
                continue;
            }
            deleted += self
                .store
                .delete_entries(&Query::Atom(EntryAtom::by_id(id)))?;
        }
        tracing::info!(id = %instrument.id, deleted, "deleted unlinked entries");
        Ok(deleted)
    }

    /// Verify generated entries up to a day without creating any.
    pub fn check(
        &mut self,
        instrument: &mut Instrument,
        today: NaiveDate,
    ) -> Result<Vec<Unresolved>, S::Error> {
        self.update(instrument, &DateFilter::new(None, Some(today)), false, true)
    }
}

/// Entries of a template's kind with a line matching every template line.
fn template_query(template: &EntryTemplate, range: &DateFilter) -> Query<EntryAtom> {
    let by_kind = Query::Atom(EntryAtom::in_range(*range).of_kind(template.kind));
    template.lines.iter().fold(by_kind, |query, line| {
        query.intersect(EntryAtom::with_lines(LineAtom::new(line.pattern())))
    })
}

/// Bring the lines of an entry in line with a template.
///
/// Lines the template doesn't describe are left alone. With `append_missing`,
/// a template line no entry line matches is appended instead of reported.
/// Returns whether anything changed.
fn edit_lines(
    entry: &mut Entry,
    template: &EntryTemplate,
    amount: Decimal,
    append_missing: bool,
) -> Result<bool, SyncConflict> {
    let mut modified = false;
    if entry.kind != template.kind {
        entry.kind = template.kind;
        modified = true;
    }
    for line in template.lines.iter().filter(|l| !l.ignored) {
        let pattern = line.pattern();
        let expected = line.expected(amount);
        let matches = entry.matching_lines(&pattern);
        let n = match matches.as_slice() {
            [n] => *n,
            [] if append_missing => {
                entry.lines.push(EntryLine {
                    amount: Some(expected),
                    ..pattern
                });
                modified = true;
                continue;
            }
            [] => return Err(SyncConflict::MissingLine { title: line.title }),
            _ => {
                return Err(SyncConflict::AmbiguousLine {
                    title: line.title,
                    count: matches.len(),
                })
            }
        };
        if !entry.lines[n].amount_is_near(expected) {
            entry.lines[n].amount = Some(expected);
            modified = true;
        }
    }
    Ok(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{EntryKind, TemplateLine};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_target_date() {
        let range = DateFilter::new(Some(date(2024, 2, 1)), Some(date(2024, 2, 29)));
        assert_eq!(target_date(Some(date(2024, 2, 5)), &range, false), Some(Some(date(2024, 2, 5))));
        assert_eq!(target_date(Some(date(2024, 1, 5)), &range, false), None);
        assert_eq!(target_date(Some(date(2024, 1, 5)), &range, true), Some(None));
        assert_eq!(target_date(Some(date(2024, 3, 5)), &range, true), None);
        assert_eq!(target_date(None, &range, false), None);
        assert_eq!(target_date(None, &range, true), Some(None));
    }

    fn rent_template() -> EntryTemplate {
        EntryTemplate::new(EntryKind::Amortization)
            .with_line(TemplateLine::new(1123, dec!(-1)).with_content("RENT"))
            .with_line(TemplateLine::new(6602, dec!(1)).with_content("RENT"))
    }

    #[test]
    fn test_edit_lines_fixes_amounts_and_kind() {
        let t = rent_template();
        let mut entry = t.instantiate(None, dec!(90), None);
        entry.kind = EntryKind::Ordinary;
        assert_eq!(edit_lines(&mut entry, &t, dec!(100), false), Ok(true));
        assert_eq!(entry.kind, EntryKind::Amortization);
        assert_eq!(entry.lines[0].amount, Some(dec!(-100)));
        assert_eq!(edit_lines(&mut entry, &t, dec!(100), false), Ok(false));
    }

    #[test]
    fn test_edit_lines_conflicts() {
        let t = rent_template();
        let mut entry = t.instantiate(None, dec!(1), None);
        entry.lines[1].title = Some(1123);
        assert_eq!(
            edit_lines(&mut entry.clone(), &t, dec!(1), false),
            Err(SyncConflict::AmbiguousLine {
                title: Some(1123),
                count: 2
            })
        );
        entry.lines[1].title = Some(6601);
        entry.lines[0].title = Some(6601);
        assert_eq!(
            edit_lines(&mut entry, &t, dec!(1), false),
            Err(SyncConflict::MissingLine { title: Some(1123) })
        );
    }
}
