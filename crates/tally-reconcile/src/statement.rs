//! Matching an external account statement against ledger entries.

use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tally_core::{amount, DateFilter, Entry, EntryLine, IGNORE_REMARK};
use tally_query::{EntryAtom, LineAtom, Query};
use tally_store::Store;

/// Held for the whole compare-and-upsert cycle of every matcher.
static LOCK: Mutex<()> = parking_lot::const_mutex(());

/// One record of an account statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    /// Serial number of the record, written as the remark of its ledger line.
    pub index: u32,
    /// Transaction date.
    pub date: NaiveDate,
    /// Signed amount, positive into the account.
    pub amount: Decimal,
    /// Transaction type as the statement names it.
    pub kind: String,
}

impl fmt::Display for StatementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {} {}", self.index, self.date, self.kind, self.amount)
    }
}

/// A statement record whose ledger lines do not add up to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// The record.
    pub record: StatementRecord,
    /// Sum of the ledger lines remarked with its index.
    pub booked: Decimal,
    /// Entries holding those lines.
    pub entries: Vec<Entry>,
}

/// Result of one matching cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementReport {
    /// Entries with an account line that carries no record index.
    pub unindexed: Vec<Entry>,
    /// Records booked with the wrong amount.
    pub mismatched: Vec<Mismatch>,
    /// Entries whose account line names a record the statement lacks.
    pub unknown: Vec<Entry>,
    /// Entries generated for records with no ledger line.
    pub generated: Vec<Entry>,
    /// Records with no ledger line and no counter line to book them against.
    pub failed: Vec<StatementRecord>,
}

impl StatementReport {
    /// Whether ledger and statement agree.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unindexed.is_empty()
            && self.mismatched.is_empty()
            && self.unknown.is_empty()
            && self.failed.is_empty()
    }
}

/// Compares statement records with the ledger lines of one account.
///
/// Ledger lines on the account carry the statement index of their record as
/// their remark. Records nobody booked are generated against a counter line
/// chosen by transaction type, but only when the rest of the comparison is
/// clean.
#[derive(Debug, Clone)]
pub struct StatementMatcher {
    account: EntryLine,
    counters: HashMap<String, EntryLine>,
}

impl StatementMatcher {
    /// A matcher over the lines matching an account pattern.
    #[must_use]
    pub fn new(account: EntryLine) -> Self {
        Self {
            account,
            counters: HashMap::new(),
        }
    }

    /// Book records of a transaction type against a counter line.
    #[must_use]
    pub fn with_counter(mut self, kind: impl Into<String>, line: EntryLine) -> Self {
        self.counters.insert(kind.into(), line);
        self
    }

    /// Run one compare-and-upsert cycle.
    pub fn reconcile<S: Store>(
        &self,
        store: &mut S,
        records: &[StatementRecord],
    ) -> Result<StatementReport, S::Error> {
        let _guard = LOCK.lock();

        let mut report = StatementReport::default();
        let range = DateFilter::new(
            records.iter().map(|r| r.date).min(),
            records.iter().map(|r| r.date).max(),
        );
        let query = Query::Atom(
            EntryAtom::with_lines(LineAtom::new(self.account.clone())).within(range),
        );

        let mut booked: BTreeMap<u32, (Decimal, Vec<Entry>)> = BTreeMap::new();
        for entry in store.select_entries(&query)? {
            if entry.remark.as_deref() == Some(IGNORE_REMARK) {
                continue;
            }
            let mut unindexed = false;
            let mut unknown = false;
            for line in entry.lines.iter().filter(|l| l.is_match(&self.account)) {
                let Some(index) = line.remark.as_deref().and_then(|r| r.parse::<u32>().ok())
                else {
                    unindexed = true;
                    continue;
                };
                if !records.iter().any(|r| r.index == index) {
                    unknown = true;
                    continue;
                }
                let slot = booked.entry(index).or_default();
                slot.0 += line.amount_or_zero();
                if !slot.1.contains(&entry) {
                    slot.1.push(entry.clone());
                }
            }
            if unindexed {
                report.unindexed.push(entry.clone());
            }
            if unknown {
                report.unknown.push(entry);
            }
        }

        let mut missing = Vec::new();
        for record in records {
            match booked.remove(&record.index) {
                None => missing.push(record),
                Some((sum, _)) if amount::is_near(sum, record.amount) => {}
                Some((sum, entries)) => report.mismatched.push(Mismatch {
                    record: record.clone(),
                    booked: sum,
                    entries,
                }),
            }
        }

        if !(report.unindexed.is_empty() && report.mismatched.is_empty() && report.unknown.is_empty())
        {
            tracing::warn!(
                unindexed = report.unindexed.len(),
                mismatched = report.mismatched.len(),
                unknown = report.unknown.len(),
                "statement disagrees with ledger, nothing generated"
            );
            report.failed = missing.into_iter().cloned().collect();
            return Ok(report);
        }

        for record in missing {
            let Some(mut entry) = self.generate(record) else {
                report.failed.push(record.clone());
                continue;
            };
            store.upsert_entry(&mut entry)?;
            report.generated.push(entry);
        }
        tracing::info!(
            generated = report.generated.len(),
            failed = report.failed.len(),
            "matched statement"
        );
        Ok(report)
    }

    fn generate(&self, record: &StatementRecord) -> Option<Entry> {
        let counter = self.counters.get(&record.kind)?;
        let account = EntryLine {
            remark: Some(record.index.to_string()),
            amount: Some(record.amount),
            ..self.account.clone()
        };
        let counter = EntryLine {
            amount: Some(-record.amount),
            ..counter.clone()
        };
        Some(Entry::new(Some(record.date)).with_line(account).with_line(counter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_store::MemoryStore;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(index: u32, day: u32, amount: Decimal, kind: &str) -> StatementRecord {
        StatementRecord {
            index,
            date: date(2024, 3, day),
            amount,
            kind: kind.into(),
        }
    }

    fn card() -> StatementMatcher {
        StatementMatcher::new(EntryLine::pattern(1012).with_sub_title(5))
            .with_counter("meals", EntryLine::pattern(6602).with_sub_title(3))
    }

    #[test]
    fn test_generates_uncovered_records() {
        let mut store = MemoryStore::new();
        let records = [record(1, 4, dec!(-12.5), "meals"), record(2, 5, dec!(-8), "meals")];
        let report = card().reconcile(&mut store, &records).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.generated.len(), 2);
        assert!(report.generated.iter().all(Entry::is_balanced));

        let again = card().reconcile(&mut store, &records).unwrap();
        assert!(again.is_clean());
        assert!(again.generated.is_empty());
    }

    #[test]
    fn test_unknown_type_fails() {
        let mut store = MemoryStore::new();
        let report = card()
            .reconcile(&mut store, &[record(7, 4, dec!(50), "deposit")])
            .unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_clean());
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_mismatch_blocks_generation() {
        let mut store = MemoryStore::new();
        let mut booked = Entry::new(Some(date(2024, 3, 4)))
            .with_line(EntryLine::new(1012, dec!(-10)).with_sub_title(5).with_remark("1"))
            .with_line(EntryLine::new(6602, dec!(10)).with_sub_title(3));
        store.upsert_entry(&mut booked).unwrap();
        let records = [record(1, 4, dec!(-12.5), "meals"), record(2, 5, dec!(-8), "meals")];
        let report = card().reconcile(&mut store, &records).unwrap();
        assert_eq!(report.mismatched.len(), 1);
        assert_eq!(report.mismatched[0].booked, dec!(-10));
        assert!(report.generated.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(store.entry_count(), 1);
    }
}
