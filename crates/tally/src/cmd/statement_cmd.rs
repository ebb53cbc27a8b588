//! Matching an account statement file against the ledger.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tally_core::EntryLine;
use tally_reconcile::{StatementMatcher, StatementRecord};
use tally_store::MemoryStore;

use super::filter::parse_line;

/// Arguments of the statement command.
#[derive(Args, Debug, Clone)]
pub struct StatementArgs {
    /// JSON file holding an array of statement records
    #[arg(value_name = "RECORDS")]
    pub records: PathBuf,

    /// Account line the statement covers, as TITLE or TITLE:SUB
    #[arg(long, value_parser = parse_line)]
    pub account: EntryLine,

    /// Counter line for a transaction type, as TYPE=TITLE or TYPE=TITLE:SUB
    #[arg(long = "counter", value_name = "TYPE=LINE", value_parser = parse_counter)]
    pub counters: Vec<(String, EntryLine)>,
}

fn parse_counter(s: &str) -> Result<(String, EntryLine), String> {
    let (kind, line) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TYPE=LINE, got '{s}'"))?;
    Ok((kind.to_string(), parse_line(line)?))
}

#[derive(Debug, Deserialize)]
struct RecordDocument {
    index: u32,
    date: NaiveDate,
    amount: Decimal,
    kind: String,
}

impl From<RecordDocument> for StatementRecord {
    fn from(doc: RecordDocument) -> Self {
        Self {
            index: doc.index,
            date: doc.date,
            amount: doc.amount,
            kind: doc.kind,
        }
    }
}

/// Read statement records from a JSON file.
pub fn read_records(path: &Path) -> Result<Vec<StatementRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let docs: Vec<RecordDocument> = serde_json::from_str(&text)
        .with_context(|| format!("invalid statement file {}", path.display()))?;
    Ok(docs.into_iter().map(Into::into).collect())
}

/// Run one matching cycle and print what disagrees.
pub fn run<W: Write>(store: &mut MemoryStore, args: &StatementArgs, out: &mut W) -> Result<usize> {
    let records = read_records(&args.records)?;
    let matcher = args
        .counters
        .iter()
        .fold(StatementMatcher::new(args.account.clone()), |m, (kind, line)| {
            m.with_counter(kind.clone(), line.clone())
        });
    let report = matcher.reconcile(store, &records)?;

    for entry in &report.unindexed {
        writeln!(out, "--- no record index\n{entry}")?;
    }
    for mismatch in &report.mismatched {
        writeln!(out, "--- booked {} for {}", mismatch.booked, mismatch.record)?;
        for entry in &mismatch.entries {
            writeln!(out, "{entry}")?;
        }
    }
    for entry in &report.unknown {
        writeln!(out, "--- not on statement\n{entry}")?;
    }
    for record in &report.failed {
        writeln!(out, "--- cannot generate {record}")?;
    }
    writeln!(out, "{} entries generated", report.generated.len())?;

    Ok(report.unindexed.len() + report.mismatched.len() + report.unknown.len() + report.failed.len())
}
