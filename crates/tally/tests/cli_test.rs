//! End-to-end tests of the `tally` commands over ledger files.

use chrono::NaiveDate;
use clap::Parser;
use rust_decimal_macros::dec;
use std::fs;
use std::path::{Path, PathBuf};
use tally::cmd::{run, Args};
use tally_core::{
    AmortParams, AmortizeInterval, Entry, EntryKind, EntryTemplate, Instrument, TemplateLine,
};
use tally_store::{MemoryStore, Store};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A ledger holding one prepaid rent, with an empty settings file next to it.
fn fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let ledger = dir.join("books.json");
    let config = dir.join("config.json");
    fs::write(&config, "{}").unwrap();

    let template = EntryTemplate::new(EntryKind::Amortization)
        .with_line(TemplateLine::new(1123, dec!(-1)).with_content("R1"))
        .with_line(TemplateLine::new(6602, dec!(1)).with_content("R1"));
    let mut rent = Instrument::amortization(
        "r1",
        "Prepaid rent",
        date(2024, 1, 1),
        dec!(1200),
        AmortParams {
            total_days: Some(360),
            interval: Some(AmortizeInterval::SameDayOfMonth),
            template,
        },
    );
    let mut store = MemoryStore::new();
    store.upsert_instrument(&mut rent).unwrap();
    store.save(&ledger).unwrap();
    (ledger, config)
}

fn tally(ledger: &Path, config: &Path, args: &[&str]) -> anyhow::Result<(usize, String)> {
    let mut argv = vec![
        "tally".to_string(),
        "--ledger".to_string(),
        ledger.display().to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    argv.extend(args.iter().map(ToString::to_string));
    let args = Args::try_parse_from(argv)?;
    let mut out = Vec::new();
    let problems = run(&args, &mut out)?;
    Ok((problems, String::from_utf8(out)?))
}

fn entries(ledger: &Path) -> Vec<Entry> {
    MemoryStore::load(ledger).unwrap().to_ledger().entries
}

#[test]
fn test_recal_apply_check_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, config) = fixture(dir.path());

    let (problems, out) = tally(&ledger, &config, &["recal", "--id", "r1"]).unwrap();
    assert_eq!(problems, 0);
    assert!(out.contains("r1 12 items"));
    assert!(entries(&ledger).is_empty());

    let (problems, _) = tally(&ledger, &config, &["check", "--id", "r1", "--today", "2024-03-31"]).unwrap();
    assert_eq!(problems, 3);
    assert!(entries(&ledger).is_empty());

    let (problems, _) = tally(&ledger, &config, &["apply", "--id", "r1"]).unwrap();
    assert_eq!(problems, 0);
    assert_eq!(entries(&ledger).len(), 12);

    let (problems, out) =
        tally(&ledger, &config, &["check", "--id", "r1", "--today", "2024-12-31"]).unwrap();
    assert_eq!(problems, 0);
    assert!(out.is_empty());
}

#[test]
fn test_list_book_value_on_day() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, config) = fixture(dir.path());
    tally(&ledger, &config, &["recal", "--id", "r1"]).unwrap();

    let (_, out) = tally(&ledger, &config, &["list", "--id", "r1", "--on", "2024-06-30"]).unwrap();
    assert!(out.starts_with("r1"));
    assert!(out.contains("600.00"));

    let (_, out) = tally(&ledger, &config, &["show", "--kind", "amortization"]).unwrap();
    assert_eq!(out.lines().count(), 13);
}

#[test]
fn test_subtotal_of_generated_entries() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, config) = fixture(dir.path());
    tally(&ledger, &config, &["recal", "--id", "r1"]).unwrap();
    tally(&ledger, &config, &["apply", "--id", "r1"]).unwrap();

    let (_, out) = tally(
        &ledger,
        &config,
        &["subtotal", "--by", "title,month", "--title", "6602"],
    )
    .unwrap();
    assert!(out.starts_with("1200.00:"));
    assert!(out.contains("T6602:"));
    assert!(out.contains("202403:"));
}

#[test]
fn test_dangerous_queries_need_override() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, config) = fixture(dir.path());

    let err = tally(&ledger, &config, &["list"]).unwrap_err();
    assert!(format!("{err:#}").contains("dangerous"));

    let (_, out) = tally(&ledger, &config, &["--allow-dangerous", "list"]).unwrap();
    assert!(out.contains("Prepaid rent"));

    fs::write(&config, r#"{ "allow_dangerous": true }"#).unwrap();
    assert!(tally(&ledger, &config, &["list"]).is_ok());
}

#[test]
fn test_ledger_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _) = fixture(dir.path());
    let config = dir.path().join("named.json");
    fs::write(
        &config,
        serde_json::json!({ "ledger": ledger }).to_string(),
    )
    .unwrap();

    let args = Args::try_parse_from([
        "tally",
        "--config",
        config.to_str().unwrap(),
        "show",
        "--id",
        "r1",
    ])
    .unwrap();
    let mut out = Vec::new();
    run(&args, &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("amortization r1"));
}

#[test]
fn test_statement_generates_entries() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, config) = fixture(dir.path());
    let records = dir.path().join("statement.json");
    fs::write(
        &records,
        r#"[
            { "index": 1, "date": "2024-03-04", "amount": "-12.5", "kind": "meals" },
            { "index": 2, "date": "2024-03-05", "amount": "-8", "kind": "meals" }
        ]"#,
    )
    .unwrap();
    let records = records.display().to_string();
    let statement = [
        "statement",
        records.as_str(),
        "--account",
        "1012:5",
        "--counter",
        "meals=6602:3",
    ];

    let (problems, out) = tally(&ledger, &config, &statement).unwrap();
    assert_eq!(problems, 0);
    assert!(out.contains("2 entries generated"));
    assert_eq!(entries(&ledger).len(), 2);

    let (problems, out) = tally(&ledger, &config, &statement).unwrap();
    assert_eq!(problems, 0);
    assert!(out.contains("0 entries generated"));
}

#[test]
fn test_missing_ledger_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();
    let args = Args::try_parse_from(["tally", "--config", config.to_str().unwrap(), "show"]).unwrap();
    let err = run(&args, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("no ledger file given"));
}
