//! Command-line bookkeeping over tally ledgers.
//!
//! The `tally` binary works on one JSON ledger file holding entries and
//! instruments:
//!
//! - `entries`: List entries
//! - `list` / `show`: Book values and schedules of instruments
//! - `recal`: Recompute schedules
//! - `apply` / `check`: Generate and verify the entries of schedules
//! - `reg` / `unreg` / `import` / `reset`: Maintain schedule links
//! - `subtotal`: Grouped totals of entry lines
//! - `statement`: Match an account statement against the ledger
//!
//! # Example Usage
//!
//! ```bash
//! tally --ledger books.json list --on 2024-06-30
//! tally --ledger books.json apply --id a1 --until 2024-12-31
//! tally --ledger books.json subtotal --by title,month --title 6602
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod config;
