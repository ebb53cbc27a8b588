//! Reconciliation of tally instrument schedules against ledger entries.
//!
//! This crate keeps the entries an instrument generates in sync with its
//! schedule:
//! - [`Reconciler::update`] generates missing entries and edits drifted amounts
//! - [`Reconciler::register_entries`] links existing entries to schedule items
//! - Import and reset operations rebuild links from the ledger
//!
//! [`StatementMatcher`] compares an external account statement with the
//! ledger under a process-wide lock.
//!
//! Reconciliation is best-effort: items that cannot be synced come back as
//! [`Unresolved`] values, and only store failures are errors.
//!
//! # Example
//!
//! ```
//! use tally_core::{AmortParams, AmortizeInterval, DateFilter, EntryKind, EntryTemplate, Instrument, TemplateLine};
//! use tally_reconcile::Reconciler;
//! use tally_schedule::recompute;
//! use tally_store::MemoryStore;
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let template = EntryTemplate::new(EntryKind::Amortization)
//!     .with_line(TemplateLine::new(1123, dec!(-1)).with_content("R1"))
//!     .with_line(TemplateLine::new(6602, dec!(1)).with_content("R1"));
//! let mut rent = Instrument::amortization(
//!     "r1",
//!     "Prepaid rent",
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     dec!(1200),
//!     AmortParams {
//!         total_days: Some(360),
//!         interval: Some(AmortizeInterval::SameDayOfMonth),
//!         template,
//!     },
//! );
//! recompute(&mut rent).unwrap();
//!
//! let mut store = MemoryStore::new();
//! let unresolved = Reconciler::new(&mut store)
//!     .update(&mut rent, &DateFilter::unconstrained(), false, false)
//!     .unwrap();
//! assert!(unresolved.is_empty());
//! assert_eq!(store.entry_count(), 12);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod conflict;
mod reconciler;
mod statement;

pub use conflict::{SyncConflict, Unresolved};
pub use reconciler::Reconciler;
pub use statement::{Mismatch, StatementMatcher, StatementRecord, StatementReport};
