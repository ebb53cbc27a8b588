//! Core types for tally
//!
//! This crate provides the data model shared by every other tally crate:
//!
//! - [`Entry`] / [`EntryLine`] - Double-entry records and their lines
//! - [`DateFilter`] - Inclusive date ranges that also decide about undated records
//! - [`EntryTemplate`] - The shape of entries generated from a schedule
//! - [`Instrument`] / [`ScheduleItem`] - Depreciable assets and amortizations
//! - [`amount`] - Tolerance-based comparison of amounts
//!
//! # Example
//!
//! ```
//! use tally_core::{Entry, EntryLine};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let entry = Entry::new(NaiveDate::from_ymd_opt(2024, 1, 15))
//!     .with_line(EntryLine::new(1001, dec!(-250)))
//!     .with_line(EntryLine::new(6602, dec!(250)).with_content("rent"));
//!
//! assert!(entry.is_balanced());
//! assert_eq!(entry.matching_lines(&EntryLine::pattern(6602)), vec![1]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod date;
pub mod entry;
pub mod instrument;
pub mod template;

pub use amount::TOLERANCE;
pub use date::{compare_dates, DateFilter};
pub use entry::{Entry, EntryKind, EntryLine};
pub use instrument::{
    AmortParams, AmortizeInterval, AssetParams, DepreciationMethod, Instrument, InstrumentKind,
    InstrumentParams, ItemKind, ScheduleItem,
};
pub use template::{EntryTemplate, TemplateLine, GENERATED_REMARK};

/// Remark marking an entry that registration must never link to a schedule.
pub const IGNORE_REMARK: &str = "reconciliation check ignored";

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
