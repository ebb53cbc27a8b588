//! Instrument scheduler for tally.
//!
//! This crate derives and normalizes the schedules of distributed instruments:
//! - Amortization steps spread a declared value over anchor dates
//! - Straight-line and sum-of-the-years'-digits depreciation of assets
//! - Regularization: month-end normalization, ordering and running values
//!
//! Every function here is pure over the instrument it is handed.
//!
//! # Example
//!
//! ```
//! use tally_core::{AmortParams, AmortizeInterval, EntryKind, EntryTemplate, Instrument};
//! use tally_schedule::recompute;
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let mut rent = Instrument::amortization(
//!     "r1",
//!     "Prepaid rent",
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     dec!(1200),
//!     AmortParams {
//!         total_days: Some(360),
//!         interval: Some(AmortizeInterval::SameDayOfMonth),
//!         template: EntryTemplate::new(EntryKind::Amortization),
//!     },
//! );
//! recompute(&mut rent).unwrap();
//! assert_eq!(rent.schedule.len(), 12);
//! assert_eq!(rent.schedule[11].value, dec!(0));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod amortize;
mod book_value;
mod depreciate;
mod error;
mod regularize;

pub use amortize::{amortize, anchors, first_anchor, next_anchor};
pub use book_value::book_value_on;
pub use depreciate::depreciate;
pub use error::ScheduleError;
pub use regularize::regularize;

use tally_core::{Instrument, InstrumentParams};

/// Re-derive an instrument's schedule from its parameters and regularize it.
///
/// Ignored instruments are left as they are.
pub fn recompute(instrument: &mut Instrument) -> Result<(), ScheduleError> {
    if instrument.ignored {
        return Ok(());
    }
    match instrument.params {
        InstrumentParams::Asset(_) => depreciate(instrument)?,
        InstrumentParams::Amortization(_) => amortize(instrument)?,
    }
    regularize(instrument);
    Ok(())
}
