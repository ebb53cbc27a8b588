//! Subtotal error types.

use chrono::NaiveDate;
use thiserror::Error;

use crate::level::GroupLevel;

/// Error returned when a subtotal specification is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubtotalError {
    /// A running balance needs every date level after every other level.
    #[error("level {level} cannot follow the date level {after} in a running balance")]
    LevelAfterDate {
        /// The offending level.
        level: GroupLevel,
        /// The date level it follows.
        after: GroupLevel,
    },
    /// An every-day range whose end precedes its start.
    #[error("empty every-day range: {from} to {to}")]
    EmptyRange {
        /// First day.
        from: NaiveDate,
        /// Last day.
        to: NaiveDate,
    },
}
