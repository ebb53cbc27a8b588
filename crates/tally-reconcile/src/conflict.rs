//! Outcomes of reconciliation that need attention.

use chrono::NaiveDate;
use tally_core::ScheduleItem;
use thiserror::Error;

/// Why a schedule item could not be synced with its entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncConflict {
    /// The linked entry sits on another date than the item expects.
    #[error("linked entry dated {actual:?}, expected {expected:?}")]
    DateDrift {
        /// Date the item expects.
        expected: Option<NaiveDate>,
        /// Date of the stored entry.
        actual: Option<NaiveDate>,
    },

    /// More than one entry line matches a template line.
    #[error("{count} lines match template line T{title:?}")]
    AmbiguousLine {
        /// Title of the template line.
        title: Option<u32>,
        /// Number of matching lines.
        count: usize,
    },

    /// No entry line matches a template line.
    #[error("no line matches template line T{title:?}")]
    MissingLine {
        /// Title of the template line.
        title: Option<u32>,
    },

    /// The item has no entry and creating one is not allowed.
    #[error("no entry to edit")]
    EntryMissing,

    /// No entry can be generated for this kind of item.
    #[error("{kind} items cannot be generated")]
    NotGeneratable {
        /// Item kind label.
        kind: &'static str,
    },
}

/// A schedule item left unsynced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// Position of the item in the schedule.
    pub index: usize,
    /// The item as it stood.
    pub item: ScheduleItem,
    /// What went wrong.
    pub reason: SyncConflict,
}
