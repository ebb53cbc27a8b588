//! Scheduler error types.

use tally_core::DepreciationMethod;
use thiserror::Error;

/// Errors that can occur while deriving a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The schedule holds items the depreciation method cannot work around.
    #[error("instrument {id}: unsupported schedule state: {reason}")]
    UnsupportedScheduleState {
        /// Instrument id.
        id: String,
        /// What is in the way.
        reason: String,
    },

    /// The depreciation method is not implemented.
    #[error("depreciation method {method:?} is not supported")]
    NotSupported {
        /// The method.
        method: DepreciationMethod,
    },

    /// A parameter the derivation needs is not set.
    #[error("instrument {id}: missing parameter {parameter}")]
    MissingParameter {
        /// Instrument id.
        id: String,
        /// The parameter.
        parameter: &'static str,
    },
}

impl ScheduleError {
    pub(crate) fn missing(id: &str, parameter: &'static str) -> Self {
        Self::MissingParameter {
            id: id.to_string(),
            parameter,
        }
    }

    pub(crate) fn unsupported(id: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedScheduleState {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
