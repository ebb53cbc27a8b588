//! Subtotal engine for tally.
//!
//! Reduces a flat sequence of [`Balance`]s into a nested report keyed by an
//! ordered list of [`GroupLevel`]s. The same [`traverse`] recursion serves
//! numeric totals, text reports and anything else a [`SubtotalTraversal`]
//! builds per node.
//!
//! # Example
//!
//! ```
//! use tally_subtotal::{Balance, GroupLevel, Subtotal, TextReport};
//! use rust_decimal_macros::dec;
//!
//! let balances = vec![
//!     Balance { title: Some(6602), ..Balance::new(None, dec!(30)) },
//!     Balance { title: Some(6603), ..Balance::new(None, dec!(12)) },
//! ];
//! let report = TextReport::render(&Subtotal::sum(vec![GroupLevel::Title]), balances);
//! assert!(report.starts_with("42.00:"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balance;
pub mod error;
pub mod level;
pub mod text;
pub mod traverse;

pub use balance::{balances_of, Balance};
pub use error::SubtotalError;
pub use level::{AggregationType, GatheringType, GroupKey, GroupLevel, Subtotal};
pub use text::TextReport;
pub use traverse::{traverse, Subtotaled, SubtotalTraversal};
