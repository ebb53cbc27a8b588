//! Query error types.

use thiserror::Error;

use crate::query::Operator;

/// Error returned when building a query tree fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// An operator was given the wrong number of operands.
    #[error("malformed query: {op} takes {expected} operand(s), got {actual}")]
    Malformed {
        /// The offending operator.
        op: Operator,
        /// Operands the operator takes.
        expected: usize,
        /// Operands supplied.
        actual: usize,
    },
    /// A name pattern is not a valid regular expression.
    #[error("invalid name pattern: {0}")]
    Pattern(String),
}
