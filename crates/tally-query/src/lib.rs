//! Query algebra for tally.
//!
//! Queries are immutable predicate trees over one record kind: entry lines,
//! entries or distributed instruments. Leaves are atoms (a record-shaped
//! filter) and inner nodes are set-style operators.
//!
//! # Operators
//!
//! - `Union` / `Intersect` / `Subtract` - binary, `Subtract(A, B)` is `A AND NOT B`
//! - `Complement` / `Identity` - unary
//! - `None` - reported for a bare atom
//!
//! Operand counts are checked when a composite is built, never when it is
//! evaluated. A tree is *dangerous* when it could force the store into an
//! unbounded scan; stores may refuse to run dangerous queries.
//!
//! # Example
//!
//! ```
//! use tally_core::{Entry, EntryLine};
//! use tally_query::{EntryAtom, LineAtom, Query};
//! use rust_decimal_macros::dec;
//!
//! let cash = Query::Atom(LineAtom::new(EntryLine::pattern(1001)));
//! let rent = cash.intersect(LineAtom::new(EntryLine::pattern(1001).with_content("rent")));
//! let q: Query<EntryAtom> = Query::Atom(EntryAtom::with_lines(rent));
//!
//! let entry = Entry::new(None).with_line(EntryLine::new(1001, dec!(-5)).with_content("rent"));
//! assert!(q.evaluate(&entry));
//! assert!(!q.is_dangerous());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atoms;
pub mod error;
pub mod query;

pub use atoms::{Direction, DistributedAtom, EntryAtom, LineAtom};
pub use error::QueryError;
pub use query::{Composite, Operator, Query, QueryAtom};
