//! Store contract and an in-memory document store for tally.
//!
//! The [`Store`] trait is the narrow CRUD surface the reconciler works
//! through. [`MemoryStore`] implements it over ordered maps and persists the
//! whole ledger as one JSON document.
//!
//! # Example
//!
//! ```
//! use tally_core::{Entry, EntryLine, DateFilter};
//! use tally_query::{EntryAtom, Query};
//! use tally_store::{MemoryStore, Store};
//! use rust_decimal_macros::dec;
//!
//! let mut store = MemoryStore::new();
//! let mut entry = Entry::new(None).with_line(EntryLine::new(1001, dec!(5)));
//! store.upsert_entry(&mut entry).unwrap();
//! assert!(entry.id.is_some());
//!
//! let undated = Query::Atom(EntryAtom::in_range(DateFilter::null_only()));
//! assert_eq!(store.select_entries(&undated).unwrap().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;

pub use memory::{Ledger, MemoryStore, StoreOptions};

use std::path::PathBuf;
use tally_core::{Entry, Instrument};
use tally_query::{DistributedAtom, EntryAtom, Query};
use thiserror::Error;

/// Persistence operations the accounting core relies on.
///
/// Implementations must evaluate queries with exactly the semantics of
/// [`Query::evaluate`], and may refuse dangerous ones.
pub trait Store {
    /// Error type of the backing store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Entries matching a query, ordered by date.
    fn select_entries(&self, query: &Query<EntryAtom>) -> Result<Vec<Entry>, Self::Error>;

    /// The entry with an id.
    fn select_entry(&self, id: &str) -> Result<Option<Entry>, Self::Error>;

    /// Insert or replace an entry, assigning an id when it has none.
    fn upsert_entry(&mut self, entry: &mut Entry) -> Result<bool, Self::Error>;

    /// Delete the entries matching a query, returning how many went.
    fn delete_entries(&mut self, query: &Query<EntryAtom>) -> Result<usize, Self::Error>;

    /// The instrument with an id.
    fn select_instrument(&self, id: &str) -> Result<Option<Instrument>, Self::Error>;

    /// Instruments matching a query.
    fn select_instruments(
        &self,
        query: &Query<DistributedAtom>,
    ) -> Result<Vec<Instrument>, Self::Error>;

    /// Insert or replace an instrument, assigning an id when it has none.
    fn upsert_instrument(&mut self, instrument: &mut Instrument) -> Result<bool, Self::Error>;
}

/// Errors that can occur in the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error reading or writing the ledger file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The ledger file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The ledger file is not a valid document.
    #[error("invalid ledger document {path}: {source}")]
    Json {
        /// The ledger file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A dangerous query was refused.
    #[error("refusing dangerous {target} query; allow dangerous queries to run it")]
    DangerousQuery {
        /// Record kind queried.
        target: &'static str,
    },
}
