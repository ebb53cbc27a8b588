//! The in-memory document store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tally_core::{Entry, Instrument};
use tally_query::{DistributedAtom, EntryAtom, Query};
use tally_schedule::regularize;

use crate::{Store, StoreError};

/// Store behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Run dangerous queries instead of refusing them.
    #[serde(default)]
    pub allow_dangerous: bool,
}

/// The persisted ledger document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// All entries.
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// All instruments.
    #[serde(default)]
    pub instruments: Vec<Instrument>,
}

/// Entries and instruments held in ordered maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Entry>,
    instruments: BTreeMap<String, Instrument>,
    next_id: u64,
    options: StoreOptions,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the options.
    #[must_use]
    pub const fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// A store holding a ledger document.
    ///
    /// Records without an id get one.
    #[must_use]
    pub fn from_ledger(ledger: Ledger) -> Self {
        let mut store = Self::new();
        for mut entry in ledger.entries {
            store.put_entry(&mut entry);
        }
        for mut instrument in ledger.instruments {
            store.put_instrument(&mut instrument);
        }
        store
    }

    /// The ledger document of the store's current contents.
    #[must_use]
    pub fn to_ledger(&self) -> Ledger {
        Ledger {
            entries: self.entries.values().cloned().collect(),
            instruments: self.instruments.values().cloned().collect(),
        }
    }

    /// Load a ledger file; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "ledger file not found, starting empty");
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ledger: Ledger = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            entries = ledger.entries.len(),
            instruments = ledger.instruments.len(),
            "loaded ledger"
        );
        Ok(Self::from_ledger(ledger))
    }

    /// Write the ledger file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.to_ledger()).map_err(|source| {
            StoreError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, text).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Number of entries held.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn put_entry(&mut self, entry: &mut Entry) -> bool {
        if entry.id.is_none() {
            entry.id = Some(fresh_id(&mut self.next_id, |id| self.entries.contains_key(id)));
        }
        entry.link_lines();
        let id = entry.id.clone().unwrap_or_default();
        self.entries.insert(id, entry.clone()).is_none()
    }

    fn put_instrument(&mut self, instrument: &mut Instrument) -> bool {
        if instrument.id.is_empty() {
            instrument.id = fresh_id(&mut self.next_id, |id| self.instruments.contains_key(id));
        }
        self.instruments
            .insert(instrument.id.clone(), instrument.clone())
            .is_none()
    }

    const fn guard(&self, dangerous: bool, target: &'static str) -> Result<(), StoreError> {
        if dangerous && !self.options.allow_dangerous {
            return Err(StoreError::DangerousQuery { target });
        }
        Ok(())
    }
}

fn fresh_id(counter: &mut u64, taken: impl Fn(&str) -> bool) -> String {
    loop {
        *counter += 1;
        let id = format!("{:08x}", *counter);
        if !taken(&id) {
            return id;
        }
    }
}

impl Store for MemoryStore {
    type Error = StoreError;

    fn select_entries(&self, query: &Query<EntryAtom>) -> Result<Vec<Entry>, StoreError> {
        self.guard(query.is_dangerous(), "entry")?;
        let mut found: Vec<Entry> = self
            .entries
            .values()
            .filter(|e| query.evaluate(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    fn select_entry(&self, id: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.entries.get(id).cloned())
    }

    fn upsert_entry(&mut self, entry: &mut Entry) -> Result<bool, StoreError> {
        self.put_entry(entry);
        tracing::debug!(id = ?entry.id, "upserted entry");
        Ok(true)
    }

    fn delete_entries(&mut self, query: &Query<EntryAtom>) -> Result<usize, StoreError> {
        self.guard(query.is_dangerous(), "entry")?;
        let before = self.entries.len();
        self.entries.retain(|_, e| !query.evaluate(e));
        let removed = before - self.entries.len();
        tracing::debug!(removed, "deleted entries");
        Ok(removed)
    }

    fn select_instrument(&self, id: &str) -> Result<Option<Instrument>, StoreError> {
        Ok(self.instruments.get(id).cloned().map(|mut i| {
            regularize(&mut i);
            i
        }))
    }

    fn select_instruments(
        &self,
        query: &Query<DistributedAtom>,
    ) -> Result<Vec<Instrument>, StoreError> {
        self.guard(query.is_dangerous(), "instrument")?;
        Ok(self
            .instruments
            .values()
            .filter(|i| query.evaluate(i))
            .cloned()
            .map(|mut i| {
                regularize(&mut i);
                i
            })
            .collect())
    }

    fn upsert_instrument(&mut self, instrument: &mut Instrument) -> Result<bool, StoreError> {
        self.put_instrument(instrument);
        tracing::debug!(id = %instrument.id, "upserted instrument");
        Ok(true)
    }
}
