//! In-memory list of persisted entries.
//!
//! [`EntryStore`] keeps the client's view in step with the backend after
//! each completed operation, without reloading. Its only mutations are
//! [`append`](EntryStore::append), [`replace`](EntryStore::replace) and
//! [`remove`](EntryStore::remove). Order is insertion order: the initial
//! load followed by appends. Nothing re-sorts it.

use crate::entry::TravelEntry;
use crate::error::CoreError;
use crate::photo::Photo;
use crate::types::EntryId;

#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Vec<TravelEntry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store from an initial load, keeping the backend's order.
    pub fn from_loaded(entries: Vec<TravelEntry>) -> Self {
        Self { entries }
    }

    // ---- mutations ----

    /// Append a newly created entry to the tail.
    ///
    /// The entry must carry its backend id, and the id must not already
    /// be in the list.
    pub fn append(&mut self, entry: TravelEntry) -> Result<(), CoreError> {
        let id = entry.id.ok_or_else(|| {
            CoreError::Validation("cannot append an entry without a backend id".into())
        })?;
        if self.position(id).is_some() {
            return Err(CoreError::Conflict(format!("entry {id} is already listed")));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Replace the entry with the same id in place.
    ///
    /// Returns `false` (and changes nothing) if no entry has that id.
    pub fn replace(&mut self, entry: TravelEntry) -> bool {
        let Some(idx) = entry.id.and_then(|id| self.position(id)) else {
            return false;
        };
        self.entries[idx] = entry;
        true
    }

    /// Remove the entry with `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: EntryId) -> Option<TravelEntry> {
        let idx = self.position(id)?;
        Some(self.entries.remove(idx))
    }

    // ---- reads ----

    pub fn entries(&self) -> &[TravelEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&TravelEntry> {
        self.entries.iter().find(|e| e.id == Some(id))
    }

    /// Like [`get`](Self::get), but a missing entry is an error.
    pub fn require(&self, id: EntryId) -> Result<&TravelEntry, CoreError> {
        self.get(id).ok_or(CoreError::NotFound(id))
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().filter_map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Thumbnail photo for the entry card.
    pub fn thumbnail_of(&self, id: EntryId) -> Option<&Photo> {
        self.get(id).and_then(TravelEntry::thumbnail)
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == Some(id))
    }
}
