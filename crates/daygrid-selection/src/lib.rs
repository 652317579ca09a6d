//! Tagged selection overlay for daygrid.
//!
//! [`SelectionOverlay`] wraps one [`IntervalStore`] of [`Selection`] values,
//! adding tag-grouped replace/remove on top of the store's interval
//! operations. Tags are consumer-assigned labels and need not be unique;
//! the highlight handle is opaque to this layer.

use daygrid_interval::{
    EntryKey, IntervalStore, InvalidInterval, ListenerKey, StoreEvent,
};
use serde::{Deserialize, Serialize};

/// One selection: a tag grouping it with its peers and an opaque highlight
/// handle the rendering layer attaches. The selected interval itself lives in
/// the store entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection<H> {
    pub tag: String,
    pub highlight: H,
}

impl<H> Selection<H> {
    pub fn new(tag: impl Into<String>, highlight: H) -> Self {
        Self { tag: tag.into(), highlight }
    }
}

/// A collection of selections over epoch-day intervals.
///
/// Single-threaded and synchronous, like the store it wraps. Selection
/// counts are small, so tag lookups are linear scans over the sorted
/// entries rather than a secondary index.
pub struct SelectionOverlay<H> {
    store: IntervalStore<Selection<H>>,
}

impl<H> SelectionOverlay<H> {
    pub fn new() -> Self {
        Self { store: IntervalStore::new() }
    }

    /// Wraps an existing store, e.g. one rebuilt from a snapshot.
    pub fn from_store(store: IntervalStore<Selection<H>>) -> Self {
        Self { store }
    }

    /// Adds a selection without touching existing entries under the tag.
    pub fn select(
        &mut self,
        tag: impl Into<String>,
        start: i64,
        end: i64,
        highlight: H,
    ) -> Result<EntryKey, InvalidInterval> {
        self.store.insert(Selection::new(tag, highlight), start, end)
    }

    /// Replaces every selection under `tag` with a single new one.
    ///
    /// Removal happens before the insert so listeners never observe two live
    /// selections under the tag at once; consumers hold tag-uniqueness
    /// invariants on top of this ordering. The interval is validated first so
    /// a rejected insert cannot leave the tag emptied.
    pub fn replace_by_tag(
        &mut self,
        tag: impl Into<String>,
        start: i64,
        end: i64,
        highlight: H,
    ) -> Result<EntryKey, InvalidInterval> {
        InvalidInterval::check(start, end)?;
        let tag = tag.into();
        self.remove_by_tag(&tag);
        self.store.insert(Selection::new(tag, highlight), start, end)
    }

    /// Removes every selection whose tag matches, firing one `Removed` event
    /// each. Returns how many were removed.
    pub fn remove_by_tag(&mut self, tag: &str) -> usize {
        let matches = self.find_by_tag(tag);
        let mut removed = 0;
        for key in matches {
            if self.store.remove(key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Keys of every selection under `tag`, in start-sorted order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<EntryKey> {
        self.store
            .iter()
            .filter(|(_, selection, _, _)| selection.tag == tag)
            .map(|(key, ..)| key)
            .collect()
    }

    /// Keys of every selection overlapping the closed query interval.
    pub fn find(&self, query_start: i64, query_end: i64) -> Vec<EntryKey> {
        self.store.find(query_start, query_end)
    }

    pub fn get(&self, key: EntryKey) -> Option<&Selection<H>> {
        self.store.get(key)
    }

    pub fn interval(&self, key: EntryKey) -> Option<(i64, i64)> {
        self.store.interval(key)
    }

    pub fn remove(&mut self, key: EntryKey) -> Option<Selection<H>> {
        self.store.remove(key)
    }

    /// Removes every selection, one `Removed` event per entry.
    pub fn clear_all(&mut self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryKey, &Selection<H>, i64, i64)> {
        self.store.iter()
    }

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(StoreEvent<'_, Selection<H>>) + 'static,
    ) -> ListenerKey {
        self.store.add_listener(listener)
    }

    pub fn remove_listener(&mut self, key: ListenerKey) -> bool {
        self.store.remove_listener(key)
    }

    /// The underlying store, for snapshotting.
    pub fn store(&self) -> &IntervalStore<Selection<H>> {
        &self.store
    }
}

impl<H> Default for SelectionOverlay<H> {
    fn default() -> Self {
        Self::new()
    }
}
