//! Interval-indexed store for daygrid.
//!
//! This crate provides [`IntervalStore`], a flat-array interval structure over
//! epoch-day coordinates. It supports insert/update/remove keyed by a stable
//! entry handle, efficient "which entries overlap this range" queries, and
//! synchronous per-entry change notifications.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Error returned when a caller supplies an interval whose start is after its end.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid interval: start {start} is after end {end}")]
pub struct InvalidInterval {
    pub start: i64,
    pub end: i64,
}

impl InvalidInterval {
    /// Validates that `start <= end`.
    pub fn check(start: i64, end: i64) -> Result<(), InvalidInterval> {
        if start > end {
            Err(InvalidInterval { start, end })
        } else {
            Ok(())
        }
    }
}

/// Stable handle identifying one entry in one [`IntervalStore`].
///
/// Keys are assigned at insertion, never reused within a store, and stand in
/// for reference identity: two structurally equal values inserted twice are
/// two independent entries with distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(u64);

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

/// A change notification, dispatched synchronously after the store's
/// invariants have been restored.
#[derive(Debug)]
pub enum StoreEvent<'a, T> {
    /// A new entry entered the store.
    Added {
        key: EntryKey,
        value: &'a T,
        start: i64,
        end: i64,
    },
    /// An existing entry's interval was replaced in place.
    Changed {
        key: EntryKey,
        value: &'a T,
        old_start: i64,
        old_end: i64,
        new_start: i64,
        new_end: i64,
    },
    /// An entry left the store.
    Removed {
        key: EntryKey,
        value: &'a T,
        start: i64,
        end: i64,
    },
}

impl<T> Clone for StoreEvent<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StoreEvent<'_, T> {}

/// Callback registered with [`IntervalStore::add_listener`].
///
/// Listeners run in registration order, in-line during the mutating call.
/// A listener must not re-enter the store.
pub type Listener<T> = Box<dyn FnMut(StoreEvent<'_, T>)>;

/// Interval-indexed store of `(value, start, end)` entries.
///
/// Entries live in parallel arrays sorted by non-decreasing `start`. Overlap
/// queries descend an implicit binary tree imposed over those arrays, pruning
/// subtrees via a per-node maximum-`end` augmentation. All mutating
/// operations restore the structure's invariants before any listener runs.
///
/// The implicit layout is only balanced when insertions arrive in increasing
/// start order; other orders degrade query time, not correctness.
pub struct IntervalStore<T> {
    keys: Vec<EntryKey>,
    values: Vec<T>,
    starts: Vec<i64>,
    ends: Vec<i64>,
    // Max `end` within each tree node's subtree; i64::MIN for empty subtrees.
    max_ends: Vec<i64>,
    index_of: HashMap<EntryKey, usize>,
    // Lowest index whose index_of entry may be stale; usize::MAX when clean.
    low_water_mark: usize,
    next_key: u64,
    next_listener: u64,
    listeners: Vec<(ListenerKey, Listener<T>)>,
}

// The arrays double as the in-order traversal of a perfect binary tree, so
// entry i is both "the i-th entry in start order" and a tree node:
//
// * a node is interior iff its index has a trailing 1-bit; value-bearing
//   leaves sit at even indices,
// * the root is (highest power of two <= len) - 1,
// * a node of height h (h = trailing ones in its index) has children at
//   i -/+ 2^(h-1).
//
// Interior node indices may lie at or beyond len; their left subtrees can
// still hold live entries, so traversals visit them but only read the entry
// arrays for i < len.

fn is_interior(i: usize) -> bool {
    i & 1 != 0
}

fn tree_root(len: usize) -> usize {
    debug_assert!(len > 0);
    (1usize << len.ilog2()) - 1
}

fn left_child(i: usize) -> usize {
    i - (((i + 1) & !i) >> 1)
}

fn right_child(i: usize) -> usize {
    i + (((i + 1) & !i) >> 1)
}

/// The overlap contract for `find`, including its asymmetric tie-break: a
/// degenerate entry or a degenerate query matches on a shared endpoint, but a
/// nondegenerate query merely touching a nondegenerate entry's boundary does
/// not count as overlap.
fn overlaps(start: i64, end: i64, query_start: i64, query_end: i64) -> bool {
    start <= query_end
        && end >= query_start
        && (start == end
            || query_start == query_end
            || (start != query_end && end != query_start))
}

impl<T> IntervalStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            starts: Vec::new(),
            ends: Vec::new(),
            max_ends: Vec::new(),
            index_of: HashMap::new(),
            low_water_mark: usize::MAX,
            next_key: 0,
            next_listener: 0,
            listeners: Vec::new(),
        }
    }

    /// Builds a store from `(value, start, end)` entries without dispatching
    /// any events. Used by the snapshot restore path.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (T, i64, i64)>,
    ) -> Result<Self, InvalidInterval> {
        let mut store = Self::new();
        for (value, start, end) in entries {
            InvalidInterval::check(start, end)?;
            store.push_entry(value, start, end);
        }
        store.restore_invariants();
        Ok(store)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_key(&self, key: EntryKey) -> bool {
        self.index_of.contains_key(&key)
    }

    /// Returns the value for a live entry.
    pub fn get(&self, key: EntryKey) -> Option<&T> {
        self.index_of.get(&key).map(|&i| &self.values[i])
    }

    /// Returns the `(start, end)` interval for a live entry.
    pub fn interval(&self, key: EntryKey) -> Option<(i64, i64)> {
        self.index_of.get(&key).map(|&i| (self.starts[i], self.ends[i]))
    }

    /// Iterates entries in start-sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryKey, &T, i64, i64)> {
        (0..self.keys.len())
            .map(move |i| (self.keys[i], &self.values[i], self.starts[i], self.ends[i]))
    }

    /// Inserts a new entry and fires one `Added` event.
    ///
    /// The entry is appended to the backing arrays; the invariant-restore
    /// pass then moves it into its start-sorted position, shifting only the
    /// slice in between.
    pub fn insert(&mut self, value: T, start: i64, end: i64) -> Result<EntryKey, InvalidInterval> {
        InvalidInterval::check(start, end)?;
        let key = self.push_entry(value, start, end);
        self.restore_invariants();

        let mut listeners = std::mem::take(&mut self.listeners);
        let i = self.index_of[&key];
        let event = StoreEvent::Added { key, value: &self.values[i], start, end };
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
        self.listeners = listeners;
        Ok(key)
    }

    /// Replaces the interval of a live entry in place and fires one `Changed`
    /// event carrying both the old and the new interval. Returns `Ok(false)`
    /// without firing anything if the key is not in the store.
    pub fn set(&mut self, key: EntryKey, start: i64, end: i64) -> Result<bool, InvalidInterval> {
        InvalidInterval::check(start, end)?;
        let Some(&i) = self.index_of.get(&key) else {
            return Ok(false);
        };
        let old_start = self.starts[i];
        let old_end = self.ends[i];
        self.starts[i] = start;
        self.ends[i] = end;
        self.restore_invariants();

        let mut listeners = std::mem::take(&mut self.listeners);
        let i = self.index_of[&key];
        let event = StoreEvent::Changed {
            key,
            value: &self.values[i],
            old_start,
            old_end,
            new_start: start,
            new_end: end,
        };
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
        self.listeners = listeners;
        Ok(true)
    }

    /// Removes an entry, fires one `Removed` event, and hands the value back.
    /// No-op returning `None` for an absent key.
    pub fn remove(&mut self, key: EntryKey) -> Option<T> {
        let i = self.index_of.remove(&key)?;
        self.keys.remove(i);
        let value = self.values.remove(i);
        let start = self.starts.remove(i);
        let end = self.ends.remove(i);
        self.invalidate_index(i);
        self.restore_invariants();

        let mut listeners = std::mem::take(&mut self.listeners);
        let event = StoreEvent::Removed { key, value: &value, start, end };
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
        self.listeners = listeners;
        Some(value)
    }

    /// Removes every entry, highest index first, firing one `Removed` event
    /// per entry so consumers can react individually even on a bulk clear.
    pub fn clear(&mut self) {
        let mut listeners = std::mem::take(&mut self.listeners);
        loop {
            let (Some(key), Some(value), Some(start), Some(end)) = (
                self.keys.pop(),
                self.values.pop(),
                self.starts.pop(),
                self.ends.pop(),
            ) else {
                break;
            };
            self.index_of.remove(&key);
            let event = StoreEvent::Removed { key, value: &value, start, end };
            for (_, listener) in listeners.iter_mut() {
                listener(event);
            }
        }
        self.listeners = listeners;
        self.max_ends.clear();
        self.low_water_mark = usize::MAX;
    }

    /// Returns the keys of every entry overlapping the closed query interval,
    /// in start-sorted order.
    ///
    /// Two-phase descent over the implicit tree: first count the matches,
    /// pruning subtrees whose max `end` falls short of `query_start`, then
    /// allocate exactly that many slots and refill via the same traversal.
    pub fn find(&self, query_start: i64, query_end: i64) -> Vec<EntryKey> {
        if self.keys.is_empty() {
            return Vec::new();
        }
        let root = tree_root(self.keys.len());
        let count = self.count_matches(query_start, query_end, root);
        if count == 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(count);
        self.collect_matches(query_start, query_end, root, count, &mut out);
        out
    }

    /// Registers a listener; it will observe every subsequent event until
    /// removed. Returns a handle for [`IntervalStore::remove_listener`].
    pub fn add_listener(
        &mut self,
        listener: impl FnMut(StoreEvent<'_, T>) + 'static,
    ) -> ListenerKey {
        let key = ListenerKey(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((key, Box::new(listener)));
        key
    }

    /// Unregisters a listener. Returns whether it was present.
    pub fn remove_listener(&mut self, key: ListenerKey) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(k, _)| *k != key);
        self.listeners.len() != before
    }

    fn push_entry(&mut self, value: T, start: i64, end: i64) -> EntryKey {
        let key = EntryKey(self.next_key);
        self.next_key += 1;
        let appended = self.keys.len();
        self.keys.push(key);
        self.values.push(value);
        self.starts.push(start);
        self.ends.push(end);
        self.invalidate_index(appended);
        key
    }

    fn invalidate_index(&mut self, i: usize) {
        self.low_water_mark = self.low_water_mark.min(i);
    }

    /// Re-establishes I1 (sortedness), I2 (max augmentation), and I3 (the
    /// key-to-index map) after a mutation. Runs before any event dispatch.
    fn restore_invariants(&mut self) {
        let len = self.keys.len();
        if len == 0 {
            return;
        }

        // I1: starts non-decreasing. After any single mutation at most one
        // entry is out of place; one insertion pass moves it home and shifts
        // only the slice in between.
        for i in 1..len {
            if self.starts[i] < self.starts[i - 1] {
                let start = self.starts[i];
                let mut j = i;
                while j > 0 && start < self.starts[j - 1] {
                    j -= 1;
                }
                self.keys[j..=i].rotate_right(1);
                self.values[j..=i].rotate_right(1);
                self.starts[j..=i].rotate_right(1);
                self.ends[j..=i].rotate_right(1);
                self.invalidate_index(j);
            }
        }

        // I2: room for every interior node of the smallest perfect tree
        // covering len entries, then recompute the augmentation.
        let root = tree_root(len);
        let tree_size = 2 * root + 1;
        if self.max_ends.len() < tree_size {
            self.max_ends.resize(tree_size, i64::MIN);
        }
        self.calc_max(root);

        // I3: rebuild the index map from the low water mark up.
        for i in self.low_water_mark.min(len)..len {
            self.index_of.insert(self.keys[i], i);
        }
        self.low_water_mark = usize::MAX;
    }

    fn calc_max(&mut self, i: usize) -> i64 {
        let mut m = i64::MIN;
        if is_interior(i) {
            m = self.calc_max(left_child(i));
        }
        if i < self.keys.len() {
            m = m.max(self.ends[i]);
            if is_interior(i) {
                m = m.max(self.calc_max(right_child(i)));
            }
        }
        self.max_ends[i] = m;
        m
    }

    fn count_matches(&self, query_start: i64, query_end: i64, i: usize) -> usize {
        let mut count = 0;
        if is_interior(i) {
            let left = left_child(i);
            if self.max_ends[left] >= query_start {
                count = self.count_matches(query_start, query_end, left);
            }
        }
        if i < self.keys.len() {
            let start = self.starts[i];
            // Starts are sorted, so nothing to the right can match either.
            if start <= query_end {
                if overlaps(start, self.ends[i], query_start, query_end) {
                    count += 1;
                }
                if is_interior(i) {
                    count += self.count_matches(query_start, query_end, right_child(i));
                }
            }
        }
        count
    }

    fn collect_matches(
        &self,
        query_start: i64,
        query_end: i64,
        i: usize,
        limit: usize,
        out: &mut Vec<EntryKey>,
    ) {
        if is_interior(i) {
            let left = left_child(i);
            if self.max_ends[left] >= query_start {
                self.collect_matches(query_start, query_end, left, limit, out);
            }
        }
        if i >= self.keys.len() {
            return;
        }
        let start = self.starts[i];
        if start <= query_end {
            if overlaps(start, self.ends[i], query_start, query_end) {
                out.push(self.keys[i]);
            }
            if out.len() < limit && is_interior(i) {
                self.collect_matches(query_start, query_end, right_child(i), limit, out);
            }
        }
    }
}

impl<T: Clone> IntervalStore<T> {
    /// Returns a new store holding clones of the entries overlapping
    /// `[start, end]`, rebased so that `start` becomes day 0 and clamped to
    /// `[0, end - start]`. No events fire on the new store.
    ///
    /// Month views use this to work in month-local coordinates.
    pub fn slice(&self, start: i64, end: i64) -> IntervalStore<T> {
        let mut sliced = IntervalStore::new();
        if start > end {
            return sliced;
        }
        let span = end - start;
        for key in self.find(start, end) {
            if let (Some(value), Some((entry_start, entry_end))) =
                (self.get(key), self.interval(key))
            {
                sliced.push_entry(
                    value.clone(),
                    (entry_start - start).clamp(0, span),
                    (entry_end - start).clamp(0, span),
                );
            }
        }
        sliced.restore_invariants();
        sliced
    }
}

impl<T> Default for IntervalStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for IntervalStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value, start, end) in self.iter() {
            map.entry(&key, &(value, start, end));
        }
        map.finish()
    }
}
