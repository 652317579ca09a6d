//! Shared test fixtures for the daygrid crates.
//!
//! Keeping these in a microcrate avoids copy-paste across the interval,
//! selection, and snapshot test suites.

use std::cell::RefCell;
use std::rc::Rc;

use daygrid_interval::{EntryKey, IntervalStore, ListenerKey, StoreEvent};

/// An owned record of one store event, safe to hold after the borrowed
/// [`StoreEvent`] is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRecord {
    Added {
        key: EntryKey,
        start: i64,
        end: i64,
    },
    Changed {
        key: EntryKey,
        old_start: i64,
        old_end: i64,
        new_start: i64,
        new_end: i64,
    },
    Removed {
        key: EntryKey,
        start: i64,
        end: i64,
    },
}

impl EventRecord {
    fn from_event<T>(event: StoreEvent<'_, T>) -> Self {
        match event {
            StoreEvent::Added { key, start, end, .. } => EventRecord::Added { key, start, end },
            StoreEvent::Changed {
                key,
                old_start,
                old_end,
                new_start,
                new_end,
                ..
            } => EventRecord::Changed { key, old_start, old_end, new_start, new_end },
            StoreEvent::Removed { key, start, end, .. } => {
                EventRecord::Removed { key, start, end }
            }
        }
    }
}

/// Collects store events into a shared log for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    log: Rc<RefCell<Vec<EventRecord>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a closure suitable for any listener registration point.
    pub fn sink<T>(&self) -> impl FnMut(StoreEvent<'_, T>) + 'static {
        let log = Rc::clone(&self.log);
        move |event| log.borrow_mut().push(EventRecord::from_event(event))
    }

    /// Registers this recorder with a store.
    pub fn attach<T>(&self, store: &mut IntervalStore<T>) -> ListenerKey {
        store.add_listener(self.sink())
    }

    /// A copy of everything recorded so far, in dispatch order.
    pub fn events(&self) -> Vec<EventRecord> {
        self.log.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

/// The documented overlap contract, written straight from its definition.
/// Property tests use this as the brute-force oracle for `find`.
pub fn oracle_overlaps(start: i64, end: i64, query_start: i64, query_end: i64) -> bool {
    start <= query_end
        && end >= query_start
        && (start == end
            || query_start == query_end
            || (start != query_end && end != query_start))
}

/// Builds a store of numbered entries from `(start, end)` pairs, returning
/// the keys in insertion order. Pairs with `start > end` are rejected by the
/// store, so fixtures must supply valid intervals.
pub fn store_from_pairs(pairs: &[(i64, i64)]) -> (IntervalStore<usize>, Vec<EntryKey>) {
    let mut store = IntervalStore::new();
    let keys = pairs
        .iter()
        .enumerate()
        .map(|(n, &(start, end))| {
            store
                .insert(n, start, end)
                .unwrap_or_else(|err| panic!("fixture interval {n} rejected: {err}"))
        })
        .collect();
    (store, keys)
}
