//! Snapshot capture and restore for the daygrid interval store.
//!
//! A [`Snapshot`] carries a store's entries across a suspend/resume boundary
//! as four parallel arrays. Restoring rebuilds the store without dispatching
//! any events and recomputes the derived invariants from scratch; the max-end
//! augmentation is deliberately not part of the wire format, so a future
//! version is free to change how it is maintained.

use daygrid_interval::{IntervalStore, InvalidInterval};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot decode/restore failure. Restore is atomic: on error, no store is
/// constructed and nothing is truncated to fit.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot declares {len} entries but the {field} array holds {actual}")]
    LengthMismatch {
        field: &'static str,
        len: usize,
        actual: usize,
    },
    #[error("snapshot contains an invalid interval: {0}")]
    Invalid(#[from] InvalidInterval),
    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted state of one [`IntervalStore`]: entry count plus parallel
/// value/start/end arrays in start-sorted order. Opaque to every consumer but
/// [`restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub len: usize,
    pub values: Vec<T>,
    pub starts: Vec<i64>,
    pub ends: Vec<i64>,
}

impl<T: Serialize> Snapshot<T> {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> Snapshot<T> {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Captures a store's entire entry state.
pub fn snapshot<T: Clone>(store: &IntervalStore<T>) -> Snapshot<T> {
    let len = store.len();
    let mut values = Vec::with_capacity(len);
    let mut starts = Vec::with_capacity(len);
    let mut ends = Vec::with_capacity(len);
    for (_, value, start, end) in store.iter() {
        values.push(value.clone());
        starts.push(start);
        ends.push(end);
    }
    Snapshot { len, values, starts, ends }
}

/// Reconstructs a store from a snapshot.
///
/// Every array length must equal the declared entry count and every interval
/// must satisfy `start <= end`. The rebuilt store fires no events; its
/// max-end augmentation and key-to-index map are recomputed, never trusted
/// from the blob. Entry keys are freshly assigned and do not survive the
/// round trip.
pub fn restore<T>(snapshot: Snapshot<T>) -> Result<IntervalStore<T>, SnapshotError> {
    let Snapshot { len, values, starts, ends } = snapshot;
    check_len("values", len, values.len())?;
    check_len("starts", len, starts.len())?;
    check_len("ends", len, ends.len())?;

    let entries = values
        .into_iter()
        .zip(starts)
        .zip(ends)
        .map(|((value, start), end)| (value, start, end));
    Ok(IntervalStore::from_entries(entries)?)
}

fn check_len(field: &'static str, len: usize, actual: usize) -> Result<(), SnapshotError> {
    if actual != len {
        Err(SnapshotError::LengthMismatch { field, len, actual })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daygrid_selection::SelectionOverlay;
    use daygrid_testkit::RecordingListener;
    use proptest::prelude::*;

    fn sample_store() -> IntervalStore<String> {
        let mut store = IntervalStore::new();
        let c = store.insert("c".to_string(), 2, 4).unwrap();
        store.insert("a".to_string(), 1, 1).unwrap();
        store.insert("b".to_string(), 2, 2).unwrap();
        store.insert("d".to_string(), 4, 4).unwrap();
        store.remove(c);
        store
    }

    #[test]
    fn round_trip_preserves_entries_and_queries() {
        let store = sample_store();
        let restored = restore(snapshot(&store)).unwrap();

        assert_eq!(restored.len(), store.len());
        let original: Vec<(String, i64, i64)> = store
            .iter()
            .map(|(_, v, s, e)| (v.clone(), s, e))
            .collect();
        let rebuilt: Vec<(String, i64, i64)> = restored
            .iter()
            .map(|(_, v, s, e)| (v.clone(), s, e))
            .collect();
        assert_eq!(rebuilt, original);

        for query_start in -1..7 {
            for query_end in query_start..7 {
                let names = |store: &IntervalStore<String>| -> Vec<String> {
                    store
                        .find(query_start, query_end)
                        .into_iter()
                        .map(|k| store.get(k).unwrap().clone())
                        .collect()
                };
                assert_eq!(names(&restored), names(&store), "({query_start},{query_end})");
            }
        }
    }

    #[test]
    fn restore_fires_no_events() {
        let mut restored = restore(snapshot(&sample_store())).unwrap();
        let recorder = RecordingListener::new();
        recorder.attach(&mut restored);
        assert!(recorder.is_empty());

        // The restored store is live: mutations notify as usual.
        restored.insert("e".to_string(), 9, 9).unwrap();
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn json_round_trip() {
        let store = sample_store();
        let json = snapshot(&store).to_json().unwrap();
        let decoded: Snapshot<String> = Snapshot::from_json(&json).unwrap();
        assert_eq!(decoded, snapshot(&store));

        assert!(matches!(
            Snapshot::<String>::from_json("not json"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut blob = snapshot(&sample_store());
        blob.starts.pop();
        assert!(matches!(
            restore(blob),
            Err(SnapshotError::LengthMismatch { field: "starts", .. })
        ));

        let mut blob = snapshot(&sample_store());
        blob.len += 1;
        assert!(matches!(
            restore(blob),
            Err(SnapshotError::LengthMismatch { field: "values", .. })
        ));
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let mut blob = snapshot(&sample_store());
        blob.starts[0] = 10;
        blob.ends[0] = 5;
        assert!(matches!(restore(blob), Err(SnapshotError::Invalid(_))));
    }

    #[test]
    fn unsorted_snapshot_is_resorted_on_restore() {
        let blob = Snapshot {
            len: 2,
            values: vec!["late".to_string(), "early".to_string()],
            starts: vec![9, 1],
            ends: vec![9, 1],
        };
        let restored = restore(blob).unwrap();
        let in_order: Vec<String> = restored.iter().map(|(_, v, ..)| v.clone()).collect();
        assert_eq!(in_order, vec!["early".to_string(), "late".to_string()]);
    }

    #[test]
    fn selection_overlay_round_trip() {
        let mut overlay: SelectionOverlay<u8> = SelectionOverlay::new();
        overlay.select("range", 10, 14, 1).unwrap();
        overlay.select("dot", 12, 12, 2).unwrap();

        let blob = snapshot(overlay.store());
        let restored = SelectionOverlay::from_store(restore(blob).unwrap());

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.find_by_tag("range").len(), 1);
        assert_eq!(restored.find(12, 12).len(), 2);
    }

    proptest! {
        // Restoring a captured store reproduces identical find results for
        // every query range, and identical size.
        #[test]
        fn round_trip_is_query_identical(
            pairs in proptest::collection::vec(
                (-30i64..30, 0i64..10).prop_map(|(s, len)| (s, s + len)),
                0..30
            ),
            (query_start, query_end) in (-35i64..35, 0i64..12).prop_map(|(s, len)| (s, s + len))
        ) {
            let (store, _) = daygrid_testkit::store_from_pairs(&pairs);
            let restored = restore(snapshot(&store)).unwrap();

            prop_assert_eq!(restored.len(), store.len());
            let values = |store: &IntervalStore<usize>| -> Vec<usize> {
                store
                    .find(query_start, query_end)
                    .into_iter()
                    .map(|k| *store.get(k).unwrap())
                    .collect()
            };
            prop_assert_eq!(values(&restored), values(&store));
        }
    }
}
