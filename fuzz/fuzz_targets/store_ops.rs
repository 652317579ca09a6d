//! Fuzz harness for the interval store's mutation and query paths.
//!
//! Interprets the input as a stream of insert/set/remove/find/clear ops and
//! cross-checks every find against a brute-force scan of a shadow list.
//! Target: `daygrid_interval::IntervalStore`

#![no_main]

use daygrid_interval::{EntryKey, IntervalStore};
use libfuzzer_sys::fuzz_target;

fn overlaps(start: i64, end: i64, qs: i64, qe: i64) -> bool {
    start <= qe && end >= qs && (start == end || qs == qe || (start != qe && end != qs))
}

fuzz_target!(|data: &[u8]| {
    let mut store: IntervalStore<u32> = IntervalStore::new();
    let mut shadow: Vec<(EntryKey, i64, i64)> = Vec::new();
    let mut n = 0u32;

    for chunk in data.chunks_exact(3) {
        let (op, a, b) = (chunk[0], chunk[1] as i8 as i64, chunk[2] as i8 as i64);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        match op % 5 {
            0 => {
                let key = store.insert(n, lo, hi).expect("ordered interval rejected");
                shadow.push((key, lo, hi));
                n += 1;
            }
            1 => {
                if !shadow.is_empty() {
                    let i = (a as usize).wrapping_mul(31).wrapping_add(b as usize)
                        % shadow.len();
                    let (key, ..) = shadow[i];
                    if store.set(key, lo, hi).expect("ordered interval rejected") {
                        shadow[i] = (key, lo, hi);
                    }
                }
            }
            2 => {
                if !shadow.is_empty() {
                    let i = (a as usize) % shadow.len();
                    let (key, ..) = shadow.remove(i);
                    assert!(store.remove(key).is_some());
                    assert!(store.remove(key).is_none());
                }
            }
            3 => {
                let mut expected: Vec<EntryKey> = shadow
                    .iter()
                    .filter(|&&(_, s, e)| overlaps(s, e, lo, hi))
                    .map(|&(key, ..)| key)
                    .collect();
                let mut found = store.find(lo, hi);
                expected.sort();
                found.sort();
                assert_eq!(found, expected);
            }
            _ => {
                store.clear();
                shadow.clear();
            }
        }
        assert_eq!(store.len(), shadow.len());
    }
});
