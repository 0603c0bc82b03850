//! Merge/dedup engine
//!
//! Combines activities pulled from multiple overlapping sources into one
//! sequence, deduplicated by id and sorted by timestamp descending.
//!
//! Dedup policy: when the same id appears in more than one source, the last
//! occurrence in input-concatenation order wins. This is documented behavior
//! the caller relies on for determinism, not an implementation artifact:
//! sources are iterated in a fixed order (primary, received, organizations,
//! tracked repositories, pseudo-events) and later sources overwrite earlier
//! ones.

use crate::types::Activity;
use std::collections::HashMap;

/// Merge per-source activity sequences into one deduplicated stream.
///
/// The result is non-increasing in timestamp. Activities with equal
/// timestamps keep their input-concatenation order (stable sort over an
/// insertion-ordered dictionary), so the output is fully deterministic.
pub fn merge_sources(sources: Vec<Vec<Activity>>) -> Vec<Activity> {
    // Insertion-ordered dictionary keyed by id: a Vec holding the entries
    // plus an index map. Overwriting on collision keeps the first-seen
    // position, matching ordered-map semantics.
    let mut entries: Vec<Activity> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for activity in sources.into_iter().flatten() {
        match index.get(&activity.id) {
            Some(&slot) => entries[slot] = activity,
            None => {
                index.insert(activity.id.clone(), entries.len());
                entries.push(activity);
            }
        }
    }

    // sort_by is stable: equal timestamps keep insertion order.
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}
