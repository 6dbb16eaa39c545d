use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

/// A memo table whose entries all belong to one project generation.
///
/// Lookups for any other generation miss. Inserting for a newer generation drops every entry
/// first; inserting for an older one is a no-op, so a result computed against an outdated
/// snapshot never becomes visible. No lock is held while values are computed.
#[derive(Debug)]
pub(crate) struct MemoTable<K, V> {
    state: RwLock<MemoState<K, V>>,
}

#[derive(Debug)]
struct MemoState<K, V> {
    generation: u64,
    entries: HashMap<K, V>,
}

impl<K, V> MemoTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            state: RwLock::new(MemoState {
                generation,
                entries: HashMap::new(),
            }),
        }
    }

    pub(crate) fn get(&self, generation: u64, key: &K) -> Option<V> {
        let state = self.state.read();
        if state.generation != generation {
            return None;
        }
        state.entries.get(key).cloned()
    }

    /// Stores `value` unless the table already moved past `generation`.
    ///
    /// Returns the value readers of `generation` will observe: an entry stored concurrently by
    /// another computation wins over `value`.
    pub(crate) fn insert(&self, generation: u64, key: K, value: V) -> V {
        let mut state = self.state.write();
        if state.generation > generation {
            return value;
        }
        if state.generation < generation {
            state.entries.clear();
            state.generation = generation;
        }
        state.entries.entry(key).or_insert(value).clone()
    }

    /// Drops every entry and moves the table to `generation` (never backwards).
    pub(crate) fn invalidate(&self, generation: u64) {
        let mut state = self.state.write();
        state.entries.clear();
        state.generation = state.generation.max(generation);
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().entries.len()
    }
}
