use indexmap::IndexMap;

use crate::value::Value;

/// Script-level map.
///
/// Entries are keyed by the key's script-level hash code and keep insertion
/// order; re-inserting an existing key replaces the entry in place.
#[derive(Debug, Default)]
pub(crate) struct MapObj {
    entries: IndexMap<i64, (Value, Value)>,
}

impl MapObj {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, hash: i64) -> Option<&(Value, Value)> {
        self.entries.get(&hash)
    }

    pub fn insert(&mut self, hash: i64, key: Value, value: Value) {
        self.entries.insert(hash, (key, value));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get_index(&self, index: usize) -> Option<(i64, &(Value, Value))> {
        self.entries.get_index(index).map(|(&h, e)| (h, e))
    }
}
