use indexmap::IndexMap;

use crate::value::Value;

/// Script-level set, keyed by element hash code in insertion order.
#[derive(Debug, Default)]
pub(crate) struct SetObj {
    entries: IndexMap<i64, Value>,
}

impl SetObj {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has(&self, hash: i64) -> bool {
        self.entries.contains_key(&hash)
    }

    pub fn add(&mut self, hash: i64, value: Value) {
        self.entries.insert(hash, value);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get_index(&self, index: usize) -> Option<(i64, &Value)> {
        self.entries.get_index(index).map(|(&h, v)| (h, v))
    }

    pub fn hashes(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }
}
