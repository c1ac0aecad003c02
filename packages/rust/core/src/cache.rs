//! Single-entry memo cache for service responses.
//!
//! Records are processed in order and consecutive records usually share a
//! context, so remembering only the last response catches nearly every repeat
//! without holding a whole dataset's annotations in memory.

use std::borrow::Borrow;

/// Holds at most one key/value pair. Inserting a new key evicts the old one.
#[derive(Debug)]
pub struct SingleEntryCache<K, V> {
    entry: Option<(K, V)>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for SingleEntryCache<K, V> {
    fn default() -> Self {
        Self {
            entry: None,
            hits: 0,
            misses: 0,
        }
    }
}

impl<K, V> SingleEntryCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, counting the hit or miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match &self.entry {
            Some((k, v)) if k.borrow() == key => {
                self.hits += 1;
                Some(v)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key`, replacing whatever was cached.
    pub fn insert(&mut self, key: K, value: V) -> &V {
        let (_, v) = self.entry.insert((key, value));
        v
    }

    /// Drop the cached entry. Hit/miss counters are kept.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
