//! Ordered JSON object with a lazy hash index.
//!
//! Entries preserve insertion order. Below [`INDEX_THRESHOLD`] lookups are
//! linear scans over the entry vector (cache-friendly, no hashing); at or
//! above it a hash index is built on first lookup and kept in sync by
//! `insert`. The index maps key hashes to entry offsets and reads key
//! bytes back from the entries at probe time, so growing the entry vector
//! does not invalidate it; removal shifts offsets and drops the index for
//! a lazy rebuild.

use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use hashbrown::hash_table::{Entry as TableEntry, HashTable};

use super::raw::RawVec;
use super::string::Str;
use super::Value;
use crate::arena::Arena;
use crate::hash::hash_bytes;

/// Objects at or above this size use the hash index; below it lookup is
/// linear.
pub(crate) const INDEX_THRESHOLD: usize = 16;

pub(crate) struct Entry {
    pub(crate) key: Str,
    pub(crate) value: Value,
}

/// Offset-keyed hash index over an entry vector.
pub(crate) struct ObjectIndex {
    table: HashTable<u32>,
}

impl ObjectIndex {
    fn with_capacity(capacity: usize) -> ObjectIndex {
        ObjectIndex {
            table: HashTable::with_capacity(capacity),
        }
    }

    /// Index every entry in one forward pass; later duplicates overwrite
    /// earlier offsets, so the table maps each key to its last occurrence.
    pub(crate) fn build(entries: &[Entry]) -> ObjectIndex {
        let mut index = ObjectIndex::with_capacity(entries.len());
        for i in 0..entries.len() {
            index.insert_last_wins(entries, i as u32);
        }
        index
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }

    pub(crate) fn find(&self, entries: &[Entry], key: &[u8]) -> Option<u32> {
        let hash = hash_bytes(key);
        self.table
            .find(hash, |&i| entries[i as usize].key.as_bytes() == key)
            .copied()
    }

    pub(crate) fn insert_last_wins(&mut self, entries: &[Entry], offset: u32) {
        let key = entries[offset as usize].key.as_bytes();
        let hash = hash_bytes(key);
        match self.table.entry(
            hash,
            |&i| entries[i as usize].key.as_bytes() == key,
            |&i| hash_bytes(entries[i as usize].key.as_bytes()),
        ) {
            TableEntry::Occupied(mut slot) => {
                *slot.get_mut() = offset;
            }
            TableEntry::Vacant(slot) => {
                slot.insert(offset);
            }
        }
    }

    /// Record `offset` unless its key is already present; on a duplicate,
    /// returns the offset of the earlier occurrence.
    pub(crate) fn insert_if_absent(&mut self, entries: &[Entry], offset: u32) -> Result<(), u32> {
        let key = entries[offset as usize].key.as_bytes();
        let hash = hash_bytes(key);
        match self.table.entry(
            hash,
            |&i| entries[i as usize].key.as_bytes() == key,
            |&i| hash_bytes(entries[i as usize].key.as_bytes()),
        ) {
            TableEntry::Occupied(slot) => Err(*slot.get()),
            TableEntry::Vacant(slot) => {
                slot.insert(offset);
                Ok(())
            }
        }
    }
}

/// An insertion-ordered collection of key/value pairs with O(1) lookup
/// above a small-size threshold.
pub struct Object {
    entries: RawVec<Entry>,
    /// Built lazily behind shared access; single-threaded by construction
    /// (the containing `Value` is `!Sync`).
    index: RefCell<Option<Box<ObjectIndex>>>,
}

impl Object {
    /// Empty object, allocating from the current context.
    pub fn new() -> Object {
        Object {
            entries: RawVec::new(),
            index: RefCell::new(None),
        }
    }

    /// Empty object with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Object {
        Object {
            entries: RawVec::with_capacity_in(capacity, crate::arena::current_arena()),
            index: RefCell::new(None),
        }
    }

    pub(crate) fn with_capacity_in(capacity: usize, arena: Option<NonNull<Arena>>) -> Object {
        Object {
            entries: RawVec::with_capacity_in(capacity, arena),
            index: RefCell::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    fn find_idx(&self, key: &[u8]) -> Option<usize> {
        let entries = self.entries.as_slice();
        if entries.len() >= INDEX_THRESHOLD {
            let mut guard = self.index.borrow_mut();
            let index = guard.get_or_insert_with(|| Box::new(ObjectIndex::build(entries)));
            return index.find(entries, key).map(|i| i as usize);
        }
        entries.iter().position(|e| e.key.as_bytes() == key)
    }

    /// Look a key up without failing; linear below the index threshold,
    /// hashed above it.
    pub fn find(&self, key: &str) -> Option<&Value> {
        let i = self.find_idx(key.as_bytes())?;
        Some(&self.entries.as_slice()[i].value)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Value> {
        let i = self.find_idx(key.as_bytes())?;
        Some(&mut self.entries.as_mut_slice()[i].value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find_idx(key.as_bytes()).is_some()
    }

    /// Insert or update. Existing keys are updated in place and keep their
    /// position; new keys append.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.entries.len() < INDEX_THRESHOLD {
            if let Some(i) = self
                .entries
                .as_slice()
                .iter()
                .position(|e| e.key.as_bytes() == key.as_bytes())
            {
                self.entries.as_mut_slice()[i].value = value;
                return;
            }
            self.push_entry(Str::new(key), value);
            return;
        }

        let existing = {
            let entries = self.entries.as_slice();
            let index = self
                .index
                .get_mut()
                .get_or_insert_with(|| Box::new(ObjectIndex::build(entries)));
            index.find(entries, key.as_bytes())
        };
        match existing {
            Some(i) => self.entries.as_mut_slice()[i as usize].value = value,
            None => self.push_entry(Str::new(key), value),
        }
    }

    /// Remove a key, returning its value. The index is dropped (offsets
    /// shift) and rebuilt lazily on the next indexed lookup.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let i = self.find_idx(key.as_bytes())?;
        *self.index.get_mut() = None;
        let entry = self.entries.remove(i);
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        *self.index.get_mut() = None;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.as_slice().iter().map(|e| e.key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.as_slice().iter().map(|e| &e.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.as_mut_slice().iter_mut().map(|e| &mut e.value)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .as_slice()
            .iter()
            .map(|e| (e.key.as_str(), &e.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries
            .as_mut_slice()
            .iter_mut()
            .map(|e| (e.key.as_str(), &mut e.value))
    }

    /// Find or append-with-Null, for `value[key] = ...` style mutation.
    pub(crate) fn entry_or_insert(&mut self, key: &str) -> &mut Value {
        let i = match self.find_idx(key.as_bytes()) {
            Some(i) => i,
            None => {
                self.push_entry(Str::new(key), Value::null());
                self.entries.len() - 1
            }
        };
        &mut self.entries.as_mut_slice()[i].value
    }

    /// Append and keep the index (if built) in sync.
    fn push_entry(&mut self, key: Str, value: Value) {
        let offset = self.entries.len() as u32;
        self.entries.push(Entry { key, value });
        let entries = &self.entries;
        if let Some(index) = self.index.get_mut().as_mut() {
            index.insert_last_wins(entries.as_slice(), offset);
        }
    }

    // Parser integration: raw batch append, then one finalization pass
    // after the closing brace.

    pub(crate) fn push_entry_unchecked(&mut self, key: Str, value: Value) {
        self.entries.push(Entry { key, value });
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        self.entries.as_slice()
    }

    /// Collapse duplicate keys (last value wins) and, for large objects,
    /// build the hash index in one pass.
    ///
    /// Large path: the forward index build naturally maps every key to its
    /// last occurrence; if the index came out smaller than the entry count
    /// there were duplicates, and a compact pass keeps only entries the
    /// index points at. Small path: an O(n^2) scan drops entries whose key
    /// reappears later (n < 16).
    pub(crate) fn finalize_parsed(&mut self) {
        let n = self.entries.len();
        if n >= INDEX_THRESHOLD {
            let mut index = ObjectIndex::build(self.entries.as_slice());
            if index.len() < n {
                let keep: Vec<bool> = {
                    let entries = self.entries.as_slice();
                    (0..n)
                        .map(|i| index.find(entries, entries[i].key.as_bytes()) == Some(i as u32))
                        .collect()
                };
                self.entries.retain_with_index(|i, _| keep[i]);
                index = ObjectIndex::build(self.entries.as_slice());
            }
            *self.index.get_mut() = Some(Box::new(index));
        } else if n >= 2 {
            let mut i = 0;
            while i < self.entries.len() {
                let has_later_dup = {
                    let entries = self.entries.as_slice();
                    let key = entries[i].key.as_bytes();
                    entries[i + 1..].iter().any(|e| e.key.as_bytes() == key)
                };
                if has_later_dup {
                    drop(self.entries.remove(i));
                } else {
                    i += 1;
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn has_index(&self) -> bool {
        self.index.borrow().is_some()
    }
}

impl Default for Object {
    fn default() -> Object {
        Object::new()
    }
}

impl Clone for Object {
    /// Deep copy of the entries through the current context; the index is
    /// not carried over and rebuilds lazily.
    fn clone(&self) -> Object {
        let mut entries = RawVec::with_capacity_in(self.entries.len(), crate::arena::current_arena());
        for entry in self.entries.as_slice() {
            entries.push(Entry {
                key: entry.key.clone(),
                value: entry.value.clone(),
            });
        }
        Object {
            entries,
            index: RefCell::new(None),
        }
    }
}

impl PartialEq for Object {
    /// Key order does not matter for semantic equality of JSON objects.
    fn eq(&self, other: &Object) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(key, value)| other.find(key) == Some(value))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn filled(n: usize) -> Object {
        let mut obj = Object::new();
        for i in 0..n {
            obj.insert(&format!("key{i}"), i as i64);
        }
        obj
    }

    #[test_case(INDEX_THRESHOLD - 1; "one below the threshold")]
    #[test_case(INDEX_THRESHOLD; "at the threshold")]
    #[test_case(INDEX_THRESHOLD * 4; "well above the threshold")]
    fn find_is_correct_on_both_sides_of_threshold(n: usize) {
        let obj = filled(n);
        for i in 0..n {
            assert_eq!(
                obj.find(&format!("key{i}")),
                Some(&Value::from(i as i64)),
                "key{i}"
            );
        }
        assert_eq!(obj.find("missing"), None);
        assert_eq!(obj.has_index(), n >= INDEX_THRESHOLD);
    }

    #[test]
    fn index_is_built_lazily_on_first_lookup() {
        let obj = filled(INDEX_THRESHOLD);
        assert!(!obj.has_index());
        obj.find("key0");
        assert!(obj.has_index());
    }

    #[test]
    fn insert_updates_in_place_and_preserves_order() {
        let mut obj = filled(20);
        obj.insert("key3", "updated");
        assert_eq!(obj.find("key3"), Some(&Value::from("updated")));
        let keys: Vec<&str> = obj.keys().collect();
        assert_eq!(keys[3], "key3");
        assert_eq!(obj.len(), 20);
    }

    #[test]
    fn remove_invalidates_index_and_later_lookups_still_work() {
        let mut obj = filled(20);
        obj.find("key0");
        assert!(obj.has_index());
        assert_eq!(obj.remove("key7"), Some(Value::from(7i64)));
        assert!(!obj.has_index());
        assert_eq!(obj.find("key8"), Some(&Value::from(8i64)));
        assert_eq!(obj.find("key7"), None);
        assert!(obj.has_index());
    }

    #[test]
    fn finalize_collapses_small_duplicates_last_wins() {
        let mut obj = Object::new();
        obj.push_entry_unchecked(Str::new("a"), Value::from(1i64));
        obj.push_entry_unchecked(Str::new("a"), Value::from(2i64));
        obj.push_entry_unchecked(Str::new("a"), Value::from(3i64));
        obj.finalize_parsed();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.find("a"), Some(&Value::from(3i64)));
    }

    #[test]
    fn finalize_collapses_large_duplicates_last_wins() {
        let mut obj = Object::new();
        for i in 0..20 {
            obj.push_entry_unchecked(Str::new(&format!("k{i}")), Value::from(i as i64));
        }
        for i in 0..5 {
            obj.push_entry_unchecked(Str::new(&format!("k{i}")), Value::from(100 + i as i64));
        }
        obj.finalize_parsed();
        assert_eq!(obj.len(), 20);
        for i in 0..5 {
            assert_eq!(obj.find(&format!("k{i}")), Some(&Value::from(100 + i as i64)));
        }
        for i in 5..20 {
            assert_eq!(obj.find(&format!("k{i}")), Some(&Value::from(i as i64)));
        }
    }

    #[test]
    fn equality_ignores_key_order() {
        let mut a = Object::new();
        a.insert("x", 1i64);
        a.insert("y", 2i64);
        let mut b = Object::new();
        b.insert("y", 2i64);
        b.insert("x", 1i64);
        assert_eq!(a, b);
        b.insert("z", 3i64);
        assert_ne!(a, b);
    }
}
