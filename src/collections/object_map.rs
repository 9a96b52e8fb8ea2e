//! Hash map with undo support
//!
//! Open addressing with linear probing and tombstones. Keys are strings,
//! values are shared object references. Crossing a load factor of 0.75
//! doubles the bucket array to the next power of two; the rehash itself
//! is not recorded, it is observationally equivalent.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use log::trace;

use crate::core::{ObjectRef, Status};
use crate::edit::record::UndoRecord;
use crate::edit::SharedUndoManager;

const INITIAL_BUCKETS: usize = 16;

enum Bucket {
    Empty,
    Tombstone,
    Occupied { key: String, value: ObjectRef },
}

pub(crate) struct MapState {
    buckets: Vec<Bucket>,
    len: usize,
    tombstones: usize,
}

impl Default for MapState {
    fn default() -> Self {
        MapState {
            buckets: (0..INITIAL_BUCKETS).map(|_| Bucket::Empty).collect(),
            len: 0,
            tombstones: 0,
        }
    }
}

fn bucket_hash(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

impl MapState {
    fn mask(&self) -> usize {
        self.buckets.len() - 1
    }

    fn find_index(&self, key: &str) -> Option<usize> {
        let mask = self.mask();
        let mut index = bucket_hash(key) as usize & mask;
        for _ in 0..self.buckets.len() {
            match &self.buckets[index] {
                Bucket::Empty => return None,
                Bucket::Tombstone => {}
                Bucket::Occupied { key: existing, .. } => {
                    if existing == key {
                        return Some(index);
                    }
                }
            }
            index = (index + 1) & mask;
        }
        None
    }

    fn get(&self, key: &str) -> Option<ObjectRef> {
        self.find_index(key).map(|index| match &self.buckets[index] {
            Bucket::Occupied { value, .. } => value.clone(),
            _ => unreachable!("find_index returns occupied slots"),
        })
    }

    /// Inserts or overwrites, returning the prior value if any.
    pub(crate) fn insert_raw(&mut self, key: String, value: ObjectRef) -> Option<ObjectRef> {
        self.grow_if_needed();
        let mask = self.mask();
        let mut index = bucket_hash(&key) as usize & mask;
        let mut first_tombstone: Option<usize> = None;
        loop {
            let matches_key = match &self.buckets[index] {
                Bucket::Empty => break,
                Bucket::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(index);
                    }
                    false
                }
                Bucket::Occupied { key: existing, .. } => existing == &key,
            };
            if matches_key {
                if let Bucket::Occupied { value: slot, .. } = &mut self.buckets[index] {
                    return Some(std::mem::replace(slot, value));
                }
            }
            index = (index + 1) & mask;
        }
        let target = first_tombstone.unwrap_or(index);
        if matches!(self.buckets[target], Bucket::Tombstone) {
            self.tombstones -= 1;
        }
        self.buckets[target] = Bucket::Occupied { key, value };
        self.len += 1;
        None
    }

    /// Removes the entry for `key`, leaving a tombstone.
    pub(crate) fn take_raw(&mut self, key: &str) -> Option<ObjectRef> {
        let index = self.find_index(key)?;
        let bucket = std::mem::replace(&mut self.buckets[index], Bucket::Tombstone);
        self.len -= 1;
        self.tombstones += 1;
        match bucket {
            Bucket::Occupied { value, .. } => Some(value),
            _ => unreachable!("find_index returns occupied slots"),
        }
    }

    fn grow_if_needed(&mut self) {
        if (self.len + self.tombstones + 1) * 4 <= self.buckets.len() * 3 {
            return;
        }
        let new_size = (self.buckets.len() * 2).next_power_of_two();
        trace!(
            "rehashing object map: {} live entries into {} buckets",
            self.len,
            new_size
        );
        let old = std::mem::replace(
            &mut self.buckets,
            (0..new_size).map(|_| Bucket::Empty).collect(),
        );
        self.len = 0;
        self.tombstones = 0;
        let mask = self.mask();
        for bucket in old {
            if let Bucket::Occupied { key, value } = bucket {
                let mut index = bucket_hash(&key) as usize & mask;
                while !matches!(self.buckets[index], Bucket::Empty) {
                    index = (index + 1) & mask;
                }
                self.buckets[index] = Bucket::Occupied { key, value };
                self.len += 1;
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.buckets
            .iter()
            .filter_map(|bucket| match bucket {
                Bucket::Occupied { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }
}

/// An open-addressing hash map from strings to shared objects with
/// undo-aware mutations.
#[derive(Default)]
pub struct ObjectMap {
    state: Rc<RefCell<MapState>>,
}

impl ObjectMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(um: Option<&SharedUndoManager>, record: UndoRecord) {
        if let Some(um) = um {
            um.borrow_mut().append_record(record);
        }
    }

    /// Inserts or overwrites the value for `key`.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: ObjectRef,
        um: Option<&SharedUndoManager>,
    ) -> Status {
        let key = key.into();
        if key.is_empty() {
            return Status::InvalidKey;
        }
        let prior = self.state.borrow_mut().insert_raw(key.clone(), value);
        Self::record(
            um,
            UndoRecord::map_put(self.state.clone(), key, prior),
        );
        Status::Ok
    }

    /// Inserts the value for `key` only if the key is absent.
    pub fn insert_new(
        &self,
        key: impl Into<String>,
        value: ObjectRef,
        um: Option<&SharedUndoManager>,
    ) -> Status {
        let key = key.into();
        if key.is_empty() {
            return Status::InvalidKey;
        }
        if self.state.borrow().find_index(&key).is_some() {
            return Status::DuplicateKey;
        }
        self.put(key, value, um)
    }

    /// Removes the entry for `key`.
    pub fn remove(&self, key: &str, um: Option<&SharedUndoManager>) -> Status {
        let Some(prior) = self.state.borrow_mut().take_raw(key) else {
            return Status::NotFound;
        };
        Self::record(
            um,
            UndoRecord::map_remove(self.state.clone(), key.to_string(), Some(prior)),
        );
        Status::Ok
    }

    /// Looks up the value for `key`.
    pub fn get(&self, key: &str) -> Option<ObjectRef> {
        self.state.borrow().get(key)
    }

    /// True when `key` has a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.borrow().find_index(key).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.state.borrow().len
    }

    /// True when the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The live keys, in bucket order.
    pub fn keys(&self) -> Vec<String> {
        self.state.borrow().keys()
    }
}
