//! Preferences
//!
//! A typed string key/value store with JSON persistence through the
//! stream abstraction. Documents carry an optional instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::io::{Result, Stream};

/// Typed key/value preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    entries: BTreeMap<String, String>,
}

impl Preferences {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a string value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up a string value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Sets an integer value.
    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set(key, value.to_string());
    }

    /// Looks up an integer value; unparsable entries read as absent.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)?.parse().ok()
    }

    /// Sets a float value.
    pub fn set_float(&mut self, key: impl Into<String>, value: f64) {
        self.set(key, value.to_string());
    }

    /// Looks up a float value; unparsable entries read as absent.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key)?.parse().ok()
    }

    /// Sets a boolean value.
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }

    /// Looks up a boolean value; anything but `true` reads as `false`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v == "true")
    }

    /// Removes an entry, returning its former value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// True when `key` has a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Writes the store as JSON to an open stream.
    pub fn save(&self, stream: &mut dyn Stream) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        stream.write(&json)?;
        Ok(())
    }

    /// Reads a store back from an open stream.
    pub fn load(stream: &mut dyn Stream) -> Result<Self> {
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
