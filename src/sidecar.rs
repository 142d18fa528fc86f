//! Mutable annotations attached to a canonical instance.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use crate::value::Value;

/// Mutable key/value store attached to one canonical instance.
///
/// Not part of the instance's fingerprint or equality. Every handle to the
/// same canonical instance sees the same sidecar; once the instance is
/// reclaimed, a later equal value starts with an empty one.
///
/// Stored values are strong references. A sidecar must not hold its own
/// instance (directly or through other values): the instance would keep
/// itself alive. Store a [`WeakMap`](crate::WeakMap) or
/// [`WeakVector`](crate::WeakVector) wrapped in [`Value::opaque`] instead.
#[derive(Default)]
pub struct Sidecar {
    entries: RwLock<HashMap<String, Value>>,
}

impl Sidecar {
    /// Returns a clone of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.write().insert(key.into(), value.into())
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.write().remove(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of stored annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copies the current contents.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.read().clone()
    }

    pub(crate) fn into_values(self) -> impl Iterator<Item = Value> {
        self.entries.into_inner().into_values()
    }
}

impl fmt::Debug for Sidecar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.read().iter()).finish()
    }
}
