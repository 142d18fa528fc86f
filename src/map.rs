//! Canonical persistent hash map.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops;
use std::sync::{Arc, LazyLock, Weak};

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::iter::{Iter, Keys, Values};
use crate::node::{Entry, Node, Probe};
use crate::ops::get::get_recursive;
use crate::ops::insert::insert_recursive;
use crate::ops::remove::{RemoveOutcome, remove_recursive};
use crate::sidecar::Sidecar;
use crate::table::{Canonical, CanonicalTable, Shared, defer};
use crate::value::Value;

static MAP_TABLE: LazyLock<CanonicalTable<MapBody>> = LazyLock::new(|| CanonicalTable::new("map"));

/// Trie contents of a map, before or after interning.
#[derive(Clone)]
pub struct MapBody {
    root: Option<Arc<Node>>,
    size: usize,
    fingerprint: Fingerprint,
    json_items: usize,
}

// ---------------------------------------------------------------------------
// Body operations: plain path-copy, no interning
// ---------------------------------------------------------------------------

impl MapBody {
    const fn empty() -> Self {
        Self {
            root: None,
            size: 0,
            fingerprint: Fingerprint::ZERO,
            json_items: 0,
        }
    }

    fn lookup(&self, probe: &Probe<'_>) -> Option<&Entry> {
        get_recursive(self.root.as_deref()?, probe, 0)
    }

    /// Inserts or replaces; returns the replaced entry.
    fn insert(&mut self, entry: Entry) -> Option<Entry> {
        let digest = entry.digest;
        let json = entry.json;

        let replaced = match &self.root {
            Some(root) => {
                let outcome = insert_recursive(root, entry, 0);
                self.root = Some(Arc::new(outcome.node));
                outcome.replaced
            }
            None => {
                self.root = Some(Arc::new(Node::leaf(entry, 0)));
                None
            }
        };

        if let Some(old) = &replaced {
            self.fingerprint = self.fingerprint.xor(old.digest);
            self.json_items -= usize::from(old.json);
        } else {
            self.size += 1;
        }
        self.fingerprint = self.fingerprint.xor(digest);
        self.json_items += usize::from(json);
        replaced
    }

    fn remove(&mut self, probe: &Probe<'_>) -> Option<Entry> {
        match remove_recursive(self.root.as_deref()?, probe, 0) {
            RemoveOutcome::NotFound => None,
            RemoveOutcome::Removed { node, removed } => {
                self.root = node.map(Arc::new);
                self.size -= 1;
                self.fingerprint = self.fingerprint.xor(removed.digest);
                self.json_items -= usize::from(removed.json);
                Some(removed)
            }
        }
    }
}

impl Canonical for MapBody {
    fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self.fingerprint == other.fingerprint
            && Iter::new(self.root.as_deref(), self.size).all(|(k, v)| {
                other
                    .lookup(&Probe::new(k))
                    .is_some_and(|e| e.value == *v)
            })
    }

    fn table() -> &'static CanonicalTable<Self> {
        &MAP_TABLE
    }

    fn detach(&mut self, nested: &mut Vec<Value>) {
        let mut stack: Vec<Arc<Node>> = self.root.take().into_iter().collect();
        while let Some(node) = stack.pop() {
            let Ok(node) = Arc::try_unwrap(node) else {
                continue;
            };
            let (entries, children) = match node {
                Node::Inner {
                    entries, children, ..
                } => (entries, children),
                Node::Collision { entries, .. } => (entries, Vec::new()),
            };
            for entry in entries {
                defer(entry.key, nested);
                defer(entry.value, nested);
            }
            stack.extend(children);
        }
    }
}

/// Immutable hash map whose equal instances are shared process-wide.
///
/// Built on a CHAMP trie: the same set of pairs always produces the same
/// trie structure, and every update path-copies only the nodes on the way
/// to the changed slot. Each resulting map is interned, so two maps with
/// equal contents are always the same instance and compare in O(1).
///
/// ```
/// use champ_canon::{PersistentMap, Value};
///
/// let a = PersistentMap::new().set("foo", "bar");
/// let b = PersistentMap::from_pairs([("foo", "bar")]);
/// assert!(a.ptr_eq(&b));
/// assert_eq!(a.get(&Value::from("foo")), Some(&Value::from("bar")));
/// ```
#[derive(Clone)]
pub struct PersistentMap(Arc<Shared<MapBody>>);

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl PersistentMap {
    fn intern(body: MapBody) -> Self {
        Self(MAP_TABLE.intern(body))
    }

    /// Returns the canonical empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::intern(MapBody::empty())
    }

    /// Builds a map from key/value pairs; later duplicates win.
    ///
    /// The trie is built directly and interned once.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut body = MapBody::empty();
        for (k, v) in pairs {
            body.insert(Entry::new(k.into(), v.into()));
        }
        Self::intern(body)
    }

    /// Returns a map with every pair of `pairs` set, interned once.
    #[must_use]
    pub fn update<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut body = (**self.0).clone();
        let mut changed = false;
        for (k, v) in pairs {
            let (key, value) = (k.into(), v.into());
            if body.lookup(&Probe::new(&key)).is_some_and(|e| e.value == value) {
                continue;
            }
            body.insert(Entry::new(key, value));
            changed = true;
        }
        if changed { Self::intern(body) } else { self.clone() }
    }

    /// Returns a map with `key` bound to `value`.
    ///
    /// If `key` is already bound to a strictly-equal value, returns `self`.
    #[must_use]
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        let (key, value) = (key.into(), value.into());
        if self.0.lookup(&Probe::new(&key)).is_some_and(|e| e.value == value) {
            return self.clone();
        }
        let mut body = (**self.0).clone();
        body.insert(Entry::new(key, value));
        Self::intern(body)
    }

    /// Returns a map without `key`; `self` if the key is absent.
    #[must_use]
    pub fn discard(&self, key: impl Into<Value>) -> Self {
        let key = key.into();
        let mut body = (**self.0).clone();
        if body.remove(&Probe::new(&key)).is_some() {
            Self::intern(body)
        } else {
            self.clone()
        }
    }

    /// Returns a map without `key`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the key is absent.
    pub fn remove(&self, key: impl Into<Value>) -> Result<Self> {
        let key = key.into();
        let mut body = (**self.0).clone();
        if body.remove(&Probe::new(&key)).is_some() {
            Ok(Self::intern(body))
        } else {
            Err(Error::NotFound { key })
        }
    }
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

impl PersistentMap {
    /// Returns the value bound to `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.lookup(&Probe::new(key)).map(|e| &e.value)
    }

    /// Returns the value bound to `key`, or `default`.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &Value, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value bound to `key`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the key is absent.
    pub fn try_get(&self, key: &Value) -> Result<&Value> {
        self.get(key).ok_or_else(|| Error::NotFound { key: key.clone() })
    }

    /// Returns `true` if the map contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.size
    }

    /// Returns `true` if the map has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.size == 0
    }

    /// Iterates over `(&key, &value)` pairs in trie order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.0.root.as_deref(), self.0.size)
    }

    /// Iterates over keys in trie order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_> {
        Keys(self.iter())
    }

    /// Iterates over values in trie order.
    #[must_use]
    pub fn values(&self) -> Values<'_> {
        Values(self.iter())
    }

    /// Content fingerprint: XOR of all entry digests.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.0.fingerprint
    }

    /// Returns `true` if every key is text and every value is
    /// JSON-compatible. O(1).
    #[must_use]
    pub fn is_json_compatible(&self) -> bool {
        self.0.json_items == self.0.size
    }

    /// Mutable annotations shared by every handle to this instance.
    ///
    /// The sidecar must not hold a strong reference back to this instance,
    /// or the instance is never reclaimed; store a [`WeakMap`] instead.
    #[must_use]
    pub fn meta(&self) -> &Sidecar {
        self.0.sidecar()
    }

    /// Creates a weak handle to this instance.
    #[must_use]
    pub fn downgrade(&self) -> WeakMap {
        WeakMap(Arc::downgrade(&self.0))
    }

    /// Returns `true` if both handles refer to the same canonical instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live canonical maps in the process.
    #[must_use]
    pub fn instance_count() -> usize {
        MAP_TABLE.live()
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl Default for PersistentMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PersistentMap {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for PersistentMap {}

impl Hash for PersistentMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.fingerprint.hash(state);
    }
}

impl fmt::Debug for PersistentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PersistentMap(")?;
        f.debug_map().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

impl fmt::Display for PersistentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for PersistentMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl ops::Index<&Value> for PersistentMap {
    type Output = Value;

    fn index(&self, key: &Value) -> &Value {
        self.get(key).expect("key not found")
    }
}

impl<'a> IntoIterator for &'a PersistentMap {
    type Item = (&'a Value, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Weak handle to a canonical [`PersistentMap`].
///
/// Does not keep the instance alive. Once the last strong handle drops,
/// [`upgrade`](Self::upgrade) returns `None` for good, even if an equal
/// map is built again later.
#[derive(Clone)]
pub struct WeakMap(Weak<Shared<MapBody>>);

impl WeakMap {
    /// Returns a strong handle if the instance is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<PersistentMap> {
        self.0.upgrade().map(PersistentMap)
    }

    /// Returns `true` if the instance has been reclaimed.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl fmt::Debug for WeakMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dead() {
            f.write_str("WeakMap(dead)")
        } else {
            f.write_str("WeakMap(..)")
        }
    }
}
