//! CHAMP trie node types and bitmap helpers.

use std::fmt;
use std::sync::Arc;

use crate::fingerprint::{self, Fingerprint};
use crate::value::Value;

/// Bits per trie level (5 → 32-way branching).
pub const BITS_PER_LEVEL: u32 = 5;

/// Maximum bit-shift value (depth 12, last level uses 4 bits).
pub const MAX_SHIFT: u32 = 60;

/// Inline key-value pair with its precomputed digests.
#[derive(Clone)]
pub struct Entry {
    /// 64-bit trie hash folded from `key_fp`.
    pub hash: u64,
    /// Fingerprint of the key.
    pub key_fp: Fingerprint,
    /// The key.
    pub key: Value,
    /// The value.
    pub value: Value,
    /// Entry digest, XOR-summed into the map fingerprint.
    pub digest: Fingerprint,
    /// Text key and JSON-compatible value.
    pub json: bool,
}

impl Entry {
    /// Builds an entry, hashing key and value.
    pub fn new(key: Value, value: Value) -> Self {
        let key_fp = key.fingerprint();
        let digest = fingerprint::entry_digest(&key_fp, &value.fingerprint());
        let json = matches!(key, Value::Text(_)) && value.is_json_compatible();
        Self {
            hash: key_fp.trie_hash(),
            key_fp,
            key,
            value,
            digest,
            json,
        }
    }

    /// Returns `true` if this entry's key strictly equals the probed key.
    pub fn matches(&self, probe: &Probe<'_>) -> bool {
        self.hash == probe.hash && self.key_fp == probe.fp && self.key == *probe.key
    }
}

/// A hashed lookup key.
pub struct Probe<'a> {
    /// 64-bit trie hash.
    pub hash: u64,
    /// Key fingerprint.
    pub fp: Fingerprint,
    /// The key itself, for the final strict comparison.
    pub key: &'a Value,
}

impl<'a> Probe<'a> {
    /// Hashes `key` once for a whole traversal.
    pub fn new(key: &'a Value) -> Self {
        let fp = key.fingerprint();
        Self {
            hash: fp.trie_hash(),
            fp,
            key,
        }
    }
}

impl Entry {
    /// Probe view of this entry's own key.
    pub const fn probe(&self) -> Probe<'_> {
        Probe {
            hash: self.hash,
            fp: self.key_fp,
            key: &self.key,
        }
    }
}

/// CHAMP trie node.
///
/// Two variants maintain the canonical form invariant:
/// - [`Inner`](Self::Inner): bitmap-compressed node at depth `d < D`
/// - [`Collision`](Self::Collision): linear node for full 64-bit hash collisions
///
/// Nodes are immutable once shared; updates path-copy and reuse every
/// untouched child by `Arc`.
pub enum Node {
    /// Bitmap-compressed inner node.
    ///
    /// Invariant: `data_map & node_map == 0` (disjoint positions).
    Inner {
        /// Bitmap of positions occupied by inline entries.
        data_map: u32,
        /// Bitmap of positions occupied by child subtrees.
        node_map: u32,
        /// Inline entries, in bitmap order.
        entries: Vec<Entry>,
        /// Child subtrees, in bitmap order.
        children: Vec<Arc<Self>>,
    },
    /// Collision node for keys sharing the same 64-bit hash.
    ///
    /// Invariant: `entries.len() >= 2`.
    Collision {
        /// The shared 64-bit hash value.
        hash: u64,
        /// Colliding entries, in insertion order.
        entries: Vec<Entry>,
    },
}

// ---------------------------------------------------------------------------
// Bitmap helpers
// ---------------------------------------------------------------------------

/// Extracts the 5-bit hash fragment at the given bit-shift depth.
#[inline]
#[must_use]
pub const fn fragment(hash: u64, shift: u32) -> u32 {
    ((hash >> shift) & 0x1F) as u32
}

/// Returns the single-bit mask for the given fragment (0..31).
#[inline]
#[must_use]
pub const fn mask(frag: u32) -> u32 {
    1 << frag
}

/// Returns the compact index of `bit` within `bitmap`.
///
/// Counts the number of set bits below `bit`.
#[inline]
#[must_use]
pub const fn index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// ---------------------------------------------------------------------------
// Node accessors
// ---------------------------------------------------------------------------

impl Node {
    /// Single-entry inner node placed at `entry`'s fragment for `shift`.
    pub fn leaf(entry: Entry, shift: u32) -> Self {
        Self::Inner {
            data_map: mask(fragment(entry.hash, shift)),
            node_map: 0,
            entries: vec![entry],
            children: Vec::new(),
        }
    }

    /// Inline entries of this node.
    pub fn entries(&self) -> &[Entry] {
        match self {
            Self::Inner { entries, .. } | Self::Collision { entries, .. } => entries,
        }
    }

    /// Child subtrees (always empty for collision nodes).
    pub fn children(&self) -> &[Arc<Self>] {
        match self {
            Self::Inner { children, .. } => children,
            Self::Collision { .. } => &[],
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner {
                data_map,
                node_map,
                entries,
                children,
            } => f
                .debug_struct("Inner")
                .field("data_map", &format_args!("{data_map:#034b}"))
                .field("node_map", &format_args!("{node_map:#034b}"))
                .field("entries", &entries.len())
                .field("children", &children.len())
                .finish(),
            Self::Collision { hash, entries } => f
                .debug_struct("Collision")
                .field("hash", hash)
                .field("entries", &entries.len())
                .finish(),
        }
    }
}
