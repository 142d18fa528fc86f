//! Canonical persistent vector.
//!
//! A 32-way radix tree of full leaf chunks plus a tail buffer holding the
//! last 1..=32 elements. Appends fill the tail in place (the body is owned
//! until it is interned) and push a full tail into the tree by path-copy.
//! Prefix slices keep every aligned chunk of the source tree.

use std::cmp;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::mem;
use std::num::NonZeroUsize;
use std::ops;
use std::sync::{Arc, LazyLock, Weak};

use crate::error::{Error, Result};
use crate::fingerprint::{self, Fingerprint};
use crate::sidecar::Sidecar;
use crate::table::{Canonical, CanonicalTable, Shared, defer};
use crate::value::Value;

/// Bits of index consumed per tree level (32-element chunks).
pub const CHUNK_BITS: u32 = 5;

const CHUNK: usize = 1 << CHUNK_BITS;
const MASK: usize = CHUNK - 1;

static VEC_TABLE: LazyLock<CanonicalTable<VecBody>> =
    LazyLock::new(|| CanonicalTable::new("vector"));

// ---------------------------------------------------------------------------
// Elements & nodes
// ---------------------------------------------------------------------------

/// An element with its cached digests.
#[derive(Clone)]
pub struct Item {
    value: Value,
    value_fp: Fingerprint,
    digest: Fingerprint,
    json: bool,
}

impl Item {
    fn new(value: Value, index: usize) -> Self {
        let value_fp = value.fingerprint();
        Self {
            digest: fingerprint::item_digest(&value_fp, index),
            json: value.is_json_compatible(),
            value,
            value_fp,
        }
    }

    /// Same element at another position; the value fingerprint is reused.
    fn moved_to(&self, index: usize) -> Self {
        Self {
            value: self.value.clone(),
            value_fp: self.value_fp,
            digest: fingerprint::item_digest(&self.value_fp, index),
            json: self.json,
        }
    }
}

enum VNode {
    Branch(Vec<Arc<Self>>),
    Leaf(Vec<Item>),
}

impl VNode {
    fn children(&self) -> &[Arc<Self>] {
        match self {
            Self::Branch(children) => children,
            Self::Leaf(_) => &[],
        }
    }

    fn items(&self) -> &[Item] {
        match self {
            Self::Leaf(items) => items,
            Self::Branch(_) => &[],
        }
    }
}

fn empty_root() -> Arc<VNode> {
    Arc::new(VNode::Branch(Vec::new()))
}

/// Wraps `node` in single-child branches up to `level`.
fn new_path(level: u32, node: Arc<VNode>) -> Arc<VNode> {
    if level == 0 {
        node
    } else {
        Arc::new(VNode::Branch(vec![new_path(level - CHUNK_BITS, node)]))
    }
}

/// Path-copies `parent` with the full `tail` chunk attached at the end.
///
/// `len` is the element count before the tail was flushed.
fn push_tail(len: usize, level: u32, parent: &VNode, tail: Arc<VNode>) -> VNode {
    let sub = ((len - 1) >> level) & MASK;
    let mut children = parent.children().to_vec();
    let inserted = if level == CHUNK_BITS {
        tail
    } else if let Some(child) = children.get(sub) {
        Arc::new(push_tail(len, level - CHUNK_BITS, child, tail))
    } else {
        new_path(level - CHUNK_BITS, tail)
    };
    if sub < children.len() {
        children[sub] = inserted;
    } else {
        children.push(inserted);
    }
    VNode::Branch(children)
}

/// Path-copies `node` with the element at `index` replaced.
fn assoc(level: u32, node: &VNode, index: usize, item: Item) -> VNode {
    match node {
        VNode::Leaf(items) => {
            let mut items = items.clone();
            items[index & MASK] = item;
            VNode::Leaf(items)
        }
        VNode::Branch(children) => {
            let sub = (index >> level) & MASK;
            let child = assoc(level - CHUNK_BITS, &children[sub], index, item);
            let mut children = children.clone();
            children[sub] = Arc::new(child);
            VNode::Branch(children)
        }
    }
}

/// Keeps the first `leaves` leaf chunks below `node`, sharing whole
/// subtrees where possible.
fn trim(level: u32, node: &Arc<VNode>, leaves: usize) -> Arc<VNode> {
    let children = node.children();
    let per_child = 1 << (level - CHUNK_BITS);
    let keep = leaves.div_ceil(per_child);
    if keep == children.len() && leaves == keep * per_child {
        return Arc::clone(node);
    }
    let mut kept: Vec<Arc<VNode>> = children[..keep].to_vec();
    let last_leaves = leaves - (keep - 1) * per_child;
    if level > CHUNK_BITS && last_leaves < per_child {
        kept[keep - 1] = trim(level - CHUNK_BITS, &children[keep - 1], last_leaves);
    }
    Arc::new(VNode::Branch(kept))
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Tree contents of a vector, before or after interning.
#[derive(Clone)]
pub struct VecBody {
    len: usize,
    shift: u32,
    root: Arc<VNode>,
    tail: Vec<Item>,
    fingerprint: Fingerprint,
    json_items: usize,
}

impl VecBody {
    fn empty() -> Self {
        Self {
            len: 0,
            shift: CHUNK_BITS,
            root: empty_root(),
            tail: Vec::new(),
            fingerprint: Fingerprint::ZERO,
            json_items: 0,
        }
    }

    /// Index of the first element held in the tail.
    const fn tail_offset(&self) -> usize {
        tail_offset_for(self.len)
    }

    /// The chunk (leaf or tail) containing `index`, or an empty slice.
    fn chunk_at(&self, index: usize) -> &[Item] {
        if index >= self.len {
            return &[];
        }
        if index >= self.tail_offset() {
            return &self.tail;
        }
        let mut node = &*self.root;
        let mut level = self.shift;
        while level > 0 {
            match node.children().get((index >> level) & MASK) {
                Some(child) => node = child,
                None => return &[],
            }
            level -= CHUNK_BITS;
        }
        node.items()
    }

    fn item(&self, index: usize) -> Option<&Item> {
        self.chunk_at(index).get(index & MASK)
    }

    fn items(&self) -> Items<'_> {
        Items::new(self, 0, self.len)
    }

    /// Appends an element that already carries its digest for `self.len`.
    fn push(&mut self, item: Item) {
        self.fingerprint = self.fingerprint.xor(item.digest);
        self.json_items += usize::from(item.json);

        if self.len - self.tail_offset() < CHUNK {
            self.tail.push(item);
        } else {
            let full = Arc::new(VNode::Leaf(mem::replace(
                &mut self.tail,
                Vec::with_capacity(CHUNK),
            )));
            if (self.len >> CHUNK_BITS) > (1 << self.shift) {
                // Root overflow: grow one level.
                let grown = VNode::Branch(vec![
                    Arc::clone(&self.root),
                    new_path(self.shift, full),
                ]);
                self.root = Arc::new(grown);
                self.shift += CHUNK_BITS;
            } else {
                self.root = Arc::new(push_tail(self.len, self.shift, &self.root, full));
            }
            self.tail.push(item);
        }
        self.len += 1;
    }

    fn push_value(&mut self, value: Value) {
        let item = Item::new(value, self.len);
        self.push(item);
    }

    /// Replaces the element at `index < len`.
    fn replace(&mut self, index: usize, item: Item) {
        let Some((old_digest, old_json)) = self.item(index).map(|old| (old.digest, old.json))
        else {
            return;
        };
        self.fingerprint = self.fingerprint.xor(old_digest).xor(item.digest);
        self.json_items = self.json_items - usize::from(old_json) + usize::from(item.json);

        let offset = self.tail_offset();
        if index >= offset {
            self.tail[index - offset] = item;
        } else {
            self.root = Arc::new(assoc(self.shift, &self.root, index, item));
        }
    }

    /// The first `n` elements, sharing every aligned chunk.
    fn take(&self, n: usize) -> Self {
        if n >= self.len {
            return self.clone();
        }
        if n == 0 {
            return Self::empty();
        }

        // Fold whichever side is shorter into the fingerprint.
        let (fingerprint, json_items) = if n <= self.len - n {
            Items::new(self, 0, n).fold((Fingerprint::ZERO, 0), fold_item)
        } else {
            Items::new(self, n, self.len).fold((self.fingerprint, self.json_items), |acc, item| {
                (acc.0.xor(item.digest), acc.1 - usize::from(item.json))
            })
        };

        let new_offset = tail_offset_for(n);
        let tail = self.chunk_at(new_offset)[..n - new_offset].to_vec();

        let leaves = new_offset >> CHUNK_BITS;
        let (mut root, mut shift) = if leaves == 0 {
            (empty_root(), CHUNK_BITS)
        } else {
            (trim(self.shift, &self.root, leaves), self.shift)
        };
        // Drop single-child levels left over from the longer source.
        while shift > CHUNK_BITS && root.children().len() == 1 {
            root = Arc::clone(&root.children()[0]);
            shift -= CHUNK_BITS;
        }

        Self {
            len: n,
            shift,
            root,
            tail,
            fingerprint,
            json_items,
        }
    }
}

const fn tail_offset_for(len: usize) -> usize {
    if len < CHUNK {
        0
    } else {
        ((len - 1) >> CHUNK_BITS) << CHUNK_BITS
    }
}

fn fold_item(acc: (Fingerprint, usize), item: &Item) -> (Fingerprint, usize) {
    (acc.0.xor(item.digest), acc.1 + usize::from(item.json))
}

impl Canonical for VecBody {
    fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    fn deep_eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self.fingerprint == other.fingerprint
            && self.items().zip(other.items()).all(|(a, b)| a.value == b.value)
    }

    fn table() -> &'static CanonicalTable<Self> {
        &VEC_TABLE
    }

    fn detach(&mut self, nested: &mut Vec<Value>) {
        for item in self.tail.drain(..) {
            defer(item.value, nested);
        }
        let mut stack = vec![mem::replace(&mut self.root, empty_root())];
        while let Some(node) = stack.pop() {
            match Arc::try_unwrap(node) {
                Ok(VNode::Branch(children)) => stack.extend(children),
                Ok(VNode::Leaf(items)) => {
                    for item in items {
                        defer(item.value, nested);
                    }
                }
                Err(_shared) => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Item iteration
// ---------------------------------------------------------------------------

/// Double-ended walk over `[front, back)` that descends once per chunk.
#[derive(Clone)]
struct Items<'a> {
    body: &'a VecBody,
    front: usize,
    back: usize,
    front_chunk: &'a [Item],
    back_chunk: &'a [Item],
}

impl<'a> Items<'a> {
    const fn new(body: &'a VecBody, front: usize, back: usize) -> Self {
        Self {
            body,
            front,
            back,
            front_chunk: &[],
            back_chunk: &[],
        }
    }
}

impl<'a> Iterator for Items<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<&'a Item> {
        if self.front >= self.back {
            return None;
        }
        if self.front_chunk.is_empty() {
            let chunk = self.body.chunk_at(self.front);
            self.front_chunk = chunk.get(self.front & MASK..).unwrap_or_default();
        }
        let (first, rest) = self.front_chunk.split_first()?;
        self.front_chunk = rest;
        self.front += 1;
        Some(first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back.saturating_sub(self.front);
        (n, Some(n))
    }
}

impl<'a> DoubleEndedIterator for Items<'a> {
    fn next_back(&mut self) -> Option<&'a Item> {
        if self.front >= self.back {
            return None;
        }
        if self.back_chunk.is_empty() {
            let last = self.back - 1;
            let chunk = self.body.chunk_at(last);
            self.back_chunk = chunk.get(..=last & MASK).unwrap_or_default();
        }
        let (item, rest) = self.back_chunk.split_last()?;
        self.back_chunk = rest;
        self.back -= 1;
        Some(item)
    }
}

impl ExactSizeIterator for Items<'_> {}

/// Iterator over the elements of a [`PersistentVector`], in either direction.
#[derive(Clone)]
pub struct Iter<'a>(Items<'a>);

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        self.0.next().map(|item| &item.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|item| &item.value)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

// ---------------------------------------------------------------------------
// Public handle
// ---------------------------------------------------------------------------

/// Immutable sequence whose equal instances are shared process-wide.
///
/// Element equality is strict: `Int(3)` and `Float(3.0)` are different
/// elements, so [`count`](Self::count) and [`index`](Self::index) never
/// conflate them.
#[derive(Clone)]
pub struct PersistentVector(Arc<Shared<VecBody>>);

impl PersistentVector {
    fn intern(body: VecBody) -> Self {
        Self(VEC_TABLE.intern(body))
    }

    /// Returns the canonical empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self::intern(VecBody::empty())
    }

    /// Builds a vector from values, interned once.
    #[must_use]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut body = VecBody::empty();
        for v in values {
            body.push_value(v.into());
        }
        Self::intern(body)
    }

    /// Returns a vector with `value` appended.
    #[must_use]
    pub fn append(&self, value: impl Into<Value>) -> Self {
        let mut body = (**self.0).clone();
        body.push_value(value.into());
        Self::intern(body)
    }

    /// Returns a vector with every value of `values` appended.
    #[must_use]
    pub fn extend<I>(&self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut body = (**self.0).clone();
        let before = body.len;
        for v in values {
            body.push_value(v.into());
        }
        if body.len == before { self.clone() } else { Self::intern(body) }
    }

    /// Returns `self` followed by `other`.
    ///
    /// Element fingerprints of `other` are reused; an empty operand yields
    /// the other side unchanged.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut body = (**self.0).clone();
        for item in other.0.items() {
            let moved = item.moved_to(body.len);
            body.push(moved);
        }
        Self::intern(body)
    }

    /// Returns the half-open range `[start, stop)`, clamped to the length.
    ///
    /// A prefix keeps the source's aligned chunks; the full range is `self`.
    #[must_use]
    pub fn slice(&self, start: usize, stop: usize) -> Self {
        let stop = cmp::min(stop, self.len());
        let start = cmp::min(start, stop);
        if start == 0 && stop == self.len() {
            return self.clone();
        }
        if start == 0 {
            return Self::intern(self.0.take(stop));
        }
        let mut body = VecBody::empty();
        for item in Items::new(&self.0, start, stop) {
            let moved = item.moved_to(body.len);
            body.push(moved);
        }
        Self::intern(body)
    }

    /// Returns every `step`-th element of `[start, stop)`, clamped to the
    /// length.
    ///
    /// Each element keeps its value fingerprint; only the positional digests
    /// are recomputed before the result is interned.
    #[must_use]
    pub fn slice_step(&self, start: usize, stop: usize, step: NonZeroUsize) -> Self {
        if step.get() == 1 {
            return self.slice(start, stop);
        }
        let stop = cmp::min(stop, self.len());
        let start = cmp::min(start, stop);
        let mut body = VecBody::empty();
        for item in Items::new(&self.0, start, stop).step_by(step.get()) {
            let moved = item.moved_to(body.len);
            body.push(moved);
        }
        Self::intern(body)
    }

    /// Returns the elements repeated `n` times.
    #[must_use]
    pub fn repeat(&self, n: usize) -> Self {
        match n {
            0 => Self::new(),
            1 => self.clone(),
            _ => {
                let mut body = (**self.0).clone();
                for _ in 1..n {
                    for item in self.0.items() {
                        let moved = item.moved_to(body.len);
                        body.push(moved);
                    }
                }
                Self::intern(body)
            }
        }
    }

    /// Returns a vector with the element at `index` replaced.
    ///
    /// If the element is already strictly equal to `value`, returns `self`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len`.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        let current = self.get(index)?;
        if *current == value {
            return Ok(self.clone());
        }
        let mut body = (**self.0).clone();
        body.replace(index, Item::new(value, index));
        Ok(Self::intern(body))
    }
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

impl PersistentVector {
    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len`.
    pub fn get(&self, index: usize) -> Result<&Value> {
        self.0
            .item(index)
            .map(|item| &item.value)
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.0.item(0).map(|item| &item.value)
    }

    /// Returns the last element.
    #[must_use]
    pub fn last(&self) -> Option<&Value> {
        self.0.tail.last().map(|item| &item.value)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len
    }

    /// Returns `true` if the vector has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    /// Number of elements strictly equal to `value`.
    #[must_use]
    pub fn count(&self, value: &Value) -> usize {
        self.iter().filter(|v| *v == value).count()
    }

    /// Position of the first element strictly equal to `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no element matches.
    pub fn index(&self, value: &Value) -> Result<usize> {
        self.index_in(value, 0, self.len())
    }

    /// Position of the first element strictly equal to `value` within
    /// `[start, stop)` (clamped).
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no element in the range matches.
    pub fn index_in(&self, value: &Value, start: usize, stop: usize) -> Result<usize> {
        let stop = cmp::min(stop, self.len());
        let start = cmp::min(start, stop);
        Items::new(&self.0, start, stop)
            .position(|item| item.value == *value)
            .map(|pos| start + pos)
            .ok_or_else(|| Error::ValueNotFound {
                value: value.clone(),
            })
    }

    /// Returns `true` if some element is strictly equal to `value`.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.iter().any(|v| v == value)
    }

    /// Iterates over the elements; reversible with `.rev()`.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.0.items())
    }

    /// Content fingerprint: XOR of all positional item digests.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.0.fingerprint
    }

    /// Returns `true` if every element is JSON-compatible. O(1).
    #[must_use]
    pub fn is_json_compatible(&self) -> bool {
        self.0.json_items == self.0.len
    }

    /// Mutable annotations shared by every handle to this instance.
    ///
    /// The sidecar must not hold a strong reference back to this instance,
    /// or the instance is never reclaimed; store a [`WeakVector`] instead.
    #[must_use]
    pub fn meta(&self) -> &Sidecar {
        self.0.sidecar()
    }

    /// Creates a weak handle to this instance.
    #[must_use]
    pub fn downgrade(&self) -> WeakVector {
        WeakVector(Arc::downgrade(&self.0))
    }

    /// Returns `true` if both handles refer to the same canonical instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live canonical vectors in the process.
    #[must_use]
    pub fn instance_count() -> usize {
        VEC_TABLE.live()
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl Default for PersistentVector {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PersistentVector {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for PersistentVector {}

impl Hash for PersistentVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.fingerprint.hash(state);
    }
}

impl fmt::Debug for PersistentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PersistentVector(")?;
        f.debug_list().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

impl fmt::Display for PersistentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl<V: Into<Value>> FromIterator<V> for PersistentVector {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl ops::Index<usize> for PersistentVector {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<'a> IntoIterator for &'a PersistentVector {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Weak handle to a canonical [`PersistentVector`].
///
/// Does not keep the instance alive. Once the last strong handle drops,
/// [`upgrade`](Self::upgrade) returns `None` for good, even if an equal
/// vector is built again later.
#[derive(Clone)]
pub struct WeakVector(Weak<Shared<VecBody>>);

impl WeakVector {
    /// Returns a strong handle if the instance is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<PersistentVector> {
        self.0.upgrade().map(PersistentVector)
    }

    /// Returns `true` if the instance has been reclaimed.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl fmt::Debug for WeakVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dead() {
            f.write_str("WeakVector(dead)")
        } else {
            f.write_str("WeakVector(..)")
        }
    }
}
