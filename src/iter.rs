//! Iterator types for persistent maps.

use std::iter::FusedIterator;
use std::slice;

use crate::node::{Entry, Node};
use crate::value::Value;

/// Iterator over `(&key, &value)` pairs of a [`PersistentMap`](crate::PersistentMap).
///
/// Depth-first over the trie: a node's inline entries, then its children in
/// bitmap order. The order is stable for a given instance.
#[derive(Clone)]
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
    entries: slice::Iter<'a, Entry>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(root: Option<&'a Node>, len: usize) -> Self {
        Self {
            stack: root.into_iter().collect(),
            entries: slice::Iter::default(),
            remaining: len,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Value, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.entries.next() {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            let node = self.stack.pop()?;
            self.entries = node.entries().iter();
            self.stack.extend(node.children().iter().rev().map(|c| &**c));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// Iterator over the keys of a [`PersistentMap`](crate::PersistentMap).
#[derive(Clone)]
pub struct Keys<'a>(pub(crate) Iter<'a>);

impl<'a> Iterator for Keys<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Keys<'_> {}

impl FusedIterator for Keys<'_> {}

/// Iterator over the values of a [`PersistentMap`](crate::PersistentMap).
#[derive(Clone)]
pub struct Values<'a>(pub(crate) Iter<'a>);

impl<'a> Iterator for Values<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Values<'_> {}

impl FusedIterator for Values<'_> {}
