//! Insertion operation: path-copy insert.

use std::sync::Arc;

use crate::node::{self, Entry, Node};

/// Outcome of a recursive insert.
pub struct InsertOutcome {
    /// New root of the modified subtree.
    pub node: Node,
    /// The entry that was replaced, or `None` if the key was new.
    pub replaced: Option<Entry>,
}

/// Inserts `entry` into the subtree rooted at `node` via path-copy.
///
/// Only the nodes on the path are rebuilt; every other child is shared.
pub fn insert_recursive(node: &Node, entry: Entry, shift: u32) -> InsertOutcome {
    match node {
        Node::Inner {
            data_map,
            node_map,
            entries,
            children,
        } => insert_into_inner(*data_map, *node_map, entries, children, entry, shift),
        Node::Collision { hash, entries } => insert_into_collision(*hash, entries, entry),
    }
}

// ---------------------------------------------------------------------------
// Inner node insert
// ---------------------------------------------------------------------------

fn insert_into_inner(
    data_map: u32,
    node_map: u32,
    entries: &[Entry],
    children: &[Arc<Node>],
    entry: Entry,
    shift: u32,
) -> InsertOutcome {
    let frag = node::fragment(entry.hash, shift);
    let bit = node::mask(frag);

    if data_map & bit != 0 {
        let pos = node::index(data_map, bit);
        let existing = &entries[pos];

        if existing.matches(&entry.probe()) {
            // Same key → replace value.
            let mut new_entries = entries.to_vec();
            let old = std::mem::replace(&mut new_entries[pos], entry);
            InsertOutcome {
                node: Node::Inner {
                    data_map,
                    node_map,
                    entries: new_entries,
                    children: children.to_vec(),
                },
                replaced: Some(old),
            }
        } else {
            // Different key at same position → push both into a subtree.
            let subtree = create_subtree(existing.clone(), entry, shift + node::BITS_PER_LEVEL);

            let new_data_map = data_map & !bit;
            let new_node_map = node_map | bit;
            let child_pos = node::index(new_node_map, bit);

            let mut new_entries = entries.to_vec();
            new_entries.remove(pos);
            let mut new_children = children.to_vec();
            new_children.insert(child_pos, Arc::new(subtree));

            InsertOutcome {
                node: Node::Inner {
                    data_map: new_data_map,
                    node_map: new_node_map,
                    entries: new_entries,
                    children: new_children,
                },
                replaced: None,
            }
        }
    } else if node_map & bit != 0 {
        // Position has child subtree → recurse.
        let child_pos = node::index(node_map, bit);
        let outcome = insert_recursive(&children[child_pos], entry, shift + node::BITS_PER_LEVEL);

        let mut new_children = children.to_vec();
        new_children[child_pos] = Arc::new(outcome.node);

        InsertOutcome {
            node: Node::Inner {
                data_map,
                node_map,
                entries: entries.to_vec(),
                children: new_children,
            },
            replaced: outcome.replaced,
        }
    } else {
        // Position empty → add inline entry.
        let new_data_map = data_map | bit;
        let mut new_entries = entries.to_vec();
        new_entries.insert(node::index(new_data_map, bit), entry);

        InsertOutcome {
            node: Node::Inner {
                data_map: new_data_map,
                node_map,
                entries: new_entries,
                children: children.to_vec(),
            },
            replaced: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Collision node insert
// ---------------------------------------------------------------------------

fn insert_into_collision(node_hash: u64, entries: &[Entry], entry: Entry) -> InsertOutcome {
    let mut new_entries = entries.to_vec();

    let replaced = if let Some(pos) = entries.iter().position(|e| e.matches(&entry.probe())) {
        Some(std::mem::replace(&mut new_entries[pos], entry))
    } else {
        new_entries.push(entry);
        None
    };

    InsertOutcome {
        node: Node::Collision {
            hash: node_hash,
            entries: new_entries,
        },
        replaced,
    }
}

// ---------------------------------------------------------------------------
// Subtree creation
// ---------------------------------------------------------------------------

/// Creates a subtree from two entries that collide at the current depth.
///
/// Recursively descends until hash fragments differ, or creates a collision
/// node past `MAX_SHIFT`.
fn create_subtree(e1: Entry, e2: Entry, shift: u32) -> Node {
    if shift > node::MAX_SHIFT {
        return Node::Collision {
            hash: e1.hash,
            entries: vec![e1, e2],
        };
    }

    let f1 = node::fragment(e1.hash, shift);
    let f2 = node::fragment(e2.hash, shift);

    if f1 == f2 {
        let child = create_subtree(e1, e2, shift + node::BITS_PER_LEVEL);
        Node::Inner {
            data_map: 0,
            node_map: node::mask(f1),
            entries: Vec::new(),
            children: vec![Arc::new(child)],
        }
    } else {
        let entries = if f1 < f2 { vec![e1, e2] } else { vec![e2, e1] };
        Node::Inner {
            data_map: node::mask(f1) | node::mask(f2),
            node_map: 0,
            entries,
            children: Vec::new(),
        }
    }
}
