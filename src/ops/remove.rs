//! Removal operation: path-copy delete with canonical inlining.

use std::sync::Arc;

use crate::node::{self, Entry, Node, Probe};

/// Outcome of a recursive remove.
pub enum RemoveOutcome {
    /// Key was not found: tree unchanged.
    NotFound,
    /// Key was removed.
    Removed {
        /// New root of the modified subtree, or `None` if the subtree is now empty.
        node: Option<Node>,
        /// The entry that was taken out.
        removed: Entry,
    },
}

/// Removes the probed key from the subtree rooted at `node` via path-copy.
pub fn remove_recursive(node: &Node, probe: &Probe<'_>, shift: u32) -> RemoveOutcome {
    match node {
        Node::Inner {
            data_map,
            node_map,
            entries,
            children,
        } => remove_from_inner(*data_map, *node_map, entries, children, probe, shift),
        Node::Collision { hash, entries } => remove_from_collision(*hash, entries, probe),
    }
}

// ---------------------------------------------------------------------------
// Inner node remove
// ---------------------------------------------------------------------------

fn remove_from_inner(
    data_map: u32,
    node_map: u32,
    entries: &[Entry],
    children: &[Arc<Node>],
    probe: &Probe<'_>,
    shift: u32,
) -> RemoveOutcome {
    let frag = node::fragment(probe.hash, shift);
    let bit = node::mask(frag);

    if data_map & bit != 0 {
        let pos = node::index(data_map, bit);
        if !entries[pos].matches(probe) {
            return RemoveOutcome::NotFound;
        }

        let removed = entries[pos].clone();
        let new_data_map = data_map & !bit;

        // Last entry and no children → empty subtree.
        if new_data_map == 0 && node_map == 0 {
            return RemoveOutcome::Removed {
                node: None,
                removed,
            };
        }

        let mut new_entries = entries.to_vec();
        new_entries.remove(pos);
        RemoveOutcome::Removed {
            node: Some(Node::Inner {
                data_map: new_data_map,
                node_map,
                entries: new_entries,
                children: children.to_vec(),
            }),
            removed,
        }
    } else if node_map & bit != 0 {
        let child_pos = node::index(node_map, bit);
        let outcome = remove_recursive(&children[child_pos], probe, shift + node::BITS_PER_LEVEL);

        match outcome {
            RemoveOutcome::NotFound => RemoveOutcome::NotFound,
            RemoveOutcome::Removed {
                node: Some(child),
                removed,
            } => {
                if let Some(single) = inlinable(&child) {
                    // Child collapsed to one entry: pull it back up.
                    let new_data_map = data_map | bit;
                    let mut new_entries = entries.to_vec();
                    new_entries.insert(node::index(new_data_map, bit), single.clone());
                    let mut new_children = children.to_vec();
                    new_children.remove(child_pos);
                    RemoveOutcome::Removed {
                        node: Some(Node::Inner {
                            data_map: new_data_map,
                            node_map: node_map & !bit,
                            entries: new_entries,
                            children: new_children,
                        }),
                        removed,
                    }
                } else {
                    let mut new_children = children.to_vec();
                    new_children[child_pos] = Arc::new(child);
                    RemoveOutcome::Removed {
                        node: Some(Node::Inner {
                            data_map,
                            node_map,
                            entries: entries.to_vec(),
                            children: new_children,
                        }),
                        removed,
                    }
                }
            }
            RemoveOutcome::Removed {
                node: None,
                removed,
            } => {
                // Child became empty: drop the child slot.
                let new_node_map = node_map & !bit;
                if data_map == 0 && new_node_map == 0 {
                    return RemoveOutcome::Removed {
                        node: None,
                        removed,
                    };
                }
                let mut new_children = children.to_vec();
                new_children.remove(child_pos);
                RemoveOutcome::Removed {
                    node: Some(Node::Inner {
                        data_map,
                        node_map: new_node_map,
                        entries: entries.to_vec(),
                        children: new_children,
                    }),
                    removed,
                }
            }
        }
    } else {
        RemoveOutcome::NotFound
    }
}

/// Canonical form: a child with exactly one entry and no children
/// is inlined back into the parent.
fn inlinable(node: &Node) -> Option<&Entry> {
    match node {
        Node::Inner {
            data_map,
            node_map,
            entries,
            ..
        } if data_map.is_power_of_two() && *node_map == 0 => entries.first(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Collision node remove
// ---------------------------------------------------------------------------

fn remove_from_collision(node_hash: u64, entries: &[Entry], probe: &Probe<'_>) -> RemoveOutcome {
    if probe.hash != node_hash {
        return RemoveOutcome::NotFound;
    }

    let Some(pos) = entries.iter().position(|e| e.matches(probe)) else {
        return RemoveOutcome::NotFound;
    };
    let removed = entries[pos].clone();

    if entries.len() == 2 {
        // One survivor: hand it up as a single-entry node so the parent
        // inlines it. The fragment is irrelevant once inlined.
        let survivor = entries[1 - pos].clone();
        return RemoveOutcome::Removed {
            node: Some(Node::leaf(survivor, 0)),
            removed,
        };
    }

    let mut new_entries = entries.to_vec();
    new_entries.remove(pos);
    RemoveOutcome::Removed {
        node: Some(Node::Collision {
            hash: node_hash,
            entries: new_entries,
        }),
        removed,
    }
}
