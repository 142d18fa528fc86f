//! Lookup operation: traverses the trie to find a key.

use crate::node::{self, Entry, Node, Probe};

/// Searches for `probe` in the subtree rooted at `node`.
///
/// Returns a reference to the matching entry if found.
pub fn get_recursive<'a>(node: &'a Node, probe: &Probe<'_>, shift: u32) -> Option<&'a Entry> {
    match node {
        Node::Inner {
            data_map,
            node_map,
            entries,
            children,
        } => {
            let frag = node::fragment(probe.hash, shift);
            let bit = node::mask(frag);

            if data_map & bit != 0 {
                // Position has an inline entry.
                let entry = &entries[node::index(*data_map, bit)];
                entry.matches(probe).then_some(entry)
            } else if node_map & bit != 0 {
                // Position has a child subtree: recurse.
                let child = &children[node::index(*node_map, bit)];
                get_recursive(child, probe, shift + node::BITS_PER_LEVEL)
            } else {
                // Position is empty.
                None
            }
        }
        Node::Collision { hash, entries } => {
            if probe.hash != *hash {
                return None;
            }
            // Linear search through collision entries.
            entries.iter().find(|e| e.matches(probe))
        }
    }
}
