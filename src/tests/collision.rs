//! Full 64-bit hash collisions cannot be produced through fingerprints, so
//! these tests drive the trie operations directly with forced hashes.

use crate::node::{Entry, Node};
use crate::ops::get::get_recursive;
use crate::ops::insert::insert_recursive;
use crate::ops::remove::{RemoveOutcome, remove_recursive};
use crate::value::Value;

/// An entry whose trie hash is overridden.
fn colliding(id: i64, hash: u64) -> Entry {
    let mut entry = Entry::new(Value::Int(id), Value::Int(id * 10));
    entry.hash = hash;
    entry
}

fn build(entries: &[Entry]) -> Node {
    let mut node = Node::leaf(entries[0].clone(), 0);
    for e in &entries[1..] {
        node = insert_recursive(&node, e.clone(), 0).node;
    }
    node
}

fn lookup<'a>(node: &'a Node, entry: &Entry) -> Option<&'a Value> {
    get_recursive(node, &entry.probe(), 0).map(|e| &e.value)
}

fn remove(node: &Node, entry: &Entry) -> Option<Node> {
    match remove_recursive(node, &entry.probe(), 0) {
        RemoveOutcome::Removed { node, removed } => {
            assert_eq!(removed.key, entry.key);
            node
        }
        RemoveOutcome::NotFound => panic!("{:?} not found", entry.key),
    }
}

fn has_collision(node: &Node) -> bool {
    matches!(node, Node::Collision { .. }) || node.children().iter().any(|c| has_collision(c))
}

/// Two keys with the same 64-bit hash create a collision node.
#[test]
fn two_colliding_keys() {
    let k1 = colliding(1, 0xDEAD_BEEF);
    let k2 = colliding(2, 0xDEAD_BEEF);
    let root = build(&[k1.clone(), k2.clone()]);

    assert!(has_collision(&root));
    assert_eq!(lookup(&root, &k1), Some(&Value::Int(10)));
    assert_eq!(lookup(&root, &k2), Some(&Value::Int(20)));
}

/// Three keys with the same hash.
#[test]
fn three_colliding_keys() {
    let keys: Vec<Entry> = (0..3_i64).map(|i| colliding(i, 0xCAFE)).collect();
    let root = build(&keys);
    for k in &keys {
        assert_eq!(lookup(&root, k), Some(&k.value));
    }
}

/// Same hash, absent key.
#[test]
fn miss_inside_collision() {
    let root = build(&[colliding(1, 0xAAAA), colliding(2, 0xAAAA)]);
    let absent = colliding(3, 0xAAAA);
    assert_eq!(lookup(&root, &absent), None);
    assert!(matches!(
        remove_recursive(&root, &absent.probe(), 0),
        RemoveOutcome::NotFound
    ));
}

/// Remove from a three-entry collision node keeps the other two.
#[test]
fn remove_from_collision() {
    let k1 = colliding(1, 0xAAAA);
    let k2 = colliding(2, 0xAAAA);
    let k3 = colliding(3, 0xAAAA);
    let root = build(&[k1.clone(), k2.clone(), k3.clone()]);

    let root = remove(&root, &k2).expect("two left");
    assert!(has_collision(&root));
    assert_eq!(lookup(&root, &k1), Some(&Value::Int(10)));
    assert_eq!(lookup(&root, &k2), None);
    assert_eq!(lookup(&root, &k3), Some(&Value::Int(30)));
}

/// Overwrite in collision node replaces, never duplicates.
#[test]
fn overwrite_in_collision() {
    let k1 = colliding(1, 0xBBBB);
    let k2 = colliding(2, 0xBBBB);
    let root = build(&[k1.clone(), k2]);

    let mut newer = Entry::new(Value::Int(1), Value::from("new"));
    newer.hash = 0xBBBB;
    let outcome = insert_recursive(&root, newer, 0);
    assert_eq!(outcome.replaced.map(|e| e.value), Some(Value::Int(10)));
    assert_eq!(lookup(&outcome.node, &k1), Some(&Value::from("new")));
}

/// Collision node with remove-all returns to empty.
#[test]
fn collision_remove_all() {
    let k1 = colliding(1, 0xCCCC);
    let k2 = colliding(2, 0xCCCC);
    let root = build(&[k1.clone(), k2.clone()]);

    let root = remove(&root, &k1).expect("one left");
    assert!(remove(&root, &k2).is_none());
}

/// Shrinking a collision to one entry collapses the whole chain back into
/// the root, matching the directly-built tree.
#[test]
fn collision_collapses_to_canonical_form() {
    let a = colliding(1, 0xDEAD_BEEF);
    let b = colliding(2, 0xDEAD_BEEF);
    let other = colliding(3, 0xDEAD_BEE0);
    let root = build(&[a.clone(), b.clone(), other.clone()]);
    assert!(has_collision(&root));

    let root = remove(&root, &b).expect("two left");
    assert!(!has_collision(&root));
    assert!(root.children().is_empty());
    assert_eq!(root.entries().len(), 2);
    assert_eq!(lookup(&root, &a), Some(&Value::Int(10)));
    assert_eq!(lookup(&root, &other), Some(&Value::Int(30)));
}

/// Mixed: some keys collide, some don't.
#[test]
fn mixed_collisions_and_normal() {
    let collide_a = colliding(1, 0xDDDD);
    let collide_b = colliding(2, 0xDDDD);
    let normal = colliding(3, 0xEEEE);
    let root = build(&[collide_a.clone(), collide_b.clone(), normal.clone()]);

    assert_eq!(lookup(&root, &collide_a), Some(&Value::Int(10)));
    assert_eq!(lookup(&root, &collide_b), Some(&Value::Int(20)));
    assert_eq!(lookup(&root, &normal), Some(&Value::Int(30)));
}

/// Keys sharing long hash prefixes force deep single-child chains.
#[test]
fn deep_shared_prefixes() {
    let keys: Vec<Entry> = (0..8_i64).map(|i| colliding(i, i.unsigned_abs() << 55)).collect();
    let root = build(&keys);
    assert!(!has_collision(&root));
    for k in &keys {
        assert_eq!(lookup(&root, k), Some(&k.value));
    }
    let mut node = Some(root);
    for k in &keys {
        node = remove(node.as_ref().expect("non-empty"), k);
    }
    assert!(node.is_none());
}
