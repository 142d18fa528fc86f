use crate::{PersistentMap, PersistentVector, Value};

/// `set` never changes the receiver.
#[test]
fn set_leaves_original_unchanged() {
    let m1 = PersistentMap::from_pairs([("k", 1), ("other", 2)]);
    let m2 = m1.set("k", 99);

    assert_eq!(m1.get(&Value::from("k")), Some(&Value::Int(1)));
    assert_eq!(m2.get(&Value::from("k")), Some(&Value::Int(99)));
    assert_eq!(m1.len(), 2);
    assert!(!m1.ptr_eq(&m2));
}

#[test]
fn discard_leaves_original_unchanged() {
    let m1 = PersistentMap::from_pairs([("a", 1), ("b", 2)]);
    let m2 = m1.discard(&Value::from("a"));
    assert!(m1.contains_key(&Value::from("a")));
    assert!(!m2.contains_key(&Value::from("a")));
}

/// Every historical version stays intact while later versions are built.
#[test]
fn version_history() {
    let mut versions = vec![PersistentMap::new()];
    for i in 0..200_i64 {
        let next = versions[versions.len() - 1].set(i, i * i);
        versions.push(next);
    }
    for (n, map) in versions.iter().enumerate() {
        assert_eq!(map.len(), n);
        for i in 0..i64::try_from(n).expect("small") {
            assert_eq!(map.get(&Value::Int(i)), Some(&Value::Int(i * i)));
        }
    }
}

/// Removing from a large map keeps both versions readable.
#[test]
fn remove_from_large_map() {
    let full: PersistentMap = (0..1000_i64).map(|i| (i, i)).collect();
    let mut shrunk = full.clone();
    for i in (0..1000_i64).step_by(3) {
        shrunk = shrunk.discard(&Value::Int(i));
    }
    assert_eq!(full.len(), 1000);
    assert_eq!(shrunk.len(), 666);
    for i in 0..1000_i64 {
        assert_eq!(full.get(&Value::Int(i)), Some(&Value::Int(i)));
        assert_eq!(shrunk.contains_key(&Value::Int(i)), i % 3 != 0);
    }
}

#[test]
fn vector_operations_leave_original_unchanged() {
    let v = PersistentVector::from_values(0..100_i64);
    let appended = v.append(100);
    let replaced = v.set(50, "x").expect("in range");
    let sliced = v.slice(10, 20);

    assert_eq!(v.len(), 100);
    assert_eq!(v[50], Value::Int(50));
    assert_eq!(v.last(), Some(&Value::Int(99)));
    assert_eq!(appended.len(), 101);
    assert_eq!(replaced[50], Value::from("x"));
    assert_eq!(sliced.len(), 10);
}

/// Appending to a shared prefix from two branches keeps them apart.
#[test]
fn vector_branching_histories() {
    let base = PersistentVector::from_values(0..40_i64);
    let left = base.append("left");
    let right = base.append("right");
    assert_eq!(left.last(), Some(&Value::from("left")));
    assert_eq!(right.last(), Some(&Value::from("right")));
    assert_eq!(base.len(), 40);
    assert_eq!(base.last(), Some(&Value::Int(39)));
}
