use crate::{PersistentMap, PersistentVector, Value};

#[test]
fn scalars() {
    for v in [
        Value::Null,
        Value::Bool(true),
        Value::Int(1),
        Value::Float(0.5),
        Value::from("s"),
    ] {
        assert!(v.is_json_compatible(), "{v:?}");
    }
    for v in [
        Value::bytes(b"x"),
        Value::tuple([1]),
        Value::opaque(()),
    ] {
        assert!(!v.is_json_compatible(), "{v:?}");
    }
}

#[test]
fn empty_containers_are_compatible() {
    assert!(PersistentMap::new().is_json_compatible());
    assert!(PersistentVector::new().is_json_compatible());
}

#[test]
fn offending_value_then_discard() {
    let m = PersistentMap::new().set("a", 1).set("b", Value::opaque(42_u32));
    assert!(!m.is_json_compatible());
    let fixed = m.discard(&Value::from("b"));
    assert!(fixed.is_json_compatible());
}

#[test]
fn overwrite_updates_flag() {
    let m = PersistentMap::new().set("a", Value::bytes(b"raw"));
    assert!(!m.is_json_compatible());
    assert!(m.set("a", "text").is_json_compatible());
}

#[test]
fn non_text_key_is_never_compatible() {
    assert!(!PersistentMap::new().set(1, "x").is_json_compatible());
    assert!(!PersistentMap::new().set(Value::Null, Value::Null).is_json_compatible());
    assert!(
        !PersistentMap::new()
            .set(PersistentMap::new(), 1)
            .is_json_compatible()
    );
}

#[test]
fn nested_flags_propagate() {
    let bad = PersistentVector::from_values([Value::Int(1), Value::bytes(b"x")]);
    let good = PersistentVector::from_values([1, 2]);
    assert!(!bad.is_json_compatible());
    assert!(good.is_json_compatible());

    let m = PersistentMap::new().set("good", good);
    assert!(m.is_json_compatible());
    assert!(!m.set("bad", bad.clone()).is_json_compatible());

    let outer = PersistentVector::from_values([Value::Map(m), Value::List(bad)]);
    assert!(!outer.is_json_compatible());
}

#[test]
fn vector_set_and_slice_update_flag() {
    let v = PersistentVector::from_values([Value::Int(1), Value::opaque(()), Value::Int(3)]);
    assert!(!v.is_json_compatible());
    assert!(v.set(1, 2).expect("in range").is_json_compatible());
    assert!(v.slice(0, 1).is_json_compatible());
    assert!(v.slice(2, 3).is_json_compatible());
    assert!(!v.slice(1, 2).is_json_compatible());
}
