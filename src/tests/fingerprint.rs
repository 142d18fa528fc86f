use crate::digest::Sha1;
use crate::fingerprint::{self, INLINE_MAX};
use crate::{Fingerprint, PersistentMap, PersistentVector, Value};

#[test]
fn short_scalars_are_inline() {
    let fp = Value::from("hi").fingerprint();
    let bytes = fp.as_bytes();
    assert_eq!(bytes[1], 2);
    assert_eq!(&bytes[2..4], b"hi");
    assert!(bytes[4..].iter().all(|&b| b == 0));
}

#[test]
fn long_text_is_digested() {
    let long = "y".repeat(INLINE_MAX + 1);
    let mut ctx = Sha1::new();
    ctx.update(b"unc")
        .update(&(long.len() as u64).to_le_bytes())
        .update(long.as_bytes());
    assert_eq!(
        Value::from(long.as_str()).fingerprint(),
        Fingerprint::from_bytes(ctx.finalize())
    );
}

#[test]
fn inline_threshold() {
    assert!(Fingerprint::inline(1, &[0; INLINE_MAX]).is_some());
    assert!(Fingerprint::inline(1, &[0; INLINE_MAX + 1]).is_none());
}

#[test]
fn equal_values_have_equal_fingerprints() {
    let a = String::from("same content, separate allocation, long enough");
    let b = a.clone();
    assert_eq!(Value::from(a).fingerprint(), Value::from(b).fingerprint());
    assert_eq!(
        Value::tuple([1, 2, 3]).fingerprint(),
        Value::tuple([1, 2, 3]).fingerprint()
    );
}

#[test]
fn types_are_distinguished() {
    let values = [
        Value::Null,
        Value::Bool(false),
        Value::Int(0),
        Value::Float(0.0),
        Value::Float(-0.0),
        Value::from(""),
        Value::bytes(b""),
        Value::tuple(Vec::<Value>::new()),
        Value::Map(PersistentMap::new()),
        Value::List(PersistentVector::new()),
    ];
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            assert_ne!(a.fingerprint(), b.fingerprint(), "{a:?} vs {b:?}");
            assert_ne!(a, b);
        }
    }
}

#[test]
fn tuple_encoding_is_unambiguous() {
    let ab_c = Value::tuple([Value::from("ab"), Value::from("c")]);
    let a_bc = Value::tuple([Value::from("a"), Value::from("bc")]);
    assert_ne!(ab_c.fingerprint(), a_bc.fingerprint());
}

#[test]
fn opaque_values_are_identity_hashed() {
    let a = Value::opaque(5_u8);
    let b = Value::opaque(5_u8);
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
    assert_eq!(a.fingerprint(), a.clone().fingerprint());
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn xor_is_self_inverse() {
    let a = Value::from("a").fingerprint();
    let b = Value::Int(7).fingerprint();
    assert_eq!(a.xor(b).xor(b), a);
    assert_eq!(a.xor(b), b.xor(a));
    assert_eq!(a.xor(a), Fingerprint::ZERO);
}

#[test]
fn map_fingerprint_is_xor_of_entry_digests() {
    let map = PersistentMap::from_pairs([("a", 1), ("b", 2)]);
    let expected = fingerprint::entry_digest(
        &Value::from("a").fingerprint(),
        &Value::Int(1).fingerprint(),
    )
    .xor(fingerprint::entry_digest(
        &Value::from("b").fingerprint(),
        &Value::Int(2).fingerprint(),
    ));
    assert_eq!(map.fingerprint(), expected);
}

#[test]
fn vector_fingerprint_is_positional() {
    let ab = PersistentVector::from_values(["a", "b"]);
    let ba = PersistentVector::from_values(["b", "a"]);
    assert_ne!(ab.fingerprint(), ba.fingerprint());

    let expected = fingerprint::item_digest(&Value::from("a").fingerprint(), 0)
        .xor(fingerprint::item_digest(&Value::from("b").fingerprint(), 1));
    assert_eq!(ab.fingerprint(), expected);
}

#[test]
fn trie_hash_spreads_small_integers() {
    let low_fragments: std::collections::HashSet<u64> = (0..64_i64)
        .map(|i| Value::Int(i).fingerprint().trie_hash() & 0x1F)
        .collect();
    assert!(low_fragments.len() > 16);
}

#[test]
fn display_is_hex() {
    let fp = Fingerprint::from_bytes(Sha1::digest(b"abc"));
    assert_eq!(fp.to_string(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    assert_eq!(
        format!("{fp:?}"),
        "Fingerprint(a9993e364706816aba3e25717850c26c9cd0d89d)"
    );
}
