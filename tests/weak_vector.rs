//! Weak handles to vectors. Runs in its own binary: the counters are
//! process-global.

use champ_canon::{PersistentVector, Value};

#[test]
fn weak_vector_dies_with_last_handle() {
    assert_eq!(PersistentVector::instance_count(), 0);
    let v = PersistentVector::from_values([1, 2]);
    assert_eq!(PersistentVector::instance_count(), 1);

    let weak = v.downgrade();
    assert_eq!(PersistentVector::instance_count(), 1);
    assert!(weak.upgrade().is_some_and(|up| up.ptr_eq(&v)));

    drop(v);
    assert_eq!(PersistentVector::instance_count(), 0);
    assert!(weak.is_dead());
    assert!(weak.upgrade().is_none());

    let again = PersistentVector::from_values([1, 2]);
    assert_eq!(PersistentVector::instance_count(), 1);
    assert!(weak.upgrade().is_none());

    again.meta().insert("self", Value::opaque(again.downgrade()));
    drop(again);
    assert_eq!(PersistentVector::instance_count(), 0);
}
