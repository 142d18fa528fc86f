use std::sync::{Arc, Barrier};
use std::thread;

use crate::{PersistentMap, PersistentVector, Value};

const THREADS: usize = 8;

/// Threads racing to build the same value converge on one instance.
#[test]
fn racing_builders_converge() {
    for round in 0..20_i64 {
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    PersistentMap::from_pairs((0..50_i64).map(|i| (i, i + round)))
                })
            })
            .collect();
        let maps: Vec<PersistentMap> = handles
            .into_iter()
            .map(|h| h.join().expect("builder panicked"))
            .collect();
        for m in &maps[1..] {
            assert!(m.ptr_eq(&maps[0]), "round {round}");
        }
    }
}

/// Different construction paths on different threads still converge.
#[test]
fn racing_vector_paths_converge() {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                match t % 3 {
                    0 => PersistentVector::from_values(0..500_i64),
                    1 => (0..500_i64).fold(PersistentVector::new(), |v, i| v.append(i)),
                    _ => PersistentVector::from_values(0..250_i64)
                        .concat(&PersistentVector::from_values(250..500_i64)),
                }
            })
        })
        .collect();
    let vectors: Vec<PersistentVector> = handles
        .into_iter()
        .map(|h| h.join().expect("builder panicked"))
        .collect();
    for v in &vectors[1..] {
        assert!(v.ptr_eq(&vectors[0]));
    }
}

/// Dropping and rebuilding the same value concurrently never hands out a
/// torn-down instance.
#[test]
fn release_races_with_lookup() {
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            thread::spawn(|| {
                for i in 0..500_i64 {
                    let m = PersistentMap::new().set("release-race", i % 4);
                    assert_eq!(m.get(&Value::from("release-race")), Some(&Value::Int(i % 4)));
                    assert_eq!(m.len(), 1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker panicked");
    }
}

#[test]
fn handles_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PersistentMap>();
    assert_send_sync::<PersistentVector>();
    assert_send_sync::<Value>();
}

/// Sidecar writes from many threads land in the one shared store.
#[test]
fn concurrent_sidecar_writes() {
    let m = PersistentMap::from_pairs([("sidecar-threads", 1)]);
    thread::scope(|s| {
        for t in 0..THREADS {
            let m = m.clone();
            s.spawn(move || {
                m.meta().insert(format!("t{t}"), Value::Int(i64::try_from(t).expect("small")));
            });
        }
    });
    assert_eq!(m.meta().len(), THREADS);
}
