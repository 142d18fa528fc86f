//! Randomized leak check: after every handle produced by a long run of
//! set/discard/append/slice/concat is dropped, no canonical instance is left.

use champ_canon::{PersistentMap, PersistentVector, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

const STEPS: usize = 5_000;
const POOL: usize = 32;

fn random_value(rng: &mut StdRng, maps: &[PersistentMap], vectors: &[PersistentVector]) -> Value {
    match rng.gen_range(0..6) {
        0 => Value::Int(rng.gen_range(-50..50)),
        1 => Value::from(format!("s{}", rng.gen_range(0..40))),
        2 => Value::Float(f64::from(rng.gen_range(0..10_u8)) / 2.0),
        3 if !maps.is_empty() => Value::Map(maps[rng.gen_range(0..maps.len())].clone()),
        4 if !vectors.is_empty() => Value::List(vectors[rng.gen_range(0..vectors.len())].clone()),
        _ => Value::Null,
    }
}

#[test]
fn randomized_operations_leave_no_live_instances() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut rng = StdRng::seed_from_u64(123);
    let mut maps = vec![PersistentMap::new()];
    let mut vectors = vec![PersistentVector::new()];

    for _ in 0..STEPS {
        let m = rng.gen_range(0..maps.len());
        let v = rng.gen_range(0..vectors.len());
        match rng.gen_range(0..8) {
            0 | 1 => {
                let key = Value::Int(rng.gen_range(0..30));
                let value = random_value(&mut rng, &maps, &vectors);
                let next = maps[m].set(key, value);
                maps.push(next);
            }
            2 => {
                let next = maps[m].discard(&Value::Int(rng.gen_range(0..30)));
                maps.push(next);
            }
            3 | 4 => {
                let value = random_value(&mut rng, &maps, &vectors);
                let next = vectors[v].append(value);
                vectors.push(next);
            }
            5 => {
                let len = vectors[v].len();
                let start = rng.gen_range(0..=len);
                let stop = rng.gen_range(start..=len);
                let next = vectors[v].slice(start, stop);
                vectors.push(next);
            }
            6 => {
                let w = rng.gen_range(0..vectors.len());
                let next = vectors[v].concat(&vectors[w]);
                vectors.push(next);
            }
            _ => {
                if maps.len() > 1 {
                    maps.swap_remove(m);
                }
                if vectors.len() > 1 {
                    vectors.swap_remove(v);
                }
            }
        }
        if maps.len() > POOL {
            maps.swap_remove(rng.gen_range(0..maps.len()));
        }
        if vectors.len() > POOL {
            vectors.swap_remove(rng.gen_range(0..vectors.len()));
        }
    }

    assert!(PersistentMap::instance_count() > 0);
    drop(maps);
    drop(vectors);
    assert_eq!(PersistentMap::instance_count(), 0);
    assert_eq!(PersistentVector::instance_count(), 0);
}
