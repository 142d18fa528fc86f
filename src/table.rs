//! Process-wide canonicalization (hash-consing) tables.
//!
//! Every map or vector that escapes to a caller lives in an
//! `Arc<Shared<T>>` registered in its kind's [`CanonicalTable`]. A table
//! holds only weak references, so reclamation is driven by ordinary
//! reference counting: the drop of the last strong handle runs
//! [`Shared`]'s `Drop`, which removes the weak entry.
//!
//! # Locking
//!
//! The table is split into [`SHARD_COUNT`] shards selected by fingerprint.
//! No `Arc` is released and no candidate body is dropped while a shard lock
//! is held: such drops may cascade into nested containers, whose release
//! hooks lock other shards (or the same one).
//!
//! # Reclamation
//!
//! A dying instance hands its nested containers to a per-thread worklist
//! instead of dropping them in place, so releasing an arbitrarily deep
//! value uses constant stack.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::mem;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::fingerprint::Fingerprint;
use crate::sidecar::Sidecar;
use crate::value::Value;

/// Number of independently locked shards per table.
pub const SHARD_COUNT: usize = 64;

/// A container body that can be interned.
pub trait Canonical: Sized + Send + Sync + 'static {
    /// Content fingerprint; equal bodies have equal fingerprints.
    fn fingerprint(&self) -> Fingerprint;

    /// Strict deep equality between two bodies of the same kind.
    fn deep_eq(&self, other: &Self) -> bool;

    /// The process-global table for this kind.
    fn table() -> &'static CanonicalTable<Self>;

    /// Empties the body, moving out every element that may own another
    /// canonical instance. Nodes still shared with other bodies stay put.
    fn detach(&mut self, nested: &mut Vec<Value>);
}

/// A canonical instance: the interned body plus its lazily created sidecar.
pub struct Shared<T: Canonical> {
    body: T,
    sidecar: OnceLock<Sidecar>,
}

impl<T: Canonical> Shared<T> {
    /// Returns the instance's sidecar, creating it on first access.
    pub fn sidecar(&self) -> &Sidecar {
        self.sidecar.get_or_init(Sidecar::default)
    }
}

impl<T: Canonical> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.body
    }
}

impl<T: Canonical> Drop for Shared<T> {
    fn drop(&mut self) {
        T::table().release(self);
        let mut nested = Vec::new();
        self.body.detach(&mut nested);
        if let Some(sidecar) = self.sidecar.take() {
            for value in sidecar.into_values() {
                defer(value, &mut nested);
            }
        }
        reclaim(nested);
    }
}

/// Moves `value` to `nested` if dropping it could release a container.
pub(crate) fn defer(value: Value, nested: &mut Vec<Value>) {
    if matches!(value, Value::Map(_) | Value::List(_) | Value::Tuple(_)) {
        nested.push(value);
    }
}

thread_local! {
    static DRAINING: Cell<bool> = const { Cell::new(false) };
    static PENDING: RefCell<Vec<Value>> = const { RefCell::new(Vec::new()) };
}

/// Drops `nested` iteratively.
///
/// The outermost call on a thread drains the worklist; drops it triggers
/// re-enter here and only enqueue.
fn reclaim(mut nested: Vec<Value>) {
    if nested.is_empty() {
        return;
    }
    let outermost = DRAINING.with(|draining| !draining.replace(true));
    if !outermost {
        // Falls back to dropping in place during thread teardown.
        let _ = PENDING.try_with(|pending| pending.borrow_mut().append(&mut nested));
        return;
    }
    loop {
        while let Some(value) = nested.pop() {
            drop(value);
        }
        nested = PENDING
            .try_with(|pending| mem::take(&mut *pending.borrow_mut()))
            .unwrap_or_default();
        if nested.is_empty() {
            break;
        }
    }
    DRAINING.with(|draining| draining.set(false));
}

type Bucket<T> = Vec<Weak<Shared<T>>>;

/// Weak-entry table mapping fingerprints to live canonical instances.
pub struct CanonicalTable<T: Canonical> {
    kind: &'static str,
    shards: Box<[Mutex<HashMap<Fingerprint, Bucket<T>>>]>,
    live: AtomicUsize,
}

impl<T: Canonical> CanonicalTable<T> {
    /// Creates an empty table; `kind` labels its log events.
    pub fn new(kind: &'static str) -> Self {
        debug!(kind, shards = SHARD_COUNT, "canonical table created");
        Self {
            kind,
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            live: AtomicUsize::new(0),
        }
    }

    /// Number of canonical instances currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Returns the live instance deeply equal to `candidate`, or adopts
    /// `candidate` as the new canonical instance.
    ///
    /// Safe to race: threads interning equal candidates all receive the
    /// same instance; the losers' candidates are dropped.
    pub fn intern(&self, candidate: T) -> Arc<Shared<T>> {
        let fp = candidate.fingerprint();
        // Upgraded non-matches; released only after the shard is unlocked.
        let mut others = Vec::new();

        let (instance, discarded) = {
            let mut shard = self.shards[fp.shard(SHARD_COUNT)].lock();
            let bucket = shard.entry(fp).or_default();
            let before = bucket.len();
            bucket.retain(|w| w.strong_count() > 0);
            if bucket.len() != before {
                trace!(kind = self.kind, fingerprint = %fp, pruned = before - bucket.len(), "pruned dead entries");
            }

            let mut found: Option<Arc<Shared<T>>> = None;
            for weak in bucket.iter() {
                let Some(live) = weak.upgrade() else {
                    continue;
                };
                if live.body.deep_eq(&candidate) {
                    debug_assert!(
                        found.is_none(),
                        "two live canonical {} instances for {fp}",
                        self.kind
                    );
                    if found.is_none() {
                        found = Some(live);
                        continue;
                    }
                }
                others.push(live);
            }

            match found {
                Some(live) => {
                    trace!(kind = self.kind, fingerprint = %fp, "reused canonical instance");
                    (live, Some(candidate))
                }
                None => {
                    let instance = Arc::new(Shared {
                        body: candidate,
                        sidecar: OnceLock::new(),
                    });
                    bucket.push(Arc::downgrade(&instance));
                    self.live.fetch_add(1, Ordering::AcqRel);
                    trace!(kind = self.kind, fingerprint = %fp, "adopted canonical instance");
                    (instance, None)
                }
            }
        };

        drop(others);
        drop(discarded);
        instance
    }

    /// Removes the entry of an instance whose last strong handle is gone.
    ///
    /// Called from `Shared::drop`; the weak entry can no longer be upgraded
    /// at this point, so concurrent lookups already treat it as dead.
    fn release(&self, instance: &Shared<T>) {
        let fp = instance.body.fingerprint();
        {
            let mut shard = self.shards[fp.shard(SHARD_COUNT)].lock();
            if let Some(bucket) = shard.get_mut(&fp) {
                bucket.retain(|w| !std::ptr::eq(w.as_ptr(), instance) && w.strong_count() > 0);
                if bucket.is_empty() {
                    shard.remove(&fp);
                }
            }
        }
        self.live.fetch_sub(1, Ordering::AcqRel);
        trace!(kind = self.kind, fingerprint = %fp, "released canonical instance");
    }
}
