//! Hash-consed persistent map and vector.
//!
//! Every [`PersistentMap`] and [`PersistentVector`] handed to a caller is
//! **canonical**: two values with equal contents are the same instance,
//! process-wide, no matter how they were built. Equality is a pointer
//! comparison and deep values are deduplicated for free.
//!
//! # Key properties
//!
//! - **CHAMP map**: same contents = same trie structure
//! - **Radix vector**: 32-way tree plus tail, prefix slices share chunks
//! - **Structural sharing**: every update path-copies only what it touches
//! - **Content fingerprints**: inline for short scalars, SHA-1 otherwise,
//!   combined by XOR so updates are incremental
//! - **Weak canonical tables**: instances are reclaimed when the last handle
//!   drops; [`PersistentMap::instance_count`] reports the live population
//! - **Zero `unsafe`**: enforced by `#![forbid(unsafe_code)]`
//!
//! ```
//! use champ_canon::{PersistentVector, Value};
//!
//! let a = PersistentVector::from_values([1, 2]);
//! let b = PersistentVector::from_values([3]);
//! let joined = a.concat(&b);
//! assert!(joined.ptr_eq(&PersistentVector::from_values([1, 2, 3])));
//! assert_eq!(joined.count(&Value::Int(3)), 1);
//! assert_eq!(joined.count(&Value::Float(3.0)), 0);
//! ```
//!
//! # References
//!
//! - Steindorfer & Vinju, 2015: "Optimizing Hash-Array Mapped Tries
//!   for Fast and Lean Immutable JVM Collections", OOPSLA 2015
//! - Bagwell, 2001: "Ideal Hash Trees"
//! - RFC 3174: "US Secure Hash Algorithm 1 (SHA1)"

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod convert;
pub mod digest;
pub mod fingerprint;
pub mod iter;
pub mod json;

mod error;
mod map;
mod node;
mod ops;
mod sidecar;
mod table;
mod value;
mod vector;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use map::{PersistentMap, WeakMap};
pub use sidecar::Sidecar;
pub use value::{Opaque, Value};
pub use vector::{PersistentVector, WeakVector};

/// Vector iterator, re-exported next to the map iterators.
pub use vector::Iter as VectorIter;
