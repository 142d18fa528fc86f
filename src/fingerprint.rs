//! 160-bit content fingerprints.
//!
//! Short scalars are packed directly into the fingerprint; everything else is
//! the SHA-1 of its canonical byte encoding. Containers combine the digests of
//! their entries with XOR, so every set/discard/append updates the container
//! fingerprint incrementally: `φ(S ∪ {e}) = φ(S) ⊕ f(e)`.

use std::fmt;

use crate::digest::{DIGEST_LEN, Sha1};

/// Longest text/byte payload stored inline in a fingerprint.
pub const INLINE_MAX: usize = DIGEST_LEN - 2;

/// First mixing seed (golden ratio constant).
const SEED_1: u64 = 0x9E37_79B9_7F4A_7C15;

/// Second mixing seed (large prime).
const SEED_2: u64 = 0x517C_C1B7_2722_0A95;

/// A 160-bit content fingerprint.
///
/// Fingerprints bucket values into equality classes; they are never a
/// substitute for the strict equality check.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fingerprint([u8; DIGEST_LEN]);

impl Fingerprint {
    /// The all-zero fingerprint (empty container).
    pub const ZERO: Self = Self([0; DIGEST_LEN]);

    /// Wraps raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Packs a short payload as `[kind, len, payload.., 0..]`.
    ///
    /// Returns `None` if `payload` is longer than [`INLINE_MAX`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn inline(kind: u8, payload: &[u8]) -> Option<Self> {
        if payload.len() > INLINE_MAX {
            return None;
        }
        let mut bytes = [0_u8; DIGEST_LEN];
        bytes[0] = kind;
        bytes[1] = payload.len() as u8;
        bytes[2..2 + payload.len()].copy_from_slice(payload);
        Some(Self(bytes))
    }

    /// XOR-combines two fingerprints. Self-inverse, commutative.
    #[must_use]
    pub fn xor(self, other: Self) -> Self {
        let mut out = self.0;
        for (a, b) in out.iter_mut().zip(other.0) {
            *a ^= b;
        }
        Self(out)
    }

    /// Folds the fingerprint into the 64-bit hash that indexes the trie.
    #[must_use]
    pub fn trie_hash(&self) -> u64 {
        let lo = u64::from_le_bytes([
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5], self.0[6], self.0[7],
        ]);
        let mid = u64::from_le_bytes([
            self.0[8], self.0[9], self.0[10], self.0[11], self.0[12], self.0[13], self.0[14],
            self.0[15],
        ]);
        let hi = u64::from(u32::from_le_bytes([
            self.0[16], self.0[17], self.0[18], self.0[19],
        ]));
        let mixed = lo.wrapping_mul(SEED_1) ^ mid.wrapping_mul(SEED_2) ^ hi.rotate_left(32);
        // Final avalanche so short inline payloads still spread over all fragments.
        let mixed = (mixed ^ (mixed >> 33)).wrapping_mul(SEED_1);
        mixed ^ (mixed >> 29)
    }

    /// Selects one of `shards` buckets (power of two).
    #[must_use]
    pub fn shard(&self, shards: usize) -> usize {
        debug_assert!(shards.is_power_of_two());
        #[allow(clippy::cast_possible_truncation)]
        let folded = (self.trie_hash() >> 32) as usize;
        folded & (shards - 1)
    }
}

/// Digest of a map entry: `SHA-1("ent" ‖ φ(key) ‖ φ(value))`.
#[must_use]
pub fn entry_digest(key: &Fingerprint, value: &Fingerprint) -> Fingerprint {
    let mut ctx = Sha1::new();
    ctx.update(b"ent").update(key.as_bytes()).update(value.as_bytes());
    Fingerprint(ctx.finalize())
}

/// Digest of a sequence element at `index`: `SHA-1("itm" ‖ index ‖ φ(value))`.
#[must_use]
pub fn item_digest(value: &Fingerprint, index: usize) -> Fingerprint {
    let mut ctx = Sha1::new();
    ctx.update(b"itm")
        .update(&(index as u64).to_le_bytes())
        .update(value.as_bytes());
    Fingerprint(ctx.finalize())
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(self.0))
    }
}
