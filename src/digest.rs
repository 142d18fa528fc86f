//! Streaming SHA-1 (RFC 3174).
//!
//! The digest only serves as a content fingerprint for bucketing and is never
//! trusted on its own: every fingerprint match is confirmed with a strict
//! equality check.

/// Digest size in bytes.
pub const DIGEST_LEN: usize = 20;

/// Internal block size in bytes.
pub const BLOCK_LEN: usize = 64;

const INITIAL_STATE: [u32; 5] = [0x6745_2301, 0xEFCD_AB89, 0x98BA_DCFE, 0x1032_5476, 0xC3D2_E1F0];

const K: [u32; 4] = [0x5A82_7999, 0x6ED9_EBA1, 0x8F1B_BCDC, 0xCA62_C1D6];

/// Incremental SHA-1 context.
///
/// Feeding the same byte stream yields the same digest regardless of how it
/// is split across [`update`](Self::update) calls.
#[derive(Clone)]
pub struct Sha1 {
    state: [u32; 5],
    buffer: [u8; BLOCK_LEN],
    /// Total number of bytes fed so far.
    count: u64,
}

impl Sha1 {
    /// Creates a fresh context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: INITIAL_STATE,
            buffer: [0; BLOCK_LEN],
            count: 0,
        }
    }

    /// Feeds `data` into the digest.
    pub fn update(&mut self, mut data: &[u8]) -> &mut Self {
        while !data.is_empty() {
            let filled = self.buffered();
            let take = (BLOCK_LEN - filled).min(data.len());
            self.buffer[filled..filled + take].copy_from_slice(&data[..take]);
            self.count += take as u64;
            data = &data[take..];

            if self.buffered() == 0 {
                compress(&mut self.state, &self.buffer);
            }
        }
        self
    }

    /// Consumes the context and returns the 160-bit digest.
    #[must_use]
    pub fn finalize(mut self) -> [u8; DIGEST_LEN] {
        let bit_len = self.count.wrapping_mul(8);

        let filled = self.buffered();
        self.buffer[filled] = 0x80;
        self.buffer[filled + 1..].fill(0);

        // No room left for the 8-byte length: flush an extra block.
        if filled + 1 > BLOCK_LEN - 8 {
            compress(&mut self.state, &self.buffer);
            self.buffer.fill(0);
        }

        self.buffer[BLOCK_LEN - 8..].copy_from_slice(&bit_len.to_be_bytes());
        compress(&mut self.state, &self.buffer);

        let mut out = [0_u8; DIGEST_LEN];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// One-shot digest of `data`.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; DIGEST_LEN] {
        let mut ctx = Self::new();
        ctx.update(data);
        ctx.finalize()
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn buffered(&self) -> usize {
        (self.count % BLOCK_LEN as u64) as usize
    }
}

impl Default for Sha1 {
    fn default() -> Self {
        Self::new()
    }
}

/// Processes one 64-byte block.
fn compress(state: &mut [u32; 5], block: &[u8; BLOCK_LEN]) {
    let mut w = [0_u32; 80];
    for (i, chunk) in block.chunks_exact(4).enumerate() {
        w[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    for i in 16..80 {
        w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
    }

    let [mut a, mut b, mut c, mut d, mut e] = *state;

    for (i, word) in w.iter().enumerate() {
        let (f, k) = match i {
            0..20 => ((b & c) | (!b & d), K[0]),
            20..40 => (b ^ c ^ d, K[1]),
            40..60 => ((b & c) | (b & d) | (c & d), K[2]),
            _ => (b ^ c ^ d, K[3]),
        };
        let temp = a
            .rotate_left(5)
            .wrapping_add(f)
            .wrapping_add(e)
            .wrapping_add(k)
            .wrapping_add(*word);
        e = d;
        d = c;
        c = b.rotate_left(30);
        b = a;
        a = temp;
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
    state[4] = state[4].wrapping_add(e);
}
