//! Seeded 32-bit hashing for filter keys.
//!
//! The hash is a Murmur-style mix over little-endian 32-bit words. Its output
//! decides which bits a key occupies in a persisted filter, so the algorithm
//! and [`BLOOM_HASH_SEED`] must never change.

use bytes::Bytes;

/// Seed used for every filter hash.
///
/// Filters written to disk are only readable by code that hashes keys with
/// the same seed. Once filters exist with this seed you are stuck with it.
pub const BLOOM_HASH_SEED: u32 = 0xbc9f1d34;

const MULTIPLIER: u32 = 0xc6a4a793;
const TAIL_SHIFT: u32 = 24;

/// Hashes `data` with the given seed.
///
/// All arithmetic wraps at 32 bits.
pub fn hash(data: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ (data.len() as u32).wrapping_mul(MULTIPLIER);

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let w = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        h = h.wrapping_add(w);
        h = h.wrapping_mul(MULTIPLIER);
        h ^= h >> 16;
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        if tail.len() == 3 {
            h = h.wrapping_add((tail[2] as u32) << 16);
        }
        if tail.len() >= 2 {
            h = h.wrapping_add((tail[1] as u32) << 8);
        }
        h = h.wrapping_add(tail[0] as u32);
        h = h.wrapping_mul(MULTIPLIER);
        h ^= h >> TAIL_SHIFT;
    }

    h
}

/// Hashes `data` with [`BLOOM_HASH_SEED`].
#[inline]
pub fn bloom_hash(data: &[u8]) -> u32 {
    hash(data, BLOOM_HASH_SEED)
}

/// A key that can be placed in a Bloom filter.
///
/// Byte-string keys hash their raw bytes. Integer keys hash their fixed
/// 8-byte little-endian representation, so a filter built on one machine
/// answers the same way on any other.
pub trait FilterKey {
    /// Returns the filter hash of this key.
    fn bloom_hash(&self) -> u32;
}

impl FilterKey for [u8] {
    fn bloom_hash(&self) -> u32 {
        bloom_hash(self)
    }
}

impl<const N: usize> FilterKey for [u8; N] {
    fn bloom_hash(&self) -> u32 {
        bloom_hash(self)
    }
}

impl FilterKey for Vec<u8> {
    fn bloom_hash(&self) -> u32 {
        bloom_hash(self)
    }
}

impl FilterKey for str {
    fn bloom_hash(&self) -> u32 {
        bloom_hash(self.as_bytes())
    }
}

impl FilterKey for String {
    fn bloom_hash(&self) -> u32 {
        bloom_hash(self.as_bytes())
    }
}

impl FilterKey for Bytes {
    fn bloom_hash(&self) -> u32 {
        bloom_hash(self)
    }
}

impl FilterKey for u64 {
    fn bloom_hash(&self) -> u32 {
        bloom_hash(&self.to_le_bytes())
    }
}

impl<T: FilterKey + ?Sized> FilterKey for &T {
    fn bloom_hash(&self) -> u32 {
        (**self).bloom_hash()
    }
}
