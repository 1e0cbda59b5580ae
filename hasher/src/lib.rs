//! Content-defined hashing primitives shared by the rest of the workspace.
//!
//! [`Hasher64`] is the rolling digest the canonical hasher builds every
//! entity hash out of. It is deliberately not `std::hash::Hasher`: callers
//! need typed `u32`/`f32`/`bytes`/`string` helpers with a fixed, documented
//! byte order so that the resulting hash is stable across processes and
//! across Rust versions, which `std::hash::Hasher` does not promise.
//!
//! [`FxHashMap`]/[`FxHashSet`] are re-exported for the `handle -> hash` and
//! `hash -> offset` maps used throughout the workspace; they are unrelated
//! to content hashing and exist purely for lookup speed.

pub mod varint;

use std::collections::{HashMap, HashSet};

/// FNV-1a 64-bit offset basis.
pub const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
pub const PRIME: u64 = 0x0000_0100_0000_01b3;

/// A hash map keyed with the non-cryptographic FxHash algorithm.
///
/// Used for `handle -> hash` and similar lookup tables that are probed far
/// more often than entries are inserted; never used for the content hash
/// itself.
pub type FxHashMap<K, V> = HashMap<K, V, fxhash::FxBuildHasher>;
/// A hash set keyed with the non-cryptographic FxHash algorithm.
pub type FxHashSet<T> = HashSet<T, fxhash::FxBuildHasher>;

/// A stable, 64-bit FNV-1a-style rolling digest.
///
/// `update(byte)` applies `h := (h ^ byte) * PRIME`. The state is seeded
/// from [`OFFSET_BASIS`] and never mixes in pointer addresses, allocation
/// order, or anything else not explicitly fed through one of the typed
/// helpers below, which is what makes the resulting digest stable across
/// runs (spec: "Hash stability").
#[derive(Clone, Debug)]
pub struct Hasher64 {
    state: u64,
}

impl Default for Hasher64 {
    fn default() -> Self {
        Hasher64::new()
    }
}

impl Hasher64 {
    pub fn new() -> Self {
        Hasher64 {
            state: OFFSET_BASIS,
        }
    }

    /// Creates a hasher pre-seeded with an explicit state, used when one
    /// digest needs to continue from another already-computed hash (e.g.
    /// combining an application-info hash with a feature-chain hash).
    pub fn from_state(state: u64) -> Self {
        Hasher64 { state }
    }

    #[inline]
    fn update_byte(&mut self, byte: u8) {
        self.state ^= byte as u64;
        self.state = self.state.wrapping_mul(PRIME);
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        for &b in data {
            self.update_byte(b);
        }
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn s32(&mut self, v: i32) -> &mut Self {
        self.u32(v as u32)
    }

    /// Hashes the IEEE-754 bit pattern of `v`, not its numeric value, so
    /// that `-0.0` and `0.0` (and any two bit-identical NaNs) hash
    /// identically to themselves but not to each other.
    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.u32(v.to_bits())
    }

    /// Hashes `s`'s bytes followed by a trailing NUL, matching the
    /// terminator byte a C string would contribute.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.bytes(s.as_bytes());
        self.update_byte(0);
        self
    }

    pub fn finish(&self) -> u64 {
        self.state
    }
}

/// Convenience one-shot hash of a byte slice, starting from the offset
/// basis. Used for hashing SPIR-V code and other flat byte buffers.
pub fn hash_bytes(data: &[u8]) -> u64 {
    Hasher64::new().bytes(data).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism() {
        let a = Hasher64::new().u32(42).f32(1.5).string("hi").finish();
        let b = Hasher64::new().u32(42).f32(1.5).string("hi").finish();
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = Hasher64::new().u32(1).finish();
        let b = Hasher64::new().u32(2).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn string_hashes_nul_terminator() {
        // "ab\0" and the string "ab" hashed through `string()` must agree,
        // but `bytes(b"ab")` without the NUL must not.
        let via_string = Hasher64::new().string("ab").finish();
        let via_bytes_with_nul = Hasher64::new().bytes(b"ab\0").finish();
        let via_bytes_without_nul = Hasher64::new().bytes(b"ab").finish();
        assert_eq!(via_string, via_bytes_with_nul);
        assert_ne!(via_string, via_bytes_without_nul);
    }

    #[test]
    fn f32_hashes_bit_pattern() {
        let zero = Hasher64::new().f32(0.0).finish();
        let neg_zero = Hasher64::new().f32(-0.0).finish();
        assert_ne!(zero, neg_zero);
    }
}
