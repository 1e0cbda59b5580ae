//! JSON document encoding for persisted Fossilize entities (spec §4.5,
//! §6). Each entity kind gets a `to_value`/`from_value` pair; shader
//! modules additionally get a length-framed binary blob codec (see
//! [`shader`]) since their payload is mostly opaque SPIR-V rather than
//! JSON-friendly fields.
//!
//! None of this module resolves cross-references against a live database;
//! it only turns a create-info graph into `serde_json::Value` and back,
//! using a [`fossilize_canonical::HandleResolver`] to turn live handles
//! into content hashes on the way out. Reassembling a graph of entities
//! from hashes back into live handles is the [`parse`] module's job.

pub mod entities;
pub mod enums;
pub mod parse;
pub mod pipeline;
pub mod pnext;
pub mod shader;

pub use fossilize_types::{FossilizeError, Hash, Result};

/// Formats a content hash the way every hash-valued JSON field in the
/// format uses: 16 lowercase hex digits, zero-padded.
pub fn hash_to_hex(hash: Hash) -> String {
    format!("{:016x}", hash)
}

/// Inverse of [`hash_to_hex`].
pub fn hex_to_hash(s: &str) -> Result<Hash> {
    u64::from_str_radix(s, 16).map_err(|_| FossilizeError::Corruption(format!("invalid hash string {:?}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_hex_round_trips() {
        let hash = 0x0123_4567_89ab_cdefu64;
        assert_eq!(hex_to_hash(&hash_to_hex(hash)).unwrap(), hash);
    }

    #[test]
    fn hex_to_hash_rejects_garbage() {
        assert!(hex_to_hash("not hex").is_err());
    }
}
