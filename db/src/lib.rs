//! Database backends for persisted Fossilize archives (spec §4.6).
//!
//! Four concrete stores share one [`Database`] trait: a directory of loose
//! JSON files ([`dumb_directory`]), a `.zip` archive ([`zip_db`]), the
//! native streaming `.foz` format ([`foz`]), and a multi-process
//! [`concurrent`] wrapper built on top of the streaming format. [`open`]
//! picks a backend by file extension, matching the original's
//! `create_database` dispatch.
//!
//! The C++ interface this is grounded on (`original_source/fossilize_db.cpp`)
//! uses a two-phase read (`read_entry(tag, hash, &size, nullptr, ...)` to
//! query the size, then again with a caller-allocated buffer) because it
//! has no owned growable buffer type to hand back across the API boundary.
//! Rust does, so [`Database::read_entry`] just returns `Result<Option<Vec<u8>>>`
//! directly; the same collapse applies to `get_hash_list_for_resource_tag`,
//! which becomes [`Database::hash_list_for_tag`] returning an owned,
//! already-sorted `Vec<Hash>`.

pub mod concurrent;
pub mod dumb_directory;
pub mod foz;
pub mod zip_db;

use fossilize_types::{Hash, ResourceTag};
pub use fossilize_types::{FossilizeError, Result};
use std::path::Path;

/// Mirrors spec §4.6's four open modes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DatabaseMode {
    /// The store must already exist; no writes are permitted.
    ReadOnly,
    /// Open an existing store for continued writing, or create a fresh one.
    Append,
    /// Truncate/replace any existing store.
    OverWrite,
    /// Like `OverWrite`, but fails if the store already exists (used by the
    /// concurrent backend's per-process shard creation, spec §4.6.4).
    ExclusiveOverWrite,
}

bitflags::bitflags! {
    /// Spec §4.6: `RAW_FOSSILIZE_DB_BIT` returns the raw on-disk frame
    /// instead of the decompressed payload.
    pub struct PayloadReadFlags: u32 {
        const RAW = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Spec §4.6: write-side flags controlling checksum/compression and the
    /// raw-frame bypass.
    pub struct PayloadWriteFlags: u32 {
        const COMPUTE_CHECKSUM = 1 << 0;
        const COMPRESS = 1 << 1;
        const BEST_COMPRESSION = 1 << 2;
        const RAW = 1 << 3;
    }
}

/// The common contract every backend implements (spec §4.6 "Database
/// backends — common contract").
pub trait Database {
    /// Opens, indexes, and readies the store. Must be called before any
    /// other method.
    fn prepare(&mut self) -> Result<()>;

    /// Presence check without reading the payload.
    fn has_entry(&self, tag: ResourceTag, hash: Hash) -> bool;

    /// Reads an entry's payload, or `Ok(None)` if it isn't present.
    fn read_entry(&mut self, tag: ResourceTag, hash: Hash, flags: PayloadReadFlags) -> Result<Option<Vec<u8>>>;

    /// At-most-once insertion (spec §3 invariant 6): a no-op if `(tag,
    /// hash)` is already present.
    fn write_entry(&mut self, tag: ResourceTag, hash: Hash, payload: &[u8], flags: PayloadWriteFlags) -> Result<()>;

    /// Every hash stored under `tag`, sorted ascending for deterministic
    /// replay (spec §4.6).
    fn hash_list_for_tag(&self, tag: ResourceTag) -> Vec<Hash>;
}

/// Dispatches on `path`'s extension: `.foz` -> streaming FOZ, `.zip` -> ZIP,
/// anything else -> dumb directory (spec §4.6.5).
pub fn open(path: &Path, mode: DatabaseMode) -> Result<Box<dyn Database>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("foz") => {
            let mut db = foz::StreamArchiveDatabase::new(path, mode);
            db.prepare()?;
            Ok(Box::new(db))
        }
        Some("zip") => {
            let mut db = zip_db::ZipDatabase::new(path, mode);
            db.prepare()?;
            Ok(Box::new(db))
        }
        _ => {
            let mut db = dumb_directory::DumbDirectoryDatabase::new(path, mode);
            db.prepare()?;
            Ok(Box::new(db))
        }
    }
}

pub(crate) fn entry_name(tag: ResourceTag, hash: Hash) -> String {
    format!("{:016x}{:016x}", tag.to_raw(), hash)
}

pub(crate) fn parse_entry_name(name: &str) -> Option<(ResourceTag, Hash)> {
    if name.len() != 32 {
        return None;
    }
    let tag = u8::try_from(u64::from_str_radix(&name[0..16], 16).ok()?).ok()?;
    let hash = u64::from_str_radix(&name[16..32], 16).ok()?;
    Some((ResourceTag::from_raw(tag)?, hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_name_round_trips() {
        let name = entry_name(ResourceTag::GraphicsPipeline, 0xdead_beef_cafe_babe);
        assert_eq!(name.len(), 32);
        assert_eq!(parse_entry_name(&name), Some((ResourceTag::GraphicsPipeline, 0xdead_beef_cafe_babe)));
    }
}
