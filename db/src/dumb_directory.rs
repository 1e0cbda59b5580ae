//! Loose-file backend: one JSON blob per entity, named
//! `<tag:2-hex>.<hash:16-hex>.json` (spec §4.6.1).
//!
//! No compression, no checksums. `prepare()` scans the directory once to
//! build an in-memory index so `has_entry` stays O(1) against a hash set
//! rather than re-`stat`ing the filesystem per lookup (grounded on
//! `original_source/fossilize_db.cpp`'s `DumbDirectoryDatabase`, which
//! keeps the same `unordered_set<Hash> seen_blobs[RESOURCE_COUNT]` index).

use crate::{Database, DatabaseMode, PayloadReadFlags, PayloadWriteFlags, Result};
use fossilize_hash::FxHashSet;
use fossilize_types::{FossilizeError, Hash, ResourceTag, RESOURCE_TAG_COUNT};
use std::fs;
use std::path::PathBuf;

pub struct DumbDirectoryDatabase {
    base_directory: PathBuf,
    mode: DatabaseMode,
    seen: [FxHashSet<Hash>; RESOURCE_TAG_COUNT],
}

fn file_name(tag: ResourceTag, hash: Hash) -> String {
    format!("{:02x}.{:016x}.json", tag.to_raw(), hash)
}

fn parse_file_name(name: &str) -> Option<(ResourceTag, Hash)> {
    let name = name.strip_suffix(".json")?;
    let (tag_str, hash_str) = name.split_once('.')?;
    let tag = u8::from_str_radix(tag_str, 16).ok()?;
    let hash = u64::from_str_radix(hash_str, 16).ok()?;
    Some((ResourceTag::from_raw(tag)?, hash))
}

impl DumbDirectoryDatabase {
    pub fn new(path: &std::path::Path, mode: DatabaseMode) -> DumbDirectoryDatabase {
        DumbDirectoryDatabase {
            base_directory: path.to_path_buf(),
            mode,
            seen: Default::default(),
        }
    }

    fn path_for(&self, tag: ResourceTag, hash: Hash) -> PathBuf {
        self.base_directory.join(file_name(tag, hash))
    }
}

impl Database for DumbDirectoryDatabase {
    fn prepare(&mut self) -> Result<()> {
        match self.mode {
            DatabaseMode::ReadOnly => {
                if !self.base_directory.is_dir() {
                    return Err(FossilizeError::Corruption(format!(
                        "database directory {} does not exist",
                        self.base_directory.display()
                    )));
                }
            }
            DatabaseMode::OverWrite | DatabaseMode::ExclusiveOverWrite => {
                fs::create_dir_all(&self.base_directory)?;
                return Ok(());
            }
            DatabaseMode::Append => {
                fs::create_dir_all(&self.base_directory)?;
            }
        }

        for entry in fs::read_dir(&self.base_directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if let Some((tag, hash)) = parse_file_name(&name) {
                self.seen[tag.to_raw() as usize].insert(hash);
            }
        }
        Ok(())
    }

    fn has_entry(&self, tag: ResourceTag, hash: Hash) -> bool {
        self.seen[tag.to_raw() as usize].contains(&hash)
    }

    fn read_entry(&mut self, tag: ResourceTag, hash: Hash, flags: PayloadReadFlags) -> Result<Option<Vec<u8>>> {
        if flags.contains(PayloadReadFlags::RAW) {
            // The dumb directory has no frame header to return raw.
            return Err(FossilizeError::Corruption("dumb directory backend has no raw frame".into()));
        }
        if !self.has_entry(tag, hash) {
            return Ok(None);
        }
        Ok(Some(fs::read(self.path_for(tag, hash))?))
    }

    fn write_entry(&mut self, tag: ResourceTag, hash: Hash, payload: &[u8], flags: PayloadWriteFlags) -> Result<()> {
        if flags.contains(PayloadWriteFlags::RAW) {
            return Err(FossilizeError::Corruption("dumb directory backend does not accept raw frames".into()));
        }
        if self.mode == DatabaseMode::ReadOnly {
            return Err(FossilizeError::Corruption("database is read-only".into()));
        }
        if self.has_entry(tag, hash) {
            return Ok(());
        }
        fs::write(self.path_for(tag, hash), payload)?;
        self.seen[tag.to_raw() as usize].insert(hash);
        Ok(())
    }

    fn hash_list_for_tag(&self, tag: ResourceTag) -> Vec<Hash> {
        let mut hashes: Vec<Hash> = self.seen[tag.to_raw() as usize].iter().copied().collect();
        hashes.sort_unstable();
        hashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let mut db = DumbDirectoryDatabase::new(dir.path(), DatabaseMode::OverWrite);
        db.prepare().unwrap();
        db.write_entry(ResourceTag::Sampler, 42, b"hello", PayloadWriteFlags::empty()).unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, 42));
        assert_eq!(db.read_entry(ResourceTag::Sampler, 42, PayloadReadFlags::empty()).unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn write_is_at_most_once() {
        let dir = tempdir().unwrap();
        let mut db = DumbDirectoryDatabase::new(dir.path(), DatabaseMode::OverWrite);
        db.prepare().unwrap();
        db.write_entry(ResourceTag::Sampler, 1, b"first", PayloadWriteFlags::empty()).unwrap();
        db.write_entry(ResourceTag::Sampler, 1, b"second", PayloadWriteFlags::empty()).unwrap();
        assert_eq!(db.read_entry(ResourceTag::Sampler, 1, PayloadReadFlags::empty()).unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn reopen_in_append_mode_rebuilds_index() {
        let dir = tempdir().unwrap();
        {
            let mut db = DumbDirectoryDatabase::new(dir.path(), DatabaseMode::OverWrite);
            db.prepare().unwrap();
            db.write_entry(ResourceTag::Sampler, 7, b"data", PayloadWriteFlags::empty()).unwrap();
        }
        let mut db = DumbDirectoryDatabase::new(dir.path(), DatabaseMode::Append);
        db.prepare().unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, 7));
        assert_eq!(db.hash_list_for_tag(ResourceTag::Sampler), vec![7]);
    }

    #[test]
    fn readonly_requires_existing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let mut db = DumbDirectoryDatabase::new(&missing, DatabaseMode::ReadOnly);
        assert!(db.prepare().is_err());
    }
}
