//! Concurrent multi-writer wrapper (spec §4.6.4, §3 invariant 7).
//!
//! Multiple processes recording against the same base path share a
//! read-only baseline (`<base>.foz`) plus one write-only shard per process
//! (`<base>.<n>.foz`), claimed by exclusive file creation so two processes
//! never contend for the same shard. `n` is the lowest integer in `0..255`
//! for which [`DatabaseMode::ExclusiveOverWrite`] succeeds.

use crate::foz::StreamArchiveDatabase;
use crate::{Database, DatabaseMode, PayloadReadFlags, PayloadWriteFlags, Result};
use fossilize_types::{FossilizeError, Hash, ResourceTag};
use std::path::{Path, PathBuf};

/// Bounded retry for shard claiming (spec §4.6.4: "bounded retry up to
/// 255").
const MAX_SHARDS: u32 = 255;

pub struct ConcurrentDatabase {
    baseline: Option<StreamArchiveDatabase>,
    shard: StreamArchiveDatabase,
    shard_index: u32,
}

fn baseline_path(base: &Path) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".foz");
    PathBuf::from(s)
}

fn shard_path(base: &Path, n: u32) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(format!(".{}.foz", n));
    PathBuf::from(s)
}

impl ConcurrentDatabase {
    /// Opens the read-only baseline (if it exists) and claims the lowest
    /// free write shard under `base`.
    pub fn open(base: &Path) -> Result<ConcurrentDatabase> {
        let baseline_file = baseline_path(base);
        let baseline = if baseline_file.exists() {
            let mut db = StreamArchiveDatabase::new(&baseline_file, DatabaseMode::ReadOnly);
            db.prepare()?;
            Some(db)
        } else {
            None
        };

        for n in 0..MAX_SHARDS {
            let path = shard_path(base, n);
            let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::ExclusiveOverWrite);
            match db.prepare() {
                Ok(()) => {
                    return Ok(ConcurrentDatabase {
                        baseline,
                        shard: db,
                        shard_index: n,
                    })
                }
                Err(FossilizeError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(FossilizeError::Corruption(format!(
            "no free write shard under {} after {} attempts",
            base.display(),
            MAX_SHARDS
        )))
    }

    /// The write shard's index, i.e. the `n` in `<base>.<n>.foz` (used by
    /// `merge-db`/`unmerge-db` callers that need to name shards back).
    pub fn shard_index(&self) -> u32 {
        self.shard_index
    }
}

impl Database for ConcurrentDatabase {
    fn prepare(&mut self) -> Result<()> {
        // Both halves are already prepared by `open`.
        Ok(())
    }

    fn has_entry(&self, tag: ResourceTag, hash: Hash) -> bool {
        self.shard.has_entry(tag, hash) || self.baseline.as_ref().is_some_and(|b| b.has_entry(tag, hash))
    }

    fn read_entry(&mut self, tag: ResourceTag, hash: Hash, flags: PayloadReadFlags) -> Result<Option<Vec<u8>>> {
        match &mut self.baseline {
            Some(baseline) => baseline.read_entry(tag, hash, flags),
            None => Ok(None),
        }
    }

    fn write_entry(&mut self, tag: ResourceTag, hash: Hash, payload: &[u8], flags: PayloadWriteFlags) -> Result<()> {
        if self.has_entry(tag, hash) {
            return Ok(());
        }
        self.shard.write_entry(tag, hash, payload, flags)
    }

    fn hash_list_for_tag(&self, tag: ResourceTag) -> Vec<Hash> {
        let mut hashes = self.shard.hash_list_for_tag(tag);
        if let Some(baseline) = &self.baseline {
            hashes.extend(baseline.hash_list_for_tag(tag));
        }
        hashes.sort_unstable();
        hashes.dedup();
        hashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn two_writers_get_distinct_shards() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("db");
        let mut a = ConcurrentDatabase::open(&base).unwrap();
        let mut b = ConcurrentDatabase::open(&base).unwrap();
        assert_ne!(a.shard_index(), b.shard_index());
        a.write_entry(ResourceTag::Sampler, 1, b"a", PayloadWriteFlags::empty()).unwrap();
        b.write_entry(ResourceTag::Sampler, 2, b"b", PayloadWriteFlags::empty()).unwrap();
        assert!(shard_path(&base, a.shard_index()).exists());
        assert!(shard_path(&base, b.shard_index()).exists());
    }

    #[test]
    fn has_entry_sees_baseline_and_own_shard() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("db");
        {
            let mut baseline = StreamArchiveDatabase::new(&baseline_path(&base), DatabaseMode::OverWrite);
            baseline.prepare().unwrap();
            baseline.write_entry(ResourceTag::Sampler, 1, b"baseline", PayloadWriteFlags::empty()).unwrap();
        }
        let mut db = ConcurrentDatabase::open(&base).unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, 1));
        db.write_entry(ResourceTag::Sampler, 2, b"fresh", PayloadWriteFlags::empty()).unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, 2));
        // Writing a hash already present in the baseline is a no-op against the shard.
        db.write_entry(ResourceTag::Sampler, 1, b"duplicate", PayloadWriteFlags::empty()).unwrap();
        assert_eq!(db.hash_list_for_tag(ResourceTag::Sampler), vec![1, 2]);
    }
}
