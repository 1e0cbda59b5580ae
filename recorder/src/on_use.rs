//! On-use side database (spec §4.7 "Side databases", glossary "On-use
//! database"): a write-only archive recording the last time a given hash
//! was referenced, consumed by the `prune` tool's "last-use" logic and by
//! `merge-db --last-use`'s reconciliation pass.
//!
//! The core's other backends frame entries as opaque byte blobs behind the
//! `Database` trait; a timestamp-per-hash side table doesn't need any of
//! that machinery (no tag, no compression, no concurrent shards), so it's
//! kept as its own small JSON-backed map rather than shoehorned into
//! `fossilize-db`.

use fossilize_hash::FxHashMap;
use fossilize_types::{Hash, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Write-only in the sense spec §4.7 describes (a session only ever bumps
/// a hash's timestamp forward); reading the whole table back is how
/// `merge-db`/`prune` consume it, so the type does support a full load.
#[derive(Default)]
pub struct OnUseDatabase {
    path: PathBuf,
    entries: FxHashMap<Hash, u64>,
    dirty: bool,
}

impl OnUseDatabase {
    /// Loads an existing table, or starts an empty one if `path` doesn't
    /// exist yet.
    pub fn open(path: &Path) -> Result<OnUseDatabase> {
        let entries = match std::fs::read(path) {
            Ok(bytes) => {
                let map: BTreeMap<String, u64> = serde_json::from_slice(&bytes)?;
                map.into_iter()
                    .filter_map(|(k, v)| u64::from_str_radix(&k, 16).ok().map(|h| (h, v)))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FxHashMap::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(OnUseDatabase {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        })
    }

    /// Records `hash` as referenced at `timestamp` (a Unix-epoch second
    /// count), keeping the maximum seen so a read-only replay pass can
    /// never move a hash's last-use time backwards.
    pub fn record(&mut self, hash: Hash, timestamp: u64) {
        let slot = self.entries.entry(hash).or_insert(0);
        if timestamp > *slot {
            *slot = timestamp;
            self.dirty = true;
        }
    }

    pub fn last_use(&self, hash: Hash) -> Option<u64> {
        self.entries.get(&hash).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Hash, u64)> + '_ {
        self.entries.iter().map(|(&h, &t)| (h, t))
    }

    /// Merges another table's entries in, keeping the maximum timestamp
    /// per hash (spec §6 `merge-db --last-use`: "optional reconciliation
    /// of on-use timestamps (keep maximum)").
    pub fn merge_from(&mut self, other: &OnUseDatabase) {
        for (hash, ts) in other.iter() {
            self.record(hash, ts);
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let map: BTreeMap<String, u64> = self.entries.iter().map(|(&h, &t)| (format!("{:016x}", h), t)).collect();
        let bytes = serde_json::to_vec_pretty(&map)?;
        std::fs::write(&self.path, bytes)?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for OnUseDatabase {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Returns the current Unix-epoch second count, for callers (the recording
/// worker, CLI tools) that need to stamp an on-use record "now".
pub fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn records_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.onuse.json");
        {
            let mut db = OnUseDatabase::open(&path).unwrap();
            db.record(42, 100);
            db.record(42, 50); // older timestamp must not regress
            db.flush().unwrap();
        }
        let reopened = OnUseDatabase::open(&path).unwrap();
        assert_eq!(reopened.last_use(42), Some(100));
    }

    #[test]
    fn merge_keeps_maximum() {
        let dir = tempdir().unwrap();
        let mut a = OnUseDatabase::open(&dir.path().join("a.json")).unwrap();
        a.record(1, 10);
        let mut b = OnUseDatabase::open(&dir.path().join("b.json")).unwrap();
        b.record(1, 20);
        a.merge_from(&b);
        assert_eq!(a.last_use(1), Some(20));
    }
}
