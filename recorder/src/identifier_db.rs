//! Module identifier side database (spec §4.7 "Side databases", glossary
//! "Module identifier"): write-only table from a shader module's content
//! hash to its small (<=32 byte) driver-stable identifier.
//!
//! On a later session the Recorder loads this table and inverts it into an
//! identifier -> hash index, so a pipeline that only has a module's
//! identifier (not its SPIR-V) can still be hashed and recorded without the
//! binary ever being present (spec §4.3 item 7, §4.7: "populates the
//! identifier->module reverse index from the identifier side-database").

use fossilize_hash::FxHashMap;
use fossilize_types::{Hash, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct IdentifierDatabase {
    path: PathBuf,
    hash_to_identifier: FxHashMap<Hash, Vec<u8>>,
    dirty: bool,
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok()).collect()
}

impl IdentifierDatabase {
    pub fn open(path: &Path) -> Result<IdentifierDatabase> {
        let hash_to_identifier = match std::fs::read(path) {
            Ok(bytes) => {
                let map: BTreeMap<String, String> = serde_json::from_slice(&bytes)?;
                map.into_iter()
                    .filter_map(|(k, v)| {
                        let hash = u64::from_str_radix(&k, 16).ok()?;
                        let identifier = hex_decode(&v)?;
                        Some((hash, identifier))
                    })
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FxHashMap::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(IdentifierDatabase {
            path: path.to_path_buf(),
            hash_to_identifier,
            dirty: false,
        })
    }

    /// Records that `hash`'s shader module has the given driver-stable
    /// `identifier` (spec: "every recorded shader module's ... identifier
    /// is written keyed by the module's hash").
    pub fn record(&mut self, hash: Hash, identifier: &[u8]) {
        if self.hash_to_identifier.get(&hash).map(|v| v.as_slice()) != Some(identifier) {
            self.hash_to_identifier.insert(hash, identifier.to_vec());
            self.dirty = true;
        }
    }

    /// Inverts the table into identifier -> hash, for
    /// [`crate::RecorderHandles`] to consult via
    /// `fossilize_canonical::HandleResolver::resolve_identifier`.
    pub fn invert(&self) -> FxHashMap<Vec<u8>, Hash> {
        self.hash_to_identifier.iter().map(|(&h, id)| (id.clone(), h)).collect()
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let map: BTreeMap<String, String> = self
            .hash_to_identifier
            .iter()
            .map(|(&h, id)| (format!("{:016x}", h), hex_encode(id)))
            .collect();
        let bytes = serde_json::to_vec_pretty(&map)?;
        std::fs::write(&self.path, bytes)?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for IdentifierDatabase {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn records_and_inverts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.ids.json");
        let mut db = IdentifierDatabase::open(&path).unwrap();
        db.record(7, &[1, 2, 3]);
        let inverted = db.invert();
        assert_eq!(inverted.get(&vec![1u8, 2, 3]), Some(&7));
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.ids.json");
        {
            let mut db = IdentifierDatabase::open(&path).unwrap();
            db.record(9, &[0xAB, 0xCD]);
            db.flush().unwrap();
        }
        let reopened = IdentifierDatabase::open(&path).unwrap();
        assert_eq!(reopened.invert().get(&vec![0xABu8, 0xCD]), Some(&9));
    }
}
