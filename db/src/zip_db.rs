//! ZIP-backed archive (spec §4.6.2). Each entry's name is the 32-hex-char
//! `<tag:16-hex><hash:16-hex>` string [`crate::entry_name`] produces.
//!
//! The `zip` crate computes and verifies its own CRC-32 per entry, so
//! `PayloadWriteFlags::COMPUTE_CHECKSUM` is a no-op here (the checksum
//! always happens); `PayloadReadFlags::RAW`/`PayloadWriteFlags::RAW` are
//! rejected outright, matching `original_source/fossilize_db.cpp`'s
//! `ZipDatabase` ("If ... PAYLOAD_WRITE_RAW_FOSSILIZE_DB_BIT ... return
//! false" — there is no "raw frame" concept for a generic ZIP entry).

use crate::{entry_name, parse_entry_name, Database, DatabaseMode, PayloadReadFlags, PayloadWriteFlags, Result};
use fossilize_hash::FxHashSet;
use fossilize_types::{FossilizeError, Hash, ResourceTag};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

enum State {
    Closed,
    Reader(zip::ZipArchive<File>),
    Writer(zip::ZipWriter<File>),
}

pub struct ZipDatabase {
    path: PathBuf,
    mode: DatabaseMode,
    state: State,
    seen: FxHashSet<(ResourceTag, Hash)>,
}

fn compression_options(flags: PayloadWriteFlags) -> zip::write::FileOptions {
    let options = zip::write::FileOptions::default();
    if flags.contains(PayloadWriteFlags::COMPRESS) {
        options
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(if flags.contains(PayloadWriteFlags::BEST_COMPRESSION) { 9 } else { 6 }))
    } else {
        options.compression_method(zip::CompressionMethod::Stored)
    }
}

impl ZipDatabase {
    pub fn new(path: &std::path::Path, mode: DatabaseMode) -> ZipDatabase {
        ZipDatabase {
            path: path.to_path_buf(),
            mode,
            state: State::Closed,
            seen: FxHashSet::default(),
        }
    }
}

impl Database for ZipDatabase {
    fn prepare(&mut self) -> Result<()> {
        match self.mode {
            DatabaseMode::ReadOnly => {
                let file = File::open(&self.path)?;
                let archive = zip::ZipArchive::new(file)
                    .map_err(|e| FossilizeError::Corruption(format!("invalid zip archive: {}", e)))?;
                for name in archive.file_names() {
                    if let Some(entry) = parse_entry_name(name) {
                        self.seen.insert(entry);
                    }
                }
                self.state = State::Reader(archive);
            }
            DatabaseMode::OverWrite => {
                let file = File::create(&self.path)?;
                self.state = State::Writer(zip::ZipWriter::new(file));
            }
            DatabaseMode::ExclusiveOverWrite => {
                let file = OpenOptions::new().write(true).create_new(true).open(&self.path)?;
                self.state = State::Writer(zip::ZipWriter::new(file));
            }
            DatabaseMode::Append => {
                if self.path.exists() {
                    let read_file = File::open(&self.path)?;
                    let archive = zip::ZipArchive::new(read_file)
                        .map_err(|e| FossilizeError::Corruption(format!("invalid zip archive: {}", e)))?;
                    for name in archive.file_names() {
                        if let Some(entry) = parse_entry_name(name) {
                            self.seen.insert(entry);
                        }
                    }
                    drop(archive);
                    let rw_file = OpenOptions::new().read(true).write(true).open(&self.path)?;
                    let writer = zip::ZipWriter::new_append(rw_file)
                        .map_err(|e| FossilizeError::Corruption(format!("failed to continue zip archive: {}", e)))?;
                    self.state = State::Writer(writer);
                } else {
                    let file = File::create(&self.path)?;
                    self.state = State::Writer(zip::ZipWriter::new(file));
                }
            }
        }
        Ok(())
    }

    fn has_entry(&self, tag: ResourceTag, hash: Hash) -> bool {
        self.seen.contains(&(tag, hash))
    }

    fn read_entry(&mut self, tag: ResourceTag, hash: Hash, flags: PayloadReadFlags) -> Result<Option<Vec<u8>>> {
        if flags.contains(PayloadReadFlags::RAW) {
            return Err(FossilizeError::Corruption("zip backend has no raw frame".into()));
        }
        let State::Reader(archive) = &mut self.state else {
            return Ok(None);
        };
        if !self.seen.contains(&(tag, hash)) {
            return Ok(None);
        }
        let mut file = archive
            .by_name(&entry_name(tag, hash))
            .map_err(|e| FossilizeError::Corruption(format!("zip entry missing: {}", e)))?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(Some(buf))
    }

    fn write_entry(&mut self, tag: ResourceTag, hash: Hash, payload: &[u8], flags: PayloadWriteFlags) -> Result<()> {
        if flags.contains(PayloadWriteFlags::RAW) {
            return Err(FossilizeError::Corruption("zip backend does not accept raw frames".into()));
        }
        if self.has_entry(tag, hash) {
            return Ok(());
        }
        let State::Writer(writer) = &mut self.state else {
            return Err(FossilizeError::Corruption("database is read-only".into()));
        };
        writer
            .start_file(entry_name(tag, hash), compression_options(flags))
            .map_err(|e| FossilizeError::Corruption(format!("failed to start zip entry: {}", e)))?;
        writer.write_all(payload)?;
        self.seen.insert((tag, hash));
        Ok(())
    }

    fn hash_list_for_tag(&self, tag: ResourceTag) -> Vec<Hash> {
        let mut hashes: Vec<Hash> = self.seen.iter().filter(|(t, _)| *t == tag).map(|(_, h)| *h).collect();
        hashes.sort_unstable();
        hashes
    }
}

impl Drop for ZipDatabase {
    fn drop(&mut self) {
        if let State::Writer(writer) = &mut self.state {
            if let Err(e) = writer.finish() {
                log::error!("failed to finalize zip archive {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_reopen_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        {
            let mut db = ZipDatabase::new(&path, DatabaseMode::OverWrite);
            db.prepare().unwrap();
            db.write_entry(ResourceTag::Sampler, 1, b"payload", PayloadWriteFlags::COMPRESS).unwrap();
        }
        let mut db = ZipDatabase::new(&path, DatabaseMode::ReadOnly);
        db.prepare().unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, 1));
        assert_eq!(db.read_entry(ResourceTag::Sampler, 1, PayloadReadFlags::empty()).unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn append_preserves_existing_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        {
            let mut db = ZipDatabase::new(&path, DatabaseMode::OverWrite);
            db.prepare().unwrap();
            db.write_entry(ResourceTag::Sampler, 1, b"one", PayloadWriteFlags::empty()).unwrap();
        }
        {
            let mut db = ZipDatabase::new(&path, DatabaseMode::Append);
            db.prepare().unwrap();
            assert!(db.has_entry(ResourceTag::Sampler, 1));
            db.write_entry(ResourceTag::Sampler, 2, b"two", PayloadWriteFlags::empty()).unwrap();
        }
        let mut db = ZipDatabase::new(&path, DatabaseMode::ReadOnly);
        db.prepare().unwrap();
        assert_eq!(db.hash_list_for_tag(ResourceTag::Sampler), vec![1, 2]);
    }

    #[test]
    fn raw_flag_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        let mut db = ZipDatabase::new(&path, DatabaseMode::OverWrite);
        db.prepare().unwrap();
        assert!(db.write_entry(ResourceTag::Sampler, 1, b"x", PayloadWriteFlags::RAW).is_err());
    }
}
