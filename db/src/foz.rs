//! Streaming single-file format ("FOZ"), spec §4.6.3/§6.
//!
//! ```text
//! [magic 16 bytes: 0x81 'F' 'O' 'S' 'S' 'I' 'L' 'I' 'Z' 'E' 'D' 'B' 0 0 0 FORMAT_VERSION]
//! repeated:
//!   [name: 32 ASCII chars = <tag:16 hex><hash:16 hex>]
//!   [header: little-endian u32 payload_size, u32 format, u32 crc, u32 uncompressed_size]
//!   [payload: payload_size bytes]
//! ```
//!
//! Grounded on `original_source/fossilize_db.cpp`'s `StreamArchive`: same
//! magic bytes, same four-word header, same little-endian framing, same
//! "truncated trailing entry is silently discarded, and in append mode the
//! file is physically truncated back to the last whole record" recovery
//! rule (spec §8 property 6).

use crate::{entry_name, Database, DatabaseMode, PayloadReadFlags, PayloadWriteFlags, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use fossilize_hash::FxHashMap;
use fossilize_types::{FossilizeError, Hash, ResourceTag, FORMAT_MIN_COMPAT_VERSION, FORMAT_VERSION};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

const MAGIC_PREFIX: &[u8; 12] = b"\x81FOSSILIZEDB";
const MAGIC_SIZE: u64 = 16;
const NAME_SIZE: u64 = 32;
const HEADER_SIZE: u64 = 16;

const COMPRESSION_NONE: u32 = 1;
const COMPRESSION_DEFLATE: u32 = 2;

#[derive(Copy, Clone)]
struct Header {
    payload_size: u32,
    format: u32,
    crc: u32,
    uncompressed_size: u32,
}

#[derive(Copy, Clone)]
struct Entry {
    payload_offset: u64,
    header: Header,
}

pub struct StreamArchiveDatabase {
    path: PathBuf,
    mode: DatabaseMode,
    file: Option<File>,
    entries: FxHashMap<(ResourceTag, Hash), Entry>,
}

fn magic(version: u8) -> [u8; 16] {
    let mut m = [0u8; 16];
    m[..12].copy_from_slice(MAGIC_PREFIX);
    m[15] = version;
    m
}

fn read_header(file: &mut File) -> std::io::Result<Header> {
    Ok(Header {
        payload_size: file.read_u32::<LittleEndian>()?,
        format: file.read_u32::<LittleEndian>()?,
        crc: file.read_u32::<LittleEndian>()?,
        uncompressed_size: file.read_u32::<LittleEndian>()?,
    })
}

fn write_header(file: &mut File, header: &Header) -> std::io::Result<()> {
    file.write_u32::<LittleEndian>(header.payload_size)?;
    file.write_u32::<LittleEndian>(header.format)?;
    file.write_u32::<LittleEndian>(header.crc)?;
    file.write_u32::<LittleEndian>(header.uncompressed_size)
}

impl StreamArchiveDatabase {
    pub fn new(path: &std::path::Path, mode: DatabaseMode) -> StreamArchiveDatabase {
        StreamArchiveDatabase {
            path: path.to_path_buf(),
            mode,
            file: None,
            entries: FxHashMap::default(),
        }
    }

    /// Scans every record from just past the magic to EOF, stopping (and,
    /// in append mode, truncating) at the first record whose name, header,
    /// or payload doesn't fully fit before EOF (spec §3 invariant, §8
    /// property 6: a writer killed mid-record leaves a recoverable file).
    fn scan(&mut self) -> Result<()> {
        let file = self.file.as_mut().expect("scan called after file is opened");
        let len = file.seek(SeekFrom::End(0))?;
        if len == 0 {
            return Ok(());
        }

        file.seek(SeekFrom::Start(0))?;
        let mut header_bytes = [0u8; 16];
        file.read_exact(&mut header_bytes)?;
        if &header_bytes[..12] != MAGIC_PREFIX || header_bytes[12..15] != [0, 0, 0] {
            return Err(FossilizeError::Corruption(format!("{} is not a Fossilize stream archive", self.path.display())));
        }
        let version = header_bytes[15] as u32;
        if version < FORMAT_MIN_COMPAT_VERSION || version > FORMAT_VERSION {
            return Err(FossilizeError::UnsupportedFormatVersion {
                found: version,
                min: FORMAT_MIN_COMPAT_VERSION,
                max: FORMAT_VERSION,
            });
        }

        let mut offset = MAGIC_SIZE;
        let mut last_good_offset = offset;
        while offset + NAME_SIZE + HEADER_SIZE <= len {
            let mut name_bytes = [0u8; NAME_SIZE as usize];
            file.read_exact(&mut name_bytes)?;
            let header = read_header(file)?;
            let payload_start = offset + NAME_SIZE + HEADER_SIZE;
            if payload_start + header.payload_size as u64 > len {
                break;
            }

            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| FossilizeError::Corruption("stream archive entry name is not ASCII".into()))?;
            if let Some((tag, hash)) = crate::parse_entry_name(name) {
                self.entries.insert((tag, hash), Entry { payload_offset: payload_start, header });
            }

            offset = payload_start + header.payload_size as u64;
            last_good_offset = offset;
            file.seek(SeekFrom::Start(offset))?;
        }

        if offset != len && self.mode == DatabaseMode::Append {
            file.set_len(last_good_offset)?;
        }
        Ok(())
    }

    fn decode(&mut self, entry: Entry) -> Result<Vec<u8>> {
        let file = self.file.as_mut().expect("decode called after file is opened");
        file.seek(SeekFrom::Start(entry.payload_offset))?;
        let mut raw = vec![0u8; entry.header.payload_size as usize];
        file.read_exact(&mut raw)?;

        if entry.header.crc != 0 {
            let computed = crc32fast::hash(&raw);
            if computed != entry.header.crc {
                return Err(FossilizeError::ChecksumMismatch { expected: entry.header.crc, found: computed });
            }
        }

        match entry.header.format {
            COMPRESSION_NONE => Ok(raw),
            COMPRESSION_DEFLATE => {
                let mut decoder = flate2::read::ZlibDecoder::new(&raw[..]);
                let mut out = Vec::with_capacity(entry.header.uncompressed_size as usize);
                decoder.read_to_end(&mut out)?;
                Ok(out)
            }
            other => Err(FossilizeError::Corruption(format!("unknown stream archive payload format {}", other))),
        }
    }
}

impl Database for StreamArchiveDatabase {
    fn prepare(&mut self) -> Result<()> {
        let file = match self.mode {
            DatabaseMode::ReadOnly => File::open(&self.path)?,
            DatabaseMode::OverWrite => File::create(&self.path)?,
            DatabaseMode::ExclusiveOverWrite => OpenOptions::new().write(true).create_new(true).open(&self.path)?,
            DatabaseMode::Append => OpenOptions::new().read(true).write(true).create(true).open(&self.path)?,
        };
        self.file = Some(file);

        if self.mode == DatabaseMode::OverWrite || self.mode == DatabaseMode::ExclusiveOverWrite {
            self.file.as_mut().unwrap().write_all(&magic(FORMAT_VERSION as u8))?;
            return Ok(());
        }

        self.scan()?;

        if self.mode == DatabaseMode::Append && self.file.as_mut().unwrap().seek(SeekFrom::End(0))? == 0 {
            self.file.as_mut().unwrap().write_all(&magic(FORMAT_VERSION as u8))?;
        }
        Ok(())
    }

    fn has_entry(&self, tag: ResourceTag, hash: Hash) -> bool {
        self.entries.contains_key(&(tag, hash))
    }

    fn read_entry(&mut self, tag: ResourceTag, hash: Hash, flags: PayloadReadFlags) -> Result<Option<Vec<u8>>> {
        let Some(&entry) = self.entries.get(&(tag, hash)) else {
            return Ok(None);
        };
        if flags.contains(PayloadReadFlags::RAW) {
            let file = self.file.as_mut().expect("prepare must run before read_entry");
            file.seek(SeekFrom::Start(entry.payload_offset - HEADER_SIZE))?;
            let mut raw = vec![0u8; (HEADER_SIZE + entry.header.payload_size as u64) as usize];
            file.read_exact(&mut raw)?;
            return Ok(Some(raw));
        }
        Ok(Some(self.decode(entry)?))
    }

    fn write_entry(&mut self, tag: ResourceTag, hash: Hash, payload: &[u8], flags: PayloadWriteFlags) -> Result<()> {
        if self.mode == DatabaseMode::ReadOnly {
            return Err(FossilizeError::Corruption("database is read-only".into()));
        }
        if self.has_entry(tag, hash) {
            return Ok(());
        }

        let file = self.file.as_mut().expect("prepare must run before write_entry");
        let end = file.seek(SeekFrom::End(0))?;
        let payload_offset = end + NAME_SIZE + HEADER_SIZE;

        file.write_all(entry_name(tag, hash).as_bytes())?;

        if flags.contains(PayloadWriteFlags::RAW) {
            if payload.len() < HEADER_SIZE as usize {
                return Err(FossilizeError::Corruption("raw payload shorter than a stream archive header".into()));
            }
            file.write_all(payload)?;
            let header = Header {
                payload_size: u32::from_le_bytes(payload[0..4].try_into().unwrap()),
                format: u32::from_le_bytes(payload[4..8].try_into().unwrap()),
                crc: u32::from_le_bytes(payload[8..12].try_into().unwrap()),
                uncompressed_size: u32::from_le_bytes(payload[12..16].try_into().unwrap()),
            };
            self.entries.insert((tag, hash), Entry { payload_offset, header });
            return Ok(());
        }

        let (on_disk, format): (Vec<u8>, u32) = if flags.contains(PayloadWriteFlags::COMPRESS) {
            let level = if flags.contains(PayloadWriteFlags::BEST_COMPRESSION) { 9 } else { 6 };
            let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(level));
            encoder.write_all(payload)?;
            (encoder.finish()?, COMPRESSION_DEFLATE)
        } else {
            (payload.to_vec(), COMPRESSION_NONE)
        };
        let crc = if flags.contains(PayloadWriteFlags::COMPUTE_CHECKSUM) { crc32fast::hash(&on_disk) } else { 0 };

        let header = Header {
            payload_size: on_disk.len() as u32,
            format,
            crc,
            uncompressed_size: payload.len() as u32,
        };
        write_header(file, &header)?;
        file.write_all(&on_disk)?;
        self.entries.insert((tag, hash), Entry { payload_offset, header });
        Ok(())
    }

    fn hash_list_for_tag(&self, tag: ResourceTag) -> Vec<Hash> {
        let mut hashes: Vec<Hash> = self.entries.keys().filter(|(t, _)| *t == tag).map(|(_, h)| *h).collect();
        hashes.sort_unstable();
        hashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_reopen_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.foz");
        {
            let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::OverWrite);
            db.prepare().unwrap();
            db.write_entry(
                ResourceTag::Sampler,
                1,
                b"some payload bytes",
                PayloadWriteFlags::COMPUTE_CHECKSUM | PayloadWriteFlags::COMPRESS,
            )
            .unwrap();
        }
        let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::ReadOnly);
        db.prepare().unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, 1));
        assert_eq!(
            db.read_entry(ResourceTag::Sampler, 1, PayloadReadFlags::empty()).unwrap(),
            Some(b"some payload bytes".to_vec())
        );
    }

    #[test]
    fn append_mode_adds_to_existing_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.foz");
        {
            let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::OverWrite);
            db.prepare().unwrap();
            db.write_entry(ResourceTag::Sampler, 1, b"one", PayloadWriteFlags::empty()).unwrap();
        }
        {
            let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::Append);
            db.prepare().unwrap();
            assert!(db.has_entry(ResourceTag::Sampler, 1));
            db.write_entry(ResourceTag::Sampler, 2, b"two", PayloadWriteFlags::empty()).unwrap();
        }
        let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::ReadOnly);
        db.prepare().unwrap();
        assert_eq!(db.hash_list_for_tag(ResourceTag::Sampler), vec![1, 2]);
    }

    #[test]
    fn truncated_trailing_entry_is_recovered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.foz");
        {
            let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::OverWrite);
            db.prepare().unwrap();
            db.write_entry(ResourceTag::Sampler, 1, b"one", PayloadWriteFlags::empty()).unwrap();
            db.write_entry(ResourceTag::Sampler, 2, b"two", PayloadWriteFlags::empty()).unwrap();
        }
        let full_len = std::fs::metadata(&path).unwrap().len();
        let f = OpenOptions::new().write(true).open(&path).unwrap();
        f.set_len(full_len - 3).unwrap();
        drop(f);

        let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::Append);
        db.prepare().unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, 1));
        assert!(!db.has_entry(ResourceTag::Sampler, 2));
        db.write_entry(ResourceTag::Sampler, 3, b"three", PayloadWriteFlags::empty()).unwrap();

        let mut reopened = StreamArchiveDatabase::new(&path, DatabaseMode::ReadOnly);
        reopened.prepare().unwrap();
        assert_eq!(reopened.hash_list_for_tag(ResourceTag::Sampler), vec![1, 3]);
    }

    #[test]
    fn checksum_mismatch_fails_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.foz");
        {
            let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::OverWrite);
            db.prepare().unwrap();
            db.write_entry(ResourceTag::Sampler, 1, b"payload", PayloadWriteFlags::COMPUTE_CHECKSUM).unwrap();
        }
        // Flip a byte inside the payload region, after the magic+name+header.
        let mut bytes = std::fs::read(&path).unwrap();
        let corrupt_at = bytes.len() - 1;
        bytes[corrupt_at] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        let mut db = StreamArchiveDatabase::new(&path, DatabaseMode::ReadOnly);
        db.prepare().unwrap();
        assert!(db.read_entry(ResourceTag::Sampler, 1, PayloadReadFlags::empty()).is_err());
    }
}
