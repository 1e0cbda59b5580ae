use crate::ResourceTag;
use std::io;
use thiserror::Error;

/// The error categories described in spec §7.
///
/// Every fallible boundary in the workspace (hashing, deep-copy, parsing,
/// database I/O) returns a `Result` built on this type rather than
/// panicking — spec §7: "Worker-thread exception — not allowed; all
/// failures propagate as logged warnings and dropped entries."
#[derive(Debug, Error)]
pub enum FossilizeError {
    #[error("file format version {found} outside supported range [{min}, {max}]")]
    UnsupportedFormatVersion { found: u32, min: u32, max: u32 },

    #[error("archive entry is corrupt: {0}")]
    Corruption(String),

    #[error("unknown pNext sType {stype:#x} encountered while processing {entity}")]
    UnknownPNext { entity: &'static str, stype: u32 },

    #[error("missing cross-reference: tag {tag:?} hash {hash:016x}")]
    MissingReference { tag: ResourceTag, hash: u64 },

    #[error("handle {0:#x} was never registered with the recorder")]
    HandleNotRegistered(u64),

    #[error("shader module identifier was never registered with the recorder")]
    IdentifierNotRegistered,

    #[error("checksum mismatch: expected {expected:#010x}, computed {found:#010x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FossilizeError>;
