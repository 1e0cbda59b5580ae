//! Canonical per-entity hashing and arena-based deep copy.
//!
//! This is the crate that actually implements "same compiled result implies
//! same hash": `hash` turns a live create-info graph into the 64-bit digest
//! that becomes the entity's on-disk identity, and `copy` turns the same
//! live graph into an arena-owned value that's safe to queue for background
//! serialization after the caller's original pointers go away.

pub mod copy;
pub mod hash;
pub mod object_cache;

pub use fossilize_types::{FossilizeError, Result};

/// Resolves a live API handle to the canonical hash of the entity it names.
///
/// The recorder layer is the only thing that knows the live handle -> hash
/// mapping (it's populated as the application creates objects); this crate
/// only needs to *consume* that mapping, so it depends on a trait rather
/// than a concrete map type.
pub trait HandleResolver {
    fn resolve(&self, tag: fossilize_types::ResourceTag, handle: fossilize_types::Handle) -> Result<u64>;

    /// Resolves a shader module's driver-stable identifier to the hash of
    /// the module it names, via the recorder's identifier side-database
    /// (spec §4.7 "Module identifier database").
    fn resolve_identifier(&self, identifier: &[u8]) -> Result<u64>;
}
