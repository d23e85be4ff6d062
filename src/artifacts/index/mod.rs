//! On-disk pieces of the staging index (git index version 2)
//!
//! ```text
//! "DIRC" | version (u32) | entry count (u32)
//! entry*            62-byte stat prefix, path, NUL padding to a multiple of 8
//! SHA-1 of everything above
//! ```
//!
//! All integers are big-endian.

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Trailing SHA-1 digest
pub const CHECKSUM_SIZE: usize = 20;

/// Marker, version and entry count
pub const HEADER_SIZE: usize = 12;

pub const SIGNATURE: &str = "DIRC";

/// Only version 2 entries are read or written
pub const VERSION: u32 = 2;
