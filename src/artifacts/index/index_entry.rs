//! Index entry representation
//!
//! Each entry in the index represents a tracked file with:
//! - File path
//! - Content hash (blob id)
//! - File metadata (mode, size, timestamps)
//! - Merge stage (0 for normal entries, 1-3 during a conflicted merge)
//!
//! ## Entry Format
//!
//! Entries are stored in a binary format with 8-byte alignment for efficient reading.
//! The 16-bit flags field keeps the stage in bits 12-13 and the path length
//! (capped at `0xFFF`) in the low 12 bits.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepositoryError, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::fs::Metadata;
use std::io::{BufRead, Write};
use std::os::unix::prelude::MetadataExt;
use std::path::{Path, PathBuf};

/// Largest path length representable in the flags field
const MAX_PATH_SIZE: usize = 0xFFF;

const STAGE_SHIFT: u32 = 12;
const STAGE_MASK: u32 = 0x3000;

/// Highest merge stage
pub const MAX_STAGE: u8 = 3;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Minimum size of an index entry in bytes
pub const ENTRY_MIN_SIZE: usize = 64;

/// Size of the fixed part preceding the path
const ENTRY_PREFIX_SIZE: usize = 62;

/// Index entry representing a staged path
#[derive(Debug, Clone, Default, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root, `/`-separated
    pub name: PathBuf,
    /// Id of the staged blob
    pub oid: ObjectId,
    /// File metadata (mode, size, timestamps, flags)
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Entry for `name` at the given merge stage
    pub fn with_stage(name: impl Into<PathBuf>, oid: ObjectId, mut metadata: EntryMetadata, stage: u8) -> Self {
        let name = name.into();
        metadata.flags = Self::flags_for(&name, stage);
        IndexEntry {
            name,
            oid,
            metadata,
        }
    }

    pub fn path(&self) -> &Path {
        &self.name
    }

    pub fn path_str(&self) -> Result<&str> {
        self.name.to_str().ok_or_else(|| RepositoryError::InvalidEntry {
            path: self.name.display().to_string(),
            reason: String::from("path is not valid UTF-8"),
        })
    }

    pub fn stage(&self) -> u8 {
        ((self.metadata.flags & STAGE_MASK) >> STAGE_SHIFT) as u8
    }

    /// Sort key inside the index: byte-wise path, then stage
    pub fn key(&self) -> Result<(String, u8)> {
        Ok((self.path_str()?.to_string(), self.stage()))
    }

    /// Required fields are a non-empty relative path and a blob id
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| RepositoryError::InvalidEntry {
            path: self.name.display().to_string(),
            reason: reason.to_string(),
        };

        let path = self.path_str()?;
        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        if self.name.is_absolute() || path.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
            return Err(invalid("path must be relative and normalized"));
        }
        if self.oid == ObjectId::default() {
            return Err(invalid("missing blob id"));
        }
        if self.stage() > MAX_STAGE {
            return Err(invalid("stage out of range"));
        }

        Ok(())
    }

    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();

        dirs
    }

    /// Working-tree size or modification time no longer match the staged stat
    pub fn is_stale(&self, other: &EntryMetadata) -> bool {
        self.metadata.size != other.size
            || self.metadata.mtime != other.mtime
            || self.metadata.mtime_nsec != other.mtime_nsec
    }

    fn flags_for(name: &Path, stage: u8) -> u32 {
        let length = name.as_os_str().len().min(MAX_PATH_SIZE) as u32;
        ((stage as u32) << STAGE_SHIFT) & STAGE_MASK | length
    }
}

/// File metadata stored in index entries
///
/// Contains both file status information (mode, size, inode) and timestamps.
/// This metadata enables quick change detection without reading content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Change time (seconds since Unix epoch)
    pub ctime: i64,
    pub ctime_nsec: i64,
    /// Modification time (seconds since Unix epoch)
    pub mtime: i64,
    pub mtime_nsec: i64,
    pub dev: u64,
    pub ino: u64,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    /// File size in bytes
    pub size: u64,
    /// Stage and path length, see the module docs
    pub flags: u32,
}

impl EntryMetadata {
    /// Metadata for an entry that has no working-tree file behind it
    pub fn for_blob(mode: EntryMode, size: u64) -> Self {
        EntryMetadata {
            mode,
            size,
            ..Default::default()
        }
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> Result<Bytes> {
        let entry_name = self.path_str()?;
        let flags = Self::flags_for(&self.name, self.stage());

        let mut entry_bytes = Vec::with_capacity(ENTRY_MIN_SIZE + entry_name.len());
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.dev as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ino as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mode.as_u32())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size as u32)?;
        self.oid.write_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(flags as u16)?;
        entry_bytes.write_all(entry_name.as_bytes())?;

        // at least one NUL, then pad to the block size
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if bytes.len() < ENTRY_MIN_SIZE {
            return Err(RepositoryError::corrupt("invalid index entry size"));
        }

        let read_u32 = |at: usize| byteorder::NetworkEndian::read_u32(&bytes[at..at + 4]);

        let mode = EntryMode::try_from(read_u32(24))?;
        let oid = ObjectId::read_from(&mut &bytes[40..60])?;
        let flags = byteorder::NetworkEndian::read_u16(&bytes[60..62]) as u32;

        let name_end = bytes[ENTRY_PREFIX_SIZE..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| RepositoryError::corrupt("missing NUL terminator in index entry name"))?;
        let name = std::str::from_utf8(&bytes[ENTRY_PREFIX_SIZE..ENTRY_PREFIX_SIZE + name_end])
            .map_err(|_| RepositoryError::corrupt("invalid UTF-8 in index entry name"))?;

        Ok(IndexEntry {
            name: PathBuf::from(name),
            oid,
            metadata: EntryMetadata {
                ctime: read_u32(0) as i64,
                ctime_nsec: read_u32(4) as i64,
                mtime: read_u32(8) as i64,
                mtime_nsec: read_u32(12) as i64,
                dev: read_u32(16) as u64,
                ino: read_u32(20) as u64,
                mode,
                uid: read_u32(28),
                gid: read_u32(32),
                size: read_u32(36) as u64,
                flags,
            },
        })
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = RepositoryError;

    /// Stat a working-tree file; `file_path` is the absolute path used for the executable check
    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self> {
        let mode = if metadata.is_dir() {
            EntryMode::Directory
        } else if metadata.file_type().is_symlink() {
            EntryMode::Symlink
        } else if file_path.is_executable() {
            EntryMode::File(FileMode::Executable)
        } else {
            EntryMode::File(FileMode::Regular)
        };

        Ok(Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            flags: 0,
        })
    }
}
