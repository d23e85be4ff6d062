//! Git object identifier (SHA-1 digest)
//!
//! Object IDs are 20-byte SHA-1 digests computed over `"<type> <size>\0<content>"`.
//! They are displayed as 40-character lowercase hexadecimal strings.
//!
//! ## Storage
//!
//! Objects are stored in `.git/objects/<first-2-hex>/<remaining-38-hex>`

use crate::artifacts::objects::{OBJECT_ID_HEX_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::{RepositoryError, Result};
use std::io;
use std::path::PathBuf;

/// Git object identifier (SHA-1 digest)
///
/// Fixed-width binary digest; ordering and hashing work on the raw bytes,
/// which matches the ordering of the hexadecimal form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LENGTH]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; OBJECT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LENGTH] {
        &self.0
    }

    /// Parse and validate an object ID from its 40-character hex form
    pub fn try_parse(id: &str) -> Result<Self> {
        if !id.is_ascii() {
            return Err(RepositoryError::ambiguous(id, "invalid object id characters"));
        }
        if id.len() != OBJECT_ID_HEX_LENGTH {
            return Err(RepositoryError::ambiguous(
                id,
                format!("invalid object id length {}", id.len()),
            ));
        }

        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&id[i * 2..i * 2 + 2], 16)
                .map_err(|_| RepositoryError::ambiguous(id, "invalid object id characters"))?;
        }

        Ok(Self(bytes))
    }

    /// True when `candidate` could be (a prefix of) a hex object id
    pub fn is_hex_prefix(candidate: &str) -> bool {
        !candidate.is_empty()
            && candidate.len() <= OBJECT_ID_HEX_LENGTH
            && candidate.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Write the object ID in binary format (20 bytes)
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.0)
    }

    /// Read an object ID in binary format (20 bytes)
    pub fn read_from<R: io::Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        reader.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 hex chars.
    pub fn to_path(&self) -> PathBuf {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    /// First 7 hex characters (standard git abbreviation)
    pub fn to_short_oid(&self) -> String {
        self.to_hex()[..7].to_string()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_short_oid())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_parse(s)
    }
}
