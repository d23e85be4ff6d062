//! SHA-1 accumulating reader/writer for the index file

use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::{IoContext, RepositoryError, Result};
use bytes::Bytes;
use file_guard::FileGuard;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};
use std::ops::DerefMut;

/// Wraps a locked file and digests every byte that passes through it
pub struct Checksum<'f> {
    file: FileGuard<&'f mut std::fs::File>,
    digest: Sha1,
}

impl<'f> Checksum<'f> {
    pub(crate) fn new(file: FileGuard<&'f mut std::fs::File>) -> Self {
        Checksum {
            file,
            digest: Sha1::new(),
        }
    }

    pub(crate) fn read(&mut self, size: usize) -> Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .deref_mut()
            .read_exact(&mut buffer)
            .map_err(|_| RepositoryError::corrupt("unexpected end-of-file while reading index"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .deref_mut()
            .write_all(data)
            .io_context(|| "failed to write index")?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the digest of everything written so far and flush it to disk
    pub(crate) fn write_checksum(&mut self) -> Result<()> {
        let checksum = self.digest.clone().finalize();
        let file = self.file.deref_mut();
        file.write_all(checksum.as_slice())
            .io_context(|| "failed to write index checksum")?;
        file.sync_all().io_context(|| "failed to sync index")
    }

    pub(crate) fn verify(&mut self) -> Result<()> {
        let mut expected_checksum = [0u8; CHECKSUM_SIZE];
        self.file
            .deref_mut()
            .read_exact(&mut expected_checksum)
            .map_err(|_| RepositoryError::corrupt("index is missing its checksum"))?;

        let actual_checksum = self.digest.clone().finalize();
        if expected_checksum != actual_checksum.as_slice() {
            return Err(RepositoryError::corrupt(
                "index checksum does not match value stored on disk",
            ));
        }

        Ok(())
    }
}
