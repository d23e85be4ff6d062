//! Git index (staging area)
//!
//! The index tracks which blobs should be included in the next commit,
//! together with the stat data used to notice working-tree changes.
//!
//! ## Index File Format
//!
//! The index file contains:
//! - Header: Signature, version, and entry count
//! - Entries: Sorted list of staged paths with metadata
//! - Checksum: SHA-1 hash of the entire index for integrity verification
//!
//! In-memory state only reaches the disk through [`Index::write`] and is only
//! replaced from disk by [`Index::load`] or [`Index::refresh`]. The index
//! carries no internal locking; callers serialize access.

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_BLOCK, ENTRY_MIN_SIZE, IndexEntry};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::{IoContext, RepositoryError, Result};
use std::collections::BTreeMap;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `(path, stage)`; `String` keeps git's byte-wise path order
type EntryKey = (String, u8);

/// Git index (staging area)
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    entries: BTreeMap<EntryKey, IndexEntry>,
    /// Modified since the last load or write
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Drop every entry from memory; the file on disk is untouched until [`Index::write`]
    pub fn clear(&mut self) {
        self.entries.clear();
        self.changed = true;
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.changed
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn entry_at(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.values().nth(position)
    }

    /// Entry for `name`, preferring the lowest stage present
    pub fn entry_by_name(&self, name: &str) -> Option<&IndexEntry> {
        self.entries
            .range((name.to_string(), 0)..=(name.to_string(), u8::MAX))
            .map(|(_, entry)| entry)
            .next()
    }

    pub fn entry_by_name_and_stage(&self, name: &str, stage: u8) -> Option<&IndexEntry> {
        self.entries.get(&(name.to_string(), stage))
    }

    /// Insert or replace the entry with the same `(path, stage)`
    ///
    /// A staged file displaces any staged directory of the same name and any
    /// staged file standing where one of its parent directories should be.
    pub fn add_entry(&mut self, entry: IndexEntry) -> Result<()> {
        entry.validate()?;

        let key = entry.key()?;
        self.discard_conflicts(&entry)?;
        debug!(path = %key.0, stage = key.1, oid = %entry.oid, "staged entry");
        self.entries.insert(key, entry);
        self.changed = true;

        Ok(())
    }

    /// Store the file's content as a blob and stage it at stage 0
    pub fn add_file(
        &mut self,
        workspace: &Workspace,
        database: &Database,
        path: &Path,
    ) -> Result<IndexEntry> {
        let blob = workspace.parse_blob(path)?;
        let oid = database.store(&blob)?;
        let metadata = workspace.stat_file(path)?;

        let entry = IndexEntry::with_stage(Workspace::normalize(path)?, oid, metadata, 0);
        self.add_entry(entry.clone())?;

        Ok(entry)
    }

    /// Remove the entry at `(path, stage)`; returns whether one was present
    pub fn remove(&mut self, path: &str, stage: u8) -> bool {
        let removed = self.entries.remove(&(path.to_string(), stage)).is_some();
        self.changed |= removed;

        removed
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) -> Result<()> {
        let stage = entry.stage();

        for parent in entry.parent_dirs() {
            if let Some(parent) = parent.to_str() {
                self.entries.remove(&(parent.to_string(), stage));
            }
        }

        let prefix = format!("{}/", entry.path_str()?);
        self.entries
            .retain(|(path, entry_stage), _| *entry_stage != stage || !path.starts_with(&prefix));

        Ok(())
    }

    /// Replace the in-memory entries with the file's content
    ///
    /// A missing index file loads as an empty index. A checksum mismatch or a
    /// truncated file is reported as corruption.
    pub fn load(&mut self) -> Result<()> {
        self.entries.clear();
        self.changed = false;

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(self.path())
            .io_context(|| format!("unable to open index {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)
            .io_context(|| format!("unable to lock index {}", self.path.display()))?;

        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let entries_count = self.parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;
        reader.verify()?;

        debug!(entries = entries_count, "loaded index");
        Ok(())
    }

    /// Reload from disk and report entries whose working-tree file changed
    ///
    /// An entry is reported when its file is gone or its size or modification
    /// time differ from the staged stat. Entries are not updated.
    pub fn refresh(&mut self, workspace: &Workspace) -> Result<Vec<IndexEntry>> {
        self.load()?;

        let mut stale = Vec::new();
        for entry in self.entries.values().filter(|entry| entry.stage() == 0) {
            match workspace.stat_file(entry.path()) {
                Ok(stat) if !entry.is_stale(&stat) => {}
                Ok(_) | Err(RepositoryError::Io { .. }) => stale.push(entry.clone()),
                Err(error) => return Err(error),
            }
        }

        Ok(stale)
    }

    fn parse_header(&self, reader: &mut Checksum) -> Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(header_bytes.as_ref())?;
        header.validate()?;

        Ok(header.entries_count)
    }

    /// Read each entry, extending it block by block until its NUL padding is reached
    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> Result<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            while entry_bytes.last() != Some(&0) {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::deserialize(entry_bytes.as_slice())?;
            self.entries.insert(entry.key()?, entry);
        }

        Ok(())
    }

    /// Persist the entries atomically
    ///
    /// The content goes to `index.lock`, created exclusively so a concurrent
    /// writer fails, and is renamed over the index once fully written and
    /// synced. On failure the previous index stays in place.
    pub fn write(&mut self) -> Result<()> {
        let lock_path = self.lock_path();

        let result = self
            .write_lock_file(&lock_path)
            .and_then(|_| {
                std::fs::rename(&lock_path, self.path())
                    .io_context(|| format!("unable to replace index {}", self.path.display()))
            });

        if let Err(error) = result {
            // only clean up a lock file this call created
            if !matches!(&error, RepositoryError::Io { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists)
                && let Err(cleanup) = std::fs::remove_file(&lock_path)
            {
                warn!(path = %lock_path.display(), %cleanup, "unable to remove index lock");
            }
            return Err(error);
        }

        self.changed = false;
        debug!(entries = self.entries.len(), "wrote index");
        Ok(())
    }

    fn write_lock_file(&self, lock_path: &Path) -> Result<()> {
        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path)
            .io_context(|| format!("unable to create index lock {}", lock_path.display()))?;
        let lock = file_guard::lock(&mut lock_file, file_guard::Lock::Exclusive, 0, 1)
            .io_context(|| format!("unable to lock {}", lock_path.display()))?;

        let mut writer = Checksum::new(lock);

        let header = IndexHeader {
            entries_count: self.entries.len() as u32,
            ..IndexHeader::empty()
        };
        writer.write(&header.serialize()?)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()
    }
}
