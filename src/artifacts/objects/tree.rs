//! Git tree object
//!
//! Trees represent directory snapshots in Git. They contain entries for files (blobs)
//! and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Entries are kept in git's canonical order: byte-wise by name, where a
//! directory name compares as if it ended with `/`. Decoding rejects trees
//! whose entries are out of order or duplicated.
//!
//! ## Tree Building
//!
//! [`Tree::build`] turns flat index entries into nested trees, storing children
//! before their parents since a parent needs its children's ids.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{RepositoryError, Result};
use bytes::Bytes;
use derive_new::new;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// One `(mode, name, id)` row of a tree; the entry type follows from the mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub oid: ObjectId,
}

impl TreeEntry {
    pub fn entry_type(&self) -> ObjectType {
        self.mode.object_type()
    }

    /// Git's tree ordering: directories sort as if their name ended in `/`
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        let suffix = |entry: &TreeEntry| if entry.mode.is_tree() { Some(b'/') } else { None };

        self.name
            .as_bytes()
            .iter()
            .copied()
            .chain(suffix(self))
            .cmp(other.name.as_bytes().iter().copied().chain(suffix(other)))
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
            return Err(RepositoryError::corrupt(format!(
                "invalid tree entry name '{name}'"
            )));
        }

        Ok(())
    }
}

/// Git tree object representing a directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Build a tree from arbitrary entries, putting them in canonical order
    ///
    /// Fails when two entries share a name or a name is not a single path component.
    pub fn from_entries(mut entries: Vec<TreeEntry>) -> Result<Self> {
        for entry in &entries {
            TreeEntry::validate_name(&entry.name)?;
        }

        entries.sort_by(TreeEntry::canonical_cmp);
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(RepositoryError::corrupt(format!(
                "duplicate tree entry '{}'",
                pair[0].name
            )));
        }

        Ok(Tree { entries })
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build nested trees from index entries and hand each one to `store`
    ///
    /// Children are stored before their parents. Only stage-0 entries are
    /// considered. Returns the id of the root tree.
    pub fn build<'e, F>(entries: impl Iterator<Item = &'e IndexEntry>, store: &mut F) -> Result<ObjectId>
    where
        F: FnMut(&Tree) -> Result<ObjectId>,
    {
        let mut root = PendingTree::default();

        for entry in entries.filter(|entry| entry.stage() == 0) {
            let path = entry.path_str()?;
            let components = path.split('/').collect::<Vec<_>>();
            root.insert(&components, entry)?;
        }

        root.write(store)
    }
}

/// Directory being assembled from index entries
#[derive(Debug, Default)]
struct PendingTree {
    files: BTreeMap<String, (EntryMode, ObjectId)>,
    directories: BTreeMap<String, PendingTree>,
}

impl PendingTree {
    fn insert(&mut self, components: &[&str], entry: &IndexEntry) -> Result<()> {
        let conflict = || RepositoryError::InvalidEntry {
            path: entry.path().display().to_string(),
            reason: String::from("a file and a directory share this path"),
        };

        match components {
            [] => Err(RepositoryError::InvalidEntry {
                path: String::new(),
                reason: String::from("empty path"),
            }),
            [name] => {
                if self.directories.contains_key(*name) {
                    return Err(conflict());
                }
                self.files
                    .insert(name.to_string(), (entry.metadata.mode, entry.oid));
                Ok(())
            }
            [directory, rest @ ..] => {
                if self.files.contains_key(*directory) {
                    return Err(conflict());
                }
                self.directories
                    .entry(directory.to_string())
                    .or_default()
                    .insert(rest, entry)
            }
        }
    }

    fn write<F>(self, store: &mut F) -> Result<ObjectId>
    where
        F: FnMut(&Tree) -> Result<ObjectId>,
    {
        let mut entries = self
            .files
            .into_iter()
            .map(|(name, (mode, oid))| TreeEntry::new(mode, name, oid))
            .collect::<Vec<_>>();

        for (name, directory) in self.directories {
            let oid = directory.write(store)?;
            entries.push(TreeEntry::new(EntryMode::Directory, name, oid));
        }

        let tree = Tree::from_entries(entries).map_err(|error| match error {
            RepositoryError::CorruptObject { reason, .. } => RepositoryError::InvalidEntry {
                path: String::from("<tree>"),
                reason,
            },
            other => other,
        })?;
        store(&tree)
    }
}

impl Packable for Tree {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = Vec::new();

        for entry in &self.entries {
            write!(content, "{} {}\0", entry.mode.as_str(), entry.name)?;
            entry.oid.write_to(&mut content)?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut entries: Vec<TreeEntry> = Vec::new();

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(RepositoryError::corrupt("unexpected EOF in tree entry mode"));
            }

            let mode = std::str::from_utf8(&mode_bytes).map_err(RepositoryError::corrupt)?;
            let mode = EntryMode::from_octal_str(mode)?;

            // Read "name\0"
            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(RepositoryError::corrupt("unexpected EOF in tree entry name"));
            }
            let name = std::str::from_utf8(&name_bytes)
                .map_err(RepositoryError::corrupt)?
                .to_owned();
            TreeEntry::validate_name(&name)?;

            let oid = ObjectId::read_from(&mut reader)
                .map_err(|_| RepositoryError::corrupt("unexpected EOF in tree entry id"))?;

            let entry = TreeEntry::new(mode, name, oid);
            if let Some(previous) = entries.last()
                && previous.canonical_cmp(&entry) != Ordering::Less
            {
                return Err(RepositoryError::corrupt(format!(
                    "tree entries out of order at '{}'",
                    entry.name
                )));
            }
            entries.push(entry);
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{} {} {}\t{}",
                    entry.mode,
                    entry.entry_type(),
                    entry.oid,
                    entry.name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
