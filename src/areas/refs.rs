//! Git references (branches, HEAD, tags)
//!
//! References are human-readable names pointing at objects. They can be:
//! - Direct: containing a 40-character object id
//! - Symbolic: pointing to another reference (e.g., HEAD -> refs/heads/master)
//!
//! ## File Format
//!
//! References are stored as text files under `.git` containing either:
//! - A 40-character SHA-1 hash (direct reference)
//! - `ref: <path>` for symbolic references
//!
//! Writes go to `<ref>.lock`, created exclusively, and are renamed into place.
//! Symbolic chains longer than [`MAX_SYMREF_DEPTH`] are treated as corrupt.

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::branch::{HEAD_REF_NAME, MAX_SYMREF_DEPTH, SYMREF_REGEX};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{IoContext, RepositoryError, Result};
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Git references manager rooted at the `.git` directory
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

/// Value stored in a reference file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymRefOrOid {
    SymRef { sym_ref_name: SymRefName },
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> Result<Option<SymRefOrOid>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .io_context(|| format!("failed to read ref file at {}", path.display()))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        match symref_match {
            Some(symref_match) => Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].to_string()),
            })),
            None => ObjectId::try_parse(content).map(|oid| Some(SymRefOrOid::Oid(oid))).map_err(
                |_| RepositoryError::corrupt_graph(path.display(), "reference does not hold an object id"),
            ),
        }
    }

    fn raw(&self) -> String {
        match self {
            SymRefOrOid::SymRef { sym_ref_name } => format!("ref: {sym_ref_name}\n"),
            SymRefOrOid::Oid(oid) => format!("{oid}\n"),
        }
    }
}

impl Refs {
    fn ref_path(&self, name: &SymRefName) -> PathBuf {
        self.path.join(name.as_ref_path())
    }

    pub fn exists(&self, name: &SymRefName) -> bool {
        self.ref_path(name).is_file()
    }

    /// Raw content of one reference, without following it
    pub fn read_raw(&self, name: &SymRefName) -> Result<Option<SymRefOrOid>> {
        SymRefOrOid::read_symref_or_oid(&self.ref_path(name))
    }

    /// Object id a reference ends up at, following symbolic references
    ///
    /// `None` when the reference, or the end of its chain, does not exist
    /// (e.g. HEAD of a repository without commits).
    pub fn read_ref(&self, name: &SymRefName) -> Result<Option<ObjectId>> {
        let target = self.current_ref(Some(name.clone()))?;

        match self.read_raw(&target)? {
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            _ => Ok(None),
        }
    }

    pub fn read_head(&self) -> Result<Option<ObjectId>> {
        self.read_ref(&SymRefName::head())
    }

    /// Last reference in the symbolic chain starting at `source` (HEAD by default)
    ///
    /// For example, if HEAD points to refs/heads/main, returns refs/heads/main
    /// whether or not that branch exists yet.
    pub fn current_ref(&self, source: Option<SymRefName>) -> Result<SymRefName> {
        let mut current = source.unwrap_or_else(SymRefName::head);

        for _ in 0..=MAX_SYMREF_DEPTH {
            match self.read_raw(&current)? {
                Some(SymRefOrOid::SymRef { sym_ref_name }) => current = sym_ref_name,
                Some(SymRefOrOid::Oid(_)) | None => return Ok(current),
            }
        }

        Err(RepositoryError::corrupt_graph(
            current,
            format!("symbolic reference chain deeper than {MAX_SYMREF_DEPTH}"),
        ))
    }

    /// Point the end of `name`'s symbolic chain at `oid`
    pub fn update_ref(&self, name: &SymRefName, oid: ObjectId) -> Result<()> {
        BranchName::try_parse_as("reference", name.as_ref_path())?;
        let target = self.current_ref(Some(name.clone()))?;

        self.write_ref(&target, &SymRefOrOid::Oid(oid))?;
        debug!(reference = %target, %oid, "updated reference");

        Ok(())
    }

    pub fn update_head(&self, oid: ObjectId) -> Result<()> {
        self.update_ref(&SymRefName::head(), oid)
    }

    /// Create a direct reference that must not exist yet
    pub fn create_ref(&self, name: &SymRefName, oid: ObjectId, what: &'static str) -> Result<()> {
        BranchName::try_parse_as(what, name.as_ref_path())?;
        if self.exists(name) {
            return Err(RepositoryError::NameConflict {
                what,
                name: name.short_name().to_string(),
            });
        }

        self.write_ref(name, &SymRefOrOid::Oid(oid))?;
        debug!(reference = %name, %oid, "created reference");

        Ok(())
    }

    pub fn create_branch(&self, name: &BranchName, oid: ObjectId) -> Result<()> {
        self.create_ref(&SymRefName::branch(name), oid, "branch")
    }

    /// Make `name` a symbolic reference to `target`
    pub fn set_symbolic(&self, name: &SymRefName, target: &SymRefName) -> Result<()> {
        BranchName::try_parse_as("reference", target.as_ref_path())?;

        self.write_ref(
            name,
            &SymRefOrOid::SymRef {
                sym_ref_name: target.clone(),
            },
        )
    }

    /// Replace the reference file through `<ref>.lock`
    fn write_ref(&self, name: &SymRefName, value: &SymRefOrOid) -> Result<()> {
        let path = self.ref_path(name);
        let parent = path
            .parent()
            .ok_or_else(|| RepositoryError::not_found("reference directory", name))?;
        std::fs::create_dir_all(parent).io_context(|| {
            format!("failed to create parent directories for ref file at {}", path.display())
        })?;

        let lock_path = PathBuf::from(format!("{}.lock", path.display()));
        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .io_context(|| format!("unable to create ref lock {}", lock_path.display()))?;

        let written = file_guard::lock(&mut lock_file, Lock::Exclusive, 0, 1).and_then(|mut lock| {
            lock.deref_mut().write_all(value.raw().as_bytes())?;
            lock.deref_mut().sync_all()
        });
        drop(lock_file);

        let published = written.and_then(|_| std::fs::rename(&lock_path, &path));
        if published.is_err() {
            let _ = std::fs::remove_file(&lock_path);
        }

        published.io_context(|| format!("failed to write ref file at {}", path.display()))
    }

    /// Every reference file under `.git/<namespace>`, sorted by name
    pub fn list_refs(&self, namespace: &str) -> Result<Vec<SymRefName>> {
        let root = self.path.join(namespace);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut refs = WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(self.path.as_ref()).ok()?;
                let name = relative_path.to_str()?;
                (!name.ends_with(".lock")).then(|| SymRefName::new(name.to_string()))
            })
            .collect::<Vec<_>>();
        refs.sort();

        Ok(refs)
    }

    pub fn list_branches(&self) -> Result<Vec<SymRefName>> {
        self.list_refs("refs/heads")
    }

    pub fn list_tags(&self) -> Result<Vec<SymRefName>> {
        self.list_refs("refs/tags")
    }

    /// All references including HEAD
    pub fn list_all_refs(&self) -> Result<Vec<SymRefName>> {
        let mut refs = self.list_refs("refs")?;
        if self.exists(&SymRefName::head()) {
            refs.insert(0, SymRefName::new(HEAD_REF_NAME.to_string()));
        }

        Ok(refs)
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}
