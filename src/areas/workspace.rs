//! Working tree access
//!
//! Paths handed to the workspace are relative to its root; `.git` is never listed.

use crate::artifacts::index::index_entry::EntryMetadata;
use crate::artifacts::objects::blob::Blob;
use crate::errors::{IoContext, RepositoryError, Result};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse_blob(&self, path: &Path) -> Result<Blob> {
        Ok(Blob::new(self.read_file(path)?))
    }

    /// Files under `root_file_path` (the whole tree by default), relative to the root
    pub fn list_files(&self, root_file_path: Option<&Path>) -> Result<Vec<PathBuf>> {
        let root_file_path = match root_file_path {
            Some(path) => self.path.join(path),
            None => self.path.to_path_buf(),
        };

        if !root_file_path.exists() {
            return Err(RepositoryError::not_found("path", root_file_path.display()));
        }

        let mut files = WalkDir::new(&root_file_path)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !Self::is_ignored(entry.file_name().to_string_lossy().as_ref())
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() || entry.file_type().is_symlink())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(self.path.as_ref())
                    .ok()
                    .map(Path::to_path_buf)
            })
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    fn is_ignored(name: &str) -> bool {
        IGNORED_PATHS.contains(&name)
    }

    pub fn read_file(&self, file_path: &Path) -> Result<Bytes> {
        let file_path = self.path.join(file_path);

        std::fs::read(&file_path)
            .map(Bytes::from)
            .io_context(|| format!("unable to read {}", file_path.display()))
    }

    pub fn stat_file(&self, file_path: &Path) -> Result<EntryMetadata> {
        let full_path = self.path.join(file_path);
        let metadata = std::fs::symlink_metadata(&full_path)
            .io_context(|| format!("unable to stat {}", full_path.display()))?;

        (full_path.as_path(), metadata).try_into()
    }

    /// Relative `/`-separated form of a path inside the workspace
    pub fn normalize(path: &Path) -> Result<PathBuf> {
        let mut parts = Vec::new();

        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                    RepositoryError::InvalidEntry {
                        path: path.display().to_string(),
                        reason: String::from("path is not valid UTF-8"),
                    }
                })?),
                Component::CurDir => {}
                _ => {
                    return Err(RepositoryError::InvalidEntry {
                        path: path.display().to_string(),
                        reason: String::from("path must stay inside the workspace"),
                    });
                }
            }
        }

        Ok(PathBuf::from(parts.join("/")))
    }
}
