use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage every file under `paths`
    ///
    /// Staged files that no longer exist under a given path are unstaged.
    pub fn add(&self, paths: &[String]) -> anyhow::Result<()> {
        for path in paths {
            let relative_path = self.relative_to_workspace(Path::new(path))?;
            let prefix = Workspace::normalize(&relative_path)?;
            let prefix = prefix.to_string_lossy().to_string();

            let files = if self.workspace().path().join(&relative_path).exists() {
                let root = (!prefix.is_empty()).then_some(relative_path.as_path());
                self.workspace().list_files(root)?
            } else if self.is_staged_under(&prefix) {
                Vec::new()
            } else {
                anyhow::bail!("pathspec '{path}' did not match any files");
            };

            let mut added = HashSet::new();
            for file in &files {
                let entry = self
                    .add_file(file)
                    .with_context(|| format!("failed to add {}", file.display()))?;
                added.insert(entry.path_str()?.to_string());
            }

            self.unstage_missing_under(&prefix, &added);
        }

        self.index_mut().write().context("failed to write the index")?;

        Ok(())
    }

    fn relative_to_workspace(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let absolute_path = std::env::current_dir()?.join(path);
        let absolute_path = match absolute_path.canonicalize() {
            Ok(canonical) => canonical,
            // deleted files cannot be canonicalized, their parent usually can
            Err(_) => match (absolute_path.parent(), absolute_path.file_name()) {
                (Some(parent), Some(name)) => parent
                    .canonicalize()
                    .map(|parent| parent.join(name))
                    .unwrap_or(absolute_path.clone()),
                _ => absolute_path.clone(),
            },
        };

        absolute_path
            .strip_prefix(self.path())
            .map(Path::to_path_buf)
            .with_context(|| format!("{} is outside the repository", path.display()))
    }

    fn is_staged_under(&self, prefix: &str) -> bool {
        let nested = format!("{prefix}/");
        self.index()
            .entries()
            .any(|entry| entry.path_str().is_ok_and(|name| name == prefix || name.starts_with(&nested)))
    }

    fn unstage_missing_under(&self, prefix: &str, added: &HashSet<String>) {
        let nested = format!("{prefix}/");
        let mut index = self.index_mut();

        let missing = index
            .entries()
            .filter(|entry| entry.stage() == 0)
            .filter_map(|entry| entry.path_str().ok().map(str::to_string))
            .filter(|name| prefix.is_empty() || name == prefix || name.starts_with(&nested))
            .filter(|name| !added.contains(name))
            .collect::<Vec<_>>();

        for name in missing {
            index.remove(&name, 0);
        }
    }
}
