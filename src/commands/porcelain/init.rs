use crate::areas::repository::Repository;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// `bit init`: create the repository and report where it lives
    pub fn init_with_report(
        path: &Path,
        writer: Box<dyn std::io::Write>,
    ) -> anyhow::Result<Repository> {
        let repository = Repository::init(path)
            .with_context(|| format!("failed to initialize repository in {}", path.display()))?
            .with_writer(writer);

        writeln!(
            repository.writer(),
            "Initialized empty Git repository in {}",
            repository.git_path().display()
        )?;

        Ok(repository)
    }
}
