use crate::areas::repository::Repository;
use crate::artifacts::objects::signature::{Signature, SignatureRole};
use anyhow::Context;
use std::io::Write;

impl Repository {
    pub fn commit(&self, message: &str) -> anyhow::Result<()> {
        let message = message.trim();
        if message.is_empty() {
            anyhow::bail!("aborting commit due to empty commit message");
        }

        let author = Signature::load_from_env(SignatureRole::Author)
            .context("set GIT_AUTHOR_NAME and GIT_AUTHOR_EMAIL to commit")?;
        let committer = Signature::load_from_env(SignatureRole::Committer)
            .context("set GIT_COMMITTER_NAME and GIT_COMMITTER_EMAIL to commit")?;

        let is_root = self.is_empty()?;
        let commit_id = self.commit_index(&format!("{message}\n"), author, committer)?;

        let branch = self
            .current_branch()?
            .map(|branch| branch.to_string())
            .unwrap_or_else(|| String::from("detached HEAD"));
        let root_marker = if is_root { " (root-commit)" } else { "" };
        let summary = message.lines().next().unwrap_or_default();

        writeln!(
            self.writer(),
            "[{branch}{root_marker} {}] {summary}",
            commit_id.to_short_oid()
        )?;

        Ok(())
    }
}
