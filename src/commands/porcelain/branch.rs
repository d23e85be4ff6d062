use crate::areas::repository::Repository;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// `bit branch <name> [<start>]`
    pub fn branch(&self, branch_name: &str, source_revision: Option<&str>) -> anyhow::Result<()> {
        self.create_branch(branch_name, source_revision)?;

        Ok(())
    }

    /// `bit branch`: every branch, the current one starred
    pub fn list_branches(&self) -> anyhow::Result<()> {
        let current = self.current_branch()?;

        for branch in self.branches()? {
            let name = branch.short_name();
            if current.as_ref().is_some_and(|current| current.as_ref() == name) {
                writeln!(self.writer(), "* {}", name.green())?;
            } else {
                writeln!(self.writer(), "  {name}")?;
            }
        }

        Ok(())
    }
}
