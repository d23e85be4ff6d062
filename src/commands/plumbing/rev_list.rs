use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::{RevList, SortFlags};
use std::io::Write;

/// Prefix marking a revision whose history is excluded
const EXCLUDE_PREFIX: char = '^';

impl Repository {
    /// Walker pushed at every revision and hiding every `^revision`
    ///
    /// With no pushed revision the walk starts at HEAD; an unborn HEAD yields
    /// an empty walk.
    pub fn walker_for(
        &self,
        revisions: &[String],
        sorting: SortFlags,
    ) -> anyhow::Result<RevList<'_>> {
        let mut walker = self.walker();
        walker.set_sorting(sorting)?;

        let (excluded, included): (Vec<_>, Vec<_>) = revisions
            .iter()
            .partition(|revision| revision.len() > 1 && revision.starts_with(EXCLUDE_PREFIX));

        for revision in &included {
            walker.push(&self.resolve(revision)?)?;
        }
        if included.is_empty()
            && let Some(head) = self.head()?
        {
            walker.push(&head)?;
        }

        for revision in excluded {
            walker.hide(&self.resolve(&revision[EXCLUDE_PREFIX.len_utf8()..])?)?;
        }

        Ok(walker)
    }

    pub fn rev_list(
        &self,
        revisions: &[String],
        sorting: SortFlags,
        count: bool,
    ) -> anyhow::Result<()> {
        let mut walker = self.walker_for(revisions, sorting)?;

        if count {
            let total = walker.try_fold(0usize, |total, walked| walked.map(|_| total + 1))?;
            writeln!(self.writer(), "{total}")?;
            return Ok(());
        }

        for walked in walker {
            writeln!(self.writer(), "{}", walked?.oid)?;
        }

        Ok(())
    }
}
