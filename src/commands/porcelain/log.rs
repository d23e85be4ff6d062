use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::SymRefName;
use crate::artifacts::branch::{HEADS_PREFIX, REMOTES_PREFIX, TAGS_PREFIX};
use crate::artifacts::log::rev_list::{SortFlags, WalkedCommit};
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CommitDisplayFormat {
    #[default]
    Medium,
    #[value(name = "oneline")]
    OneLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CommitDecoration {
    Short,
    Full,
    #[default]
    #[value(name = "no")]
    None,
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub oneline: bool,
    pub abbrev_commit: bool,
    pub format: CommitDisplayFormat,
    pub decorate: CommitDecoration,
    pub sorting: SortFlags,
}

/// Commit id to the references pointing at it, tags peeled to their commit
type ReverseRefs = HashMap<ObjectId, Vec<SymRefName>>;

impl Repository {
    /// `bit log [<rev>...] [^<rev>...]`
    pub fn log(&self, revisions: &[String], opts: &LogOptions) -> anyhow::Result<()> {
        let (format, abbrev_commit) = if opts.oneline {
            (CommitDisplayFormat::OneLine, true)
        } else {
            (opts.format, opts.abbrev_commit)
        };

        let reverse_refs = match opts.decorate {
            CommitDecoration::None => ReverseRefs::new(),
            _ => self.reverse_refs()?,
        };
        let current_ref = self.refs().current_ref(None)?;

        for (position, walked) in self.walker_for(revisions, opts.sorting)?.enumerate() {
            let walked = walked?;
            let decoration =
                Self::commit_decoration(&walked.oid, &reverse_refs, &current_ref, opts.decorate);

            match format {
                CommitDisplayFormat::Medium => {
                    if position > 0 {
                        writeln!(self.writer())?;
                    }
                    self.show_commit_medium(&walked, abbrev_commit, &decoration)?;
                }
                CommitDisplayFormat::OneLine => {
                    self.show_commit_oneline(&walked, abbrev_commit, &decoration)?;
                }
            }
        }

        Ok(())
    }

    fn show_commit_medium(
        &self,
        walked: &WalkedCommit,
        abbrev_commit: bool,
        decoration: &str,
    ) -> anyhow::Result<()> {
        let author = walked.commit.author();

        writeln!(
            self.writer(),
            "{}{decoration}",
            format!("commit {}", Self::abbrev_commit_id(&walked.oid, abbrev_commit)).yellow()
        )?;
        if walked.commit.parents().len() > 1 {
            let parents = walked
                .commit
                .parents()
                .iter()
                .map(ObjectId::to_short_oid)
                .collect::<Vec<_>>();
            writeln!(self.writer(), "Merge: {}", parents.join(" "))?;
        }
        writeln!(self.writer(), "Author: {}", author.display_name())?;
        writeln!(self.writer(), "Date:   {}", author.readable_timestamp())?;
        writeln!(self.writer())?;
        for message_line in walked.commit.message().lines() {
            writeln!(self.writer(), "    {message_line}")?;
        }

        Ok(())
    }

    fn show_commit_oneline(
        &self,
        walked: &WalkedCommit,
        abbrev_commit: bool,
        decoration: &str,
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{decoration} {}",
            Self::abbrev_commit_id(&walked.oid, abbrev_commit).yellow(),
            walked.commit.summary()
        )?;

        Ok(())
    }

    fn reverse_refs(&self) -> anyhow::Result<ReverseRefs> {
        let mut reverse_refs = ReverseRefs::new();

        for reference in self.references()? {
            let Some(oid) = self.refs().read_ref(&reference)? else {
                continue;
            };
            let target = self
                .peel_to_commit(&oid)
                .map(|(commit_oid, _)| commit_oid)
                .unwrap_or(oid);

            reverse_refs.entry(target).or_default().push(reference);
        }

        Ok(reverse_refs)
    }

    fn commit_decoration(
        oid: &ObjectId,
        reverse_refs: &ReverseRefs,
        current_ref: &SymRefName,
        decoration: CommitDecoration,
    ) -> String {
        if decoration == CommitDecoration::None {
            return String::new();
        }
        let Some(ref_names) = reverse_refs.get(oid) else {
            return String::new();
        };

        // an attached HEAD is shown next to its branch instead of on its own
        let head_attached = !current_ref.is_detached_head();
        let names = ref_names
            .iter()
            .filter(|ref_name| !(ref_name.is_detached_head() && head_attached))
            .map(|ref_name| {
                let label = Self::ref_label(ref_name, decoration);
                let label = Self::colored_ref_name(ref_name, label);

                if head_attached
                    && ref_name == current_ref
                    && ref_names.iter().any(SymRefName::is_detached_head)
                {
                    format!("{} {label}", "HEAD ->".cyan().bold())
                } else {
                    label
                }
            })
            .collect::<Vec<_>>();

        if names.is_empty() {
            return String::new();
        }

        format!(
            " {}{}{}",
            "(".yellow(),
            names.join(&", ".yellow().to_string()),
            ")".yellow()
        )
    }

    fn ref_label(ref_name: &SymRefName, decoration: CommitDecoration) -> String {
        match decoration {
            CommitDecoration::Full => ref_name.as_ref_path().to_string(),
            _ => ref_name.short_name().to_string(),
        }
    }

    fn colored_ref_name(ref_name: &SymRefName, label: String) -> String {
        let path = ref_name.as_ref_path();

        if ref_name.is_detached_head() {
            label.cyan().bold().to_string()
        } else if path.starts_with(HEADS_PREFIX) {
            label.green().bold().to_string()
        } else if path.starts_with(TAGS_PREFIX) {
            format!("tag: {label}").yellow().bold().to_string()
        } else if path.starts_with(REMOTES_PREFIX) {
            label.red().bold().to_string()
        } else {
            label
        }
    }

    fn abbrev_commit_id(oid: &ObjectId, abbrev_commit: bool) -> String {
        if abbrev_commit {
            oid.to_short_oid()
        } else {
            oid.to_string()
        }
    }
}
