use crate::areas::repository::Repository;
use crate::artifacts::objects::signature::{Signature, SignatureRole};
use std::io::Write;

impl Repository {
    /// `bit tag <name> [<target>] -m <message>`; the target defaults to HEAD
    pub fn tag(&self, tag_name: &str, target: Option<&str>, message: &str) -> anyhow::Result<()> {
        let target = self.resolve(target.unwrap_or("HEAD"))?;
        let tagger = Signature::load_from_env(SignatureRole::Committer).ok();

        self.create_tag(tag_name, &target, tagger, &format!("{}\n", message.trim()))?;

        Ok(())
    }

    /// `bit tag`: every tag name
    pub fn list_tags(&self) -> anyhow::Result<()> {
        for tag in self.tags()? {
            writeln!(self.writer(), "{}", tag.short_name())?;
        }

        Ok(())
    }
}
