use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    pub fn hash_object(&self, object_path: &Path, write: bool) -> anyhow::Result<()> {
        let content = std::fs::read(object_path)
            .with_context(|| format!("unable to read {}", object_path.display()))?;

        let object_id = if write {
            self.database().put(ObjectType::Blob, &content)?
        } else {
            Repository::hash(ObjectType::Blob, &content)
        };

        writeln!(self.writer(), "{object_id}")?;

        Ok(())
    }
}
