use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use std::io::Write;

/// What `cat-file` prints for an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFileOutput {
    /// `-t`: the object type
    Type,
    /// `-p`: human-readable content, trees listed one entry per line
    Pretty,
    /// The stored payload, byte for byte
    Raw,
}

impl Repository {
    /// Print the object `revision` names
    pub fn cat_file(&self, revision: &str, output: CatFileOutput) -> anyhow::Result<()> {
        let object_id = self.resolve(revision)?;

        match output {
            CatFileOutput::Type => {
                let object_type = self.database().read_header(&object_id)?;
                writeln!(self.writer(), "{object_type}")?;
            }
            CatFileOutput::Raw => {
                let (_, content) = self.database().get(&object_id)?;
                self.writer().write_all(&content)?;
            }
            CatFileOutput::Pretty => {
                let object = self.lookup(&object_id, None)?;
                let content = object.display();
                write!(self.writer(), "{content}")?;
                if object.object_type() != ObjectType::Blob && !content.ends_with('\n') {
                    writeln!(self.writer())?;
                }
            }
        }

        Ok(())
    }
}
