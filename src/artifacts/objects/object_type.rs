use crate::errors::{RepositoryError, Result};
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Loose object header: `"<type> <byte-length>\0"`
    pub fn header(&self, content_length: usize) -> String {
        format!("{} {}\0", self.as_str(), content_length)
    }

    /// Parse a loose object header, returning the type and the declared payload length
    pub fn parse_header(data_reader: &mut impl BufRead) -> Result<(ObjectType, usize)> {
        let mut object_type = Vec::new();
        data_reader
            .read_until(b' ', &mut object_type)
            .map_err(RepositoryError::corrupt)?;
        if object_type.pop() != Some(b' ') {
            return Err(RepositoryError::corrupt("missing object type in header"));
        }

        let object_type = std::str::from_utf8(&object_type).map_err(RepositoryError::corrupt)?;
        let object_type = ObjectType::try_from(object_type)?;

        let mut size = Vec::new();
        data_reader
            .read_until(b'\0', &mut size)
            .map_err(RepositoryError::corrupt)?;
        if size.pop() != Some(b'\0') {
            return Err(RepositoryError::corrupt("unterminated object header"));
        }

        let size = std::str::from_utf8(&size)
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .ok_or_else(|| RepositoryError::corrupt("invalid object size in header"))?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = RepositoryError;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            other => Err(RepositoryError::corrupt(format!(
                "invalid object type '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
