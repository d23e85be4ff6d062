//! Git commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (for history)
//! - Author and committer information
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! Headers this crate does not interpret (`encoding`, `gpgsig`, ...) are kept
//! verbatim so that re-encoding a decoded commit reproduces the same id.

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use crate::errors::{RepositoryError, Result};
use bytes::Bytes;
use std::io::BufRead;

/// Git commit object
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Parent commit IDs (empty for a root commit, several for merges)
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    /// Uninterpreted headers in their original order, continuation lines included
    extra_headers: Vec<(String, String)>,
    message: String,
}

impl Commit {
    pub fn new(
        tree_oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: String,
    ) -> Self {
        Commit {
            tree_oid,
            parents,
            author,
            committer,
            extra_headers: Vec::new(),
            message,
        }
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Commit time in seconds; this is what time-ordered walks sort on
    pub fn timestamp(&self) -> i64 {
        self.committer.time()
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(format!("committer {}", self.committer.display()));
        for (key, value) in &self.extra_headers {
            lines.push(format!("{key} {}", value.replace('\n', "\n ")));
        }

        lines
    }
}

/// Split a commit or tag payload into header `(key, value)` pairs and the message
///
/// Continuation lines (starting with a space) are folded into the previous value.
pub(crate) fn split_headers(content: &str) -> Result<(Vec<(String, String)>, String)> {
    let (head, message) = match content.find("\n\n") {
        Some(split) => (&content[..split], content[split + 2..].to_string()),
        None => (content.trim_end_matches('\n'), String::new()),
    };

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.split('\n') {
        if let Some(continuation) = line.strip_prefix(' ') {
            let (_, value) = headers
                .last_mut()
                .ok_or_else(|| RepositoryError::corrupt("continuation line without a header"))?;
            value.push('\n');
            value.push_str(continuation);
            continue;
        }

        let (key, value) = line
            .split_once(' ')
            .ok_or_else(|| RepositoryError::corrupt(format!("malformed header line '{line}'")))?;
        headers.push((key.to_string(), value.to_string()));
    }

    Ok((headers, message))
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = self.header_lines().join("\n");
        content.push_str("\n\n");
        content.push_str(&self.message);

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|error| RepositoryError::corrupt(format!("commit is not UTF-8: {error}")))?;

        let (headers, message) = split_headers(&content)?;
        let mut headers = headers.into_iter().peekable();

        let tree_oid = match headers.next() {
            Some((key, value)) if key == "tree" => ObjectId::try_parse(&value)
                .map_err(|_| RepositoryError::corrupt("invalid tree id in commit"))?,
            _ => return Err(RepositoryError::corrupt("commit is missing its tree line")),
        };

        let mut parents = Vec::new();
        while let Some((_, value)) = headers.next_if(|(key, _)| key == "parent") {
            parents.push(
                ObjectId::try_parse(&value)
                    .map_err(|_| RepositoryError::corrupt("invalid parent id in commit"))?,
            );
        }

        let author = match headers.next() {
            Some((key, value)) if key == "author" => Signature::try_from(value.as_str())?,
            _ => return Err(RepositoryError::corrupt("commit is missing its author line")),
        };
        let committer = match headers.next() {
            Some((key, value)) if key == "committer" => Signature::try_from(value.as_str())?,
            _ => {
                return Err(RepositoryError::corrupt(
                    "commit is missing its committer line",
                ));
            }
        };

        Ok(Commit {
            tree_oid,
            parents,
            author,
            committer,
            extra_headers: headers.collect(),
            message,
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}
