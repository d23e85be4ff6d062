//! Error kinds surfaced by the repository core
//!
//! Every fallible core operation returns [`Result`]. Expected absence (a missing
//! index entry, an unset reference) is modelled with `Option` instead.

use crate::artifacts::objects::object_type::ObjectType;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// An object id, reference or path does not resolve
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    /// The object exists but is not of the expected variant
    #[error("object {oid} is a {actual}, expected a {expected}")]
    TypeMismatch {
        oid: String,
        expected: ObjectType,
        actual: ObjectType,
    },

    /// Stored bytes do not parse as the variant they claim to be
    #[error("corrupt object {oid}: {reason}")]
    CorruptObject { oid: String, reason: String },

    /// The commit graph or a reference chain violates its structural invariants
    #[error("corrupt graph at {oid}: {reason}")]
    CorruptGraph { oid: String, reason: String },

    /// An index entry is missing a required field
    #[error("invalid index entry {path}: {reason}")]
    InvalidEntry { path: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A human-readable name matched nothing, or more than one object
    #[error("ambiguous argument '{name}': {reason}")]
    AmbiguousOrNotFound { name: String, reason: String },

    /// A tag or branch with the requested name already exists
    #[error("{what} '{name}' already exists")]
    NameConflict { what: &'static str, name: String },

    /// A reference name violates the ref-format rules
    #[error("invalid {what} name: '{name}'")]
    InvalidName { what: &'static str, name: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

impl RepositoryError {
    pub fn not_found(what: &'static str, name: impl ToString) -> Self {
        RepositoryError::NotFound {
            what,
            name: name.to_string(),
        }
    }

    /// Corruption detected while decoding bytes whose id is not known yet
    pub fn corrupt(reason: impl ToString) -> Self {
        RepositoryError::CorruptObject {
            oid: String::from("<unknown>"),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt_graph(oid: impl ToString, reason: impl ToString) -> Self {
        RepositoryError::CorruptGraph {
            oid: oid.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn ambiguous(name: impl ToString, reason: impl ToString) -> Self {
        RepositoryError::AmbiguousOrNotFound {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Attach the offending object id to a corruption raised during decoding
    pub fn for_object(self, oid: impl ToString) -> Self {
        match self {
            RepositoryError::CorruptObject { reason, .. } => RepositoryError::CorruptObject {
                oid: oid.to_string(),
                reason,
            },
            other => other,
        }
    }

    /// True for the kinds a caller cannot recover from locally
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            RepositoryError::CorruptObject { .. } | RepositoryError::CorruptGraph { .. }
        )
    }
}

/// Attach a path or operation description to I/O failures
pub trait IoContext<T> {
    fn io_context<C, F>(self, context: F) -> Result<T>
    where
        C: ToString,
        F: FnOnce() -> C;
}

impl<T> IoContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context<C, F>(self, context: F) -> Result<T>
    where
        C: ToString,
        F: FnOnce() -> C,
    {
        self.map_err(|source| RepositoryError::Io {
            context: context().to_string(),
            source,
        })
    }
}

impl From<std::io::Error> for RepositoryError {
    fn from(source: std::io::Error) -> Self {
        RepositoryError::Io {
            context: String::from("I/O failure"),
            source,
        }
    }
}
