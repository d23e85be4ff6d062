use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::branch::{ANCESTOR_REGEX, PARENT_REGEX, REF_ALIASES};
use crate::artifacts::objects::OBJECT_ID_HEX_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepositoryError, Result};

/// Shortest abbreviated object id accepted
pub const MIN_PREFIX_LENGTH: usize = 4;

/// Places a bare name is looked up, in order
const REF_SEARCH_PATTERNS: [&str; 5] = [
    "{}",
    "refs/{}",
    "refs/tags/{}",
    "refs/heads/{}",
    "refs/remotes/{}",
];

/// A revision expression naming an object.
///
/// Supports multiple formats:
/// - Reference names: `master`, `feature/x`, `v1.0`, `origin/master`, `refs/heads/master`, `HEAD`
/// - Aliases: `@` (resolves to `HEAD`)
/// - Full or abbreviated object ids (4-40 hex characters), used when no reference matches
/// - Parent notation: `<revision>^`
/// - Ancestor notation: `<revision>~<n>`
///
/// # Parsing Strategy
///
/// Id-like strings (e.g. "abc123") parse as `Ref`. During resolution, if no
/// reference with that name exists and the string looks like an object id,
/// the object database is searched by prefix. References win over ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// A reference, or an object id resolved during resolution
    Ref(BranchName),
    /// The Nth first-parent ancestor of a revision (e.g., HEAD~3)
    Ancestor(Box<Revision>, usize),
    /// The first parent of a revision (e.g., HEAD^)
    Parent(Box<Revision>),
}

impl Revision {
    pub fn try_parse(revision: &str) -> Result<Revision> {
        let invalid = || RepositoryError::ambiguous(revision, "not a valid revision");

        if let Some(caps) = regex::Regex::new(PARENT_REGEX)?.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Parent(Box::new(base_revision)))
        } else if let Some(caps) = regex::Regex::new(ANCESTOR_REGEX)?.captures(revision) {
            let generations: usize = caps[2].parse().map_err(|_| invalid())?;
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Ancestor(Box::new(base_revision), generations))
        } else {
            let resolved_name = *REF_ALIASES.get(revision).unwrap_or(&revision);
            let branch_name = BranchName::try_parse_as("revision", resolved_name).map_err(|error| match error {
                RepositoryError::InvalidName { .. } => invalid(),
                other => other,
            })?;

            Ok(Revision::Ref(branch_name))
        }
    }

    /// Object id this revision names
    ///
    /// `^` and `~n` peel annotated tags and follow first parents; walking past
    /// a root commit is an error.
    pub fn resolve(&self, repository: &Repository) -> Result<ObjectId> {
        match self {
            Revision::Ref(name) => Self::resolve_name(name.as_ref(), repository),
            Revision::Parent(base_revision) => {
                let oid = base_revision.resolve(repository)?;
                Self::resolve_commit_parent(oid, repository)
            }
            Revision::Ancestor(base_revision, generations) => {
                let mut oid = base_revision.resolve(repository)?;
                for _ in 0..*generations {
                    oid = Self::resolve_commit_parent(oid, repository)?;
                }

                Ok(oid)
            }
        }
    }

    fn resolve_name(name: &str, repository: &Repository) -> Result<ObjectId> {
        for pattern in REF_SEARCH_PATTERNS {
            let candidate = SymRefName::new(pattern.replace("{}", name));
            if !repository.refs().exists(&candidate) {
                continue;
            }

            return repository.refs().read_ref(&candidate)?.ok_or_else(|| {
                RepositoryError::ambiguous(name, "reference does not point at a commit yet")
            });
        }

        if Self::looks_like_oid(name) {
            return Self::resolve_oid(name, repository);
        }

        Err(RepositoryError::ambiguous(
            name,
            "unknown revision or path not in the working tree",
        ))
    }

    fn resolve_commit_parent(oid: ObjectId, repository: &Repository) -> Result<ObjectId> {
        let (commit_oid, commit) = repository.peel_to_commit(&oid)?;

        commit
            .parent()
            .copied()
            .ok_or_else(|| RepositoryError::ambiguous(commit_oid, "commit has no parent"))
    }

    fn resolve_oid(oid_str: &str, repository: &Repository) -> Result<ObjectId> {
        if oid_str.len() == OBJECT_ID_HEX_LENGTH {
            let oid = ObjectId::try_parse(&oid_str.to_ascii_lowercase())?;
            if repository.database().contains(&oid) {
                return Ok(oid);
            }
        }

        let matches = repository.database().find_objects_by_prefix(oid_str)?;

        match matches.as_slice() {
            [] => Err(RepositoryError::ambiguous(
                oid_str,
                "unknown revision or path not in the working tree",
            )),
            [oid] => Ok(*oid),
            candidates => {
                let hints = candidates
                    .iter()
                    .map(|oid| {
                        let kind = repository
                            .database()
                            .read_header(oid)
                            .map(|kind| kind.to_string())
                            .unwrap_or_else(|_| String::from("unknown"));
                        format!("{} {kind}", oid.to_short_oid())
                    })
                    .collect::<Vec<_>>();

                Err(RepositoryError::ambiguous(
                    oid_str,
                    format!("short object id is ambiguous, candidates: {}", hints.join(", ")),
                ))
            }
        }
    }

    fn looks_like_oid(s: &str) -> bool {
        s.len() >= MIN_PREFIX_LENGTH && ObjectId::is_hex_prefix(s)
    }
}
