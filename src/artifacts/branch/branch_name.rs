use crate::artifacts::branch::{
    HEAD_REF_NAME, HEADS_PREFIX, INVALID_BRANCH_NAME_REGEX, REMOTES_PREFIX, TAGS_PREFIX,
};
use crate::errors::{RepositoryError, Result};
use derive_new::new;

/// Full reference path relative to `.git`, e.g. `refs/heads/master` or `HEAD`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, new)]
pub struct SymRefName(String);

impl SymRefName {
    pub fn head() -> Self {
        SymRefName(HEAD_REF_NAME.to_string())
    }

    pub fn branch(name: &BranchName) -> Self {
        SymRefName(format!("{HEADS_PREFIX}{name}"))
    }

    pub fn tag(name: &BranchName) -> Self {
        SymRefName(format!("{TAGS_PREFIX}{name}"))
    }

    pub fn is_detached_head(&self) -> bool {
        self.0 == HEAD_REF_NAME
    }

    pub fn as_ref_path(&self) -> &str {
        &self.0
    }

    /// Branch name when this is a `refs/heads/*` reference
    pub fn branch_name(&self) -> Option<&str> {
        self.0.strip_prefix(HEADS_PREFIX)
    }

    /// Name without its namespace: `refs/heads/topic` becomes `topic`
    pub fn short_name(&self) -> &str {
        [HEADS_PREFIX, TAGS_PREFIX, REMOTES_PREFIX]
            .iter()
            .find_map(|prefix| self.0.strip_prefix(prefix))
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for SymRefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference name checked against git's ref-format rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        Self::try_parse_as("branch", name)
    }

    /// Validate `name`, reporting failures as an invalid `what` name
    pub fn try_parse_as(what: &'static str, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)?;

        if name.is_empty() || invalid.is_match(&name) {
            return Err(RepositoryError::InvalidName { what, name });
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
