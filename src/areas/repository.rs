//! Repository facade
//!
//! [`Repository`] owns one object database, one index, the references and the
//! working tree. Every consumer (the `bit` binary included) goes through its
//! lookup, resolve and create operations, or through a [`RevList`] it hands out.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::DEFAULT_BRANCH;
use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::log::rev_list::{RevList, SortFlags, WalkedCommit};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{IoContext, RepositoryError, Result};
use std::cell::{Ref, RefCell, RefMut};
use std::path::Path;
use tracing::{debug, info, warn};

const GIT_DIR: &str = ".git";

/// Annotated tags pointing at annotated tags are followed at most this far
const MAX_PEEL_DEPTH: usize = 32;

pub struct Repository {
    path: Box<Path>,
    git_path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    fn new(path: &Path) -> Result<Self> {
        let path = path
            .canonicalize()
            .io_context(|| format!("unable to resolve {}", path.display()))?;
        let git_path = path.join(GIT_DIR);

        Ok(Repository {
            index: RefCell::new(Index::new(git_path.join("index").into_boxed_path())),
            database: Database::new(git_path.join("objects").into_boxed_path()),
            workspace: Workspace::new(path.clone().into_boxed_path()),
            refs: Refs::new(git_path.clone().into_boxed_path()),
            writer: RefCell::new(Box::new(std::io::sink())),
            git_path: git_path.into_boxed_path(),
            path: path.into_boxed_path(),
        })
    }

    /// Create an empty repository at `path`; HEAD points at the unborn default branch
    ///
    /// Running it on an existing repository leaves objects and references alone.
    pub fn init(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .io_context(|| format!("unable to create {}", path.display()))?;
        let repository = Self::new(path)?;

        for dir in [
            repository.database.objects_path().to_path_buf(),
            repository.refs.heads_path().to_path_buf(),
            repository.refs.refs_path().join("tags"),
        ] {
            std::fs::create_dir_all(&dir)
                .io_context(|| format!("unable to create {}", dir.display()))?;
        }

        if !repository.refs.exists(&SymRefName::head()) {
            let default_branch = BranchName::try_parse(DEFAULT_BRANCH)?;
            repository
                .refs
                .set_symbolic(&SymRefName::head(), &SymRefName::branch(&default_branch))?;
        }

        info!(path = %repository.path.display(), "initialized repository");
        Ok(repository)
    }

    /// Open the repository whose work tree is `path`; the index is loaded from disk
    pub fn open(path: &Path) -> Result<Self> {
        let repository = Self::new(path)?;
        if !repository.git_path.is_dir() {
            return Err(RepositoryError::not_found(
                "repository",
                repository.path.display(),
            ));
        }

        repository.index.borrow_mut().load()?;
        Ok(repository)
    }

    /// Send command output to `writer` instead of discarding it
    pub fn with_writer(mut self, writer: Box<dyn std::io::Write>) -> Self {
        self.writer = RefCell::new(writer);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_path(&self) -> &Path {
        &self.git_path
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    /// Shared view of the staging index. Any number of these may be alive,
    /// including across `write_tree`.
    pub fn index(&self) -> Ref<'_, Index> {
        self.index.borrow()
    }

    /// Exclusive access to the staging index.
    ///
    /// Drop the guard before calling `add_file`, `add_entry`, `write_tree`
    /// or `commit_index`: they borrow the index themselves and panic on a
    /// second borrow.
    pub fn index_mut(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Id `content` would be stored under, without storing it
    pub fn hash(object_type: ObjectType, content: &[u8]) -> ObjectId {
        Database::hash(object_type, content)
    }

    /// Decode a stored object, optionally insisting on its type
    pub fn lookup(&self, oid: &ObjectId, expected: Option<ObjectType>) -> Result<ObjectBox> {
        match expected {
            Some(expected) => self.database.parse_object_as(oid, expected),
            None => self.database.parse_object(oid),
        }
    }

    /// Object id named by a revision expression (`master`, `v1.0`, `HEAD~2`, `abc1234`, ...)
    pub fn resolve(&self, name: &str) -> Result<ObjectId> {
        Revision::try_parse(name)?.resolve(self)
    }

    /// The commit `oid` names, following annotated tags
    pub fn peel_to_commit(&self, oid: &ObjectId) -> Result<(ObjectId, Commit)> {
        let mut current = *oid;

        for _ in 0..MAX_PEEL_DEPTH {
            match self.database.parse_object(&current)? {
                ObjectBox::Commit(commit) => return Ok((current, *commit)),
                ObjectBox::Tag(tag) => current = *tag.target(),
                other => {
                    return Err(RepositoryError::TypeMismatch {
                        oid: current.to_string(),
                        expected: ObjectType::Commit,
                        actual: other.object_type(),
                    });
                }
            }
        }

        Err(RepositoryError::corrupt_graph(
            oid,
            format!("tag chain deeper than {MAX_PEEL_DEPTH}"),
        ))
    }

    /// Store a commit and optionally advance `update_ref` to it
    ///
    /// The tree and every parent are checked before anything is written. When
    /// the reference update fails the commit stays in the database, unreferenced.
    pub fn create_commit(
        &self,
        tree_oid: &ObjectId,
        parents: &[ObjectId],
        author: Signature,
        committer: Signature,
        message: &str,
        update_ref: Option<&SymRefName>,
    ) -> Result<ObjectId> {
        self.expect_stored_type(tree_oid, ObjectType::Tree)?;
        for parent in parents {
            self.expect_stored_type(parent, ObjectType::Commit)?;
        }

        let commit = Commit::new(
            *tree_oid,
            parents.to_vec(),
            author,
            committer,
            message.to_string(),
        );
        let commit_oid = self.database.store(&commit)?;
        debug!(oid = %commit_oid, parents = parents.len(), "created commit");

        if let Some(reference) = update_ref
            && let Err(error) = self.refs.update_ref(reference, commit_oid)
        {
            warn!(oid = %commit_oid, %reference, %error, "commit stored but reference not updated");
            return Err(error);
        }

        Ok(commit_oid)
    }

    /// Store an annotated tag for `target` and create `refs/tags/<name>` for it
    pub fn create_tag(
        &self,
        name: &str,
        target: &ObjectId,
        tagger: Option<Signature>,
        message: &str,
    ) -> Result<ObjectId> {
        let tag_name = BranchName::try_parse_as("tag", name)?;
        let tag_ref = SymRefName::tag(&tag_name);
        if self.refs.exists(&tag_ref) {
            return Err(RepositoryError::NameConflict {
                what: "tag",
                name: name.to_string(),
            });
        }

        let target_type = self.database.read_header(target)?;
        let tag = Tag::new(
            *target,
            target_type,
            name.to_string(),
            tagger,
            message.to_string(),
        );
        let tag_oid = self.database.store(&tag)?;

        if let Err(error) = self.refs.create_ref(&tag_ref, tag_oid, "tag") {
            warn!(oid = %tag_oid, reference = %tag_ref, %error, "tag stored but reference not created");
            return Err(error);
        }

        debug!(oid = %tag_oid, %target, "created tag");
        Ok(tag_oid)
    }

    /// Create `refs/heads/<name>` at `from_revision`, or at HEAD when none is given
    pub fn create_branch(&self, name: &str, from_revision: Option<&str>) -> Result<ObjectId> {
        let branch_name = BranchName::try_parse(name)?;

        let start = match from_revision {
            Some(revision) => self.resolve(revision)?,
            None => self.head()?.ok_or_else(|| {
                RepositoryError::ambiguous("HEAD", "no commit to branch from yet")
            })?,
        };
        let (commit_oid, _) = self.peel_to_commit(&start)?;

        self.refs.create_branch(&branch_name, commit_oid)?;
        Ok(commit_oid)
    }

    pub fn branches(&self) -> Result<Vec<SymRefName>> {
        self.refs.list_branches()
    }

    pub fn tags(&self) -> Result<Vec<SymRefName>> {
        self.refs.list_tags()
    }

    /// HEAD followed by every reference under `refs/`, sorted by name
    pub fn references(&self) -> Result<Vec<SymRefName>> {
        self.refs.list_all_refs()
    }

    /// Commit HEAD resolves to; `None` before the first commit
    pub fn head(&self) -> Result<Option<ObjectId>> {
        self.refs.read_head()
    }

    /// Branch HEAD points at; `None` when HEAD is detached
    pub fn current_branch(&self) -> Result<Option<BranchName>> {
        let current = self.refs.current_ref(None)?;

        current
            .branch_name()
            .map(BranchName::try_parse)
            .transpose()
    }

    /// Whether HEAD has no commit yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.head()?.is_none())
    }

    /// A fresh walker over this repository's commit graph
    pub fn walker(&self) -> RevList<'_> {
        RevList::new(self)
    }

    /// Walk starting at `revision` in the given order
    pub fn commits_from(&self, revision: &str, sorting: SortFlags) -> Result<RevList<'_>> {
        let oid = self.resolve(revision)?;

        let mut walker = self.walker();
        walker.set_sorting(sorting)?;
        walker.push(&oid)?;

        Ok(walker)
    }

    pub fn commit_count_in_current_branch(&self) -> Result<usize> {
        match self.head()? {
            Some(head) => self.walker().count_from(&head),
            None => Ok(0),
        }
    }

    /// Commits on the current branch that its `origin` remote-tracking branch lacks
    ///
    /// Without a remote-tracking branch (or with a detached HEAD) every commit
    /// reachable from HEAD is local.
    pub fn local_commits(&self) -> Result<Vec<WalkedCommit>> {
        let Some(head) = self.head()? else {
            return Ok(Vec::new());
        };

        let mut walker = self.walker();
        walker.push(&head)?;

        if let Some(branch) = self.current_branch()? {
            let upstream = SymRefName::new(format!("refs/remotes/origin/{branch}"));
            if let Some(upstream_oid) = self.refs.read_ref(&upstream)? {
                walker.hide(&upstream_oid)?;
            }
        }

        walker.collect()
    }

    /// Hash a work-tree file into the database and stage it
    pub fn add_file(&self, path: &Path) -> Result<IndexEntry> {
        self.index
            .borrow_mut()
            .add_file(&self.workspace, &self.database, path)
    }

    /// Stage an entry whose blob must already be stored
    pub fn add_entry(&self, entry: IndexEntry) -> Result<()> {
        if !self.database.contains(&entry.oid) {
            return Err(RepositoryError::InvalidEntry {
                path: entry.name.display().to_string(),
                reason: format!("blob {} is not in the object database", entry.oid),
            });
        }

        self.index.borrow_mut().add_entry(entry)
    }

    /// Store the staged entries as nested trees and return the root tree id
    pub fn write_tree(&self) -> Result<ObjectId> {
        let index: Ref<'_, Index> = self.index.borrow();
        let mut store = |tree: &Tree| self.database.store(tree);

        Tree::build(index.entries(), &mut store)
    }

    /// Commit the staged snapshot on top of HEAD and advance HEAD
    pub fn commit_index(
        &self,
        message: &str,
        author: Signature,
        committer: Signature,
    ) -> Result<ObjectId> {
        let tree_oid = self.write_tree()?;
        let parents = self.head()?.into_iter().collect::<Vec<_>>();

        self.create_commit(
            &tree_oid,
            &parents,
            author,
            committer,
            message,
            Some(&SymRefName::head()),
        )
    }

    fn expect_stored_type(&self, oid: &ObjectId, expected: ObjectType) -> Result<()> {
        let actual = self.database.read_header(oid)?;
        if actual != expected {
            return Err(RepositoryError::TypeMismatch {
                oid: oid.to_string(),
                expected,
                actual,
            });
        }

        Ok(())
    }
}
