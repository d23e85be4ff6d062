//! Revision walker
//!
//! [`RevList`] walks the commit graph from a set of pushed commits, never
//! emitting a hidden commit or any ancestor of one.
//!
//! ## Algorithm
//!
//! Pending commits sit in a binary heap. Without [`SortFlags::TIME`] the heap
//! key is only the insertion sequence, which makes it a FIFO and the walk
//! breadth-first; with it, the commit time comes first and the sequence breaks
//! ties. These two orders are produced incrementally, one commit per `next()`.
//!
//! [`SortFlags::TOPOLOGICAL`] and [`SortFlags::REVERSE`] need the whole
//! reachable set, so the first `next()` materialises it:
//! - topological order counts, for every commit, its children inside the set
//!   and only releases a commit once that count drops to zero
//! - reverse order is the base order collected and flipped
//!
//! The hidden set is expanded to every ancestor of the hidden commits before
//! the next emission after a `hide()`. Commits already emitted stay emitted.
//!
//! A walker is bound to one repository and is not meant to be shared between
//! threads; create one walker per traversal instead.

use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepositoryError, Result};
use bitflags::bitflags;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use tracing::{debug, trace};

bitflags! {
    /// Order in which the walker emits commits; flags compose
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SortFlags: u8 {
        /// Breadth-first in the order commits entered the frontier
        const NONE = 0;
        /// No commit is emitted before one of its descendants
        const TOPOLOGICAL = 0b001;
        /// Newest committer time first
        const TIME = 0b010;
        /// Flip whatever order the other flags produce
        const REVERSE = 0b100;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    struct CommitFlags: u8 {
        /// Entered the frontier
        const SEEN = 0b01;
        /// Handed to the caller
        const EMITTED = 0b10;
    }
}

/// One commit produced by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedCommit {
    pub oid: ObjectId,
    pub commit: Commit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCommit {
    /// Zero unless sorting by time
    time: i64,
    sequence: u64,
    oid: ObjectId,
}

impl Ord for PendingCommit {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap: newest first, then earliest inserted
        self.time
            .cmp(&other.time)
            .then_with(|| Reverse(self.sequence).cmp(&Reverse(other.sequence)))
    }
}

impl PartialOrd for PendingCommit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct RevList<'r> {
    repository: &'r Repository,
    sorting: SortFlags,
    /// Pushed commits, in push order
    starts: Vec<ObjectId>,
    hidden_roots: Vec<ObjectId>,
    /// Hidden commits and all their ancestors
    hidden: HashSet<ObjectId>,
    hidden_dirty: bool,
    flags: HashMap<ObjectId, CommitFlags>,
    pending: BinaryHeap<PendingCommit>,
    sequence: u64,
    /// Precomputed output for topological and reverse walks
    materialized: Option<VecDeque<WalkedCommit>>,
    commits: HashMap<ObjectId, Commit>,
}

impl<'r> RevList<'r> {
    pub fn new(repository: &'r Repository) -> Self {
        RevList {
            repository,
            sorting: SortFlags::NONE,
            starts: Vec::new(),
            hidden_roots: Vec::new(),
            hidden: HashSet::new(),
            hidden_dirty: false,
            flags: HashMap::new(),
            pending: BinaryHeap::new(),
            sequence: 0,
            materialized: None,
            commits: HashMap::new(),
        }
    }

    pub fn sorting(&self) -> SortFlags {
        self.sorting
    }

    /// Change the order and restart the walk from the pushed commits
    ///
    /// Pushed and hidden commits are kept; everything already emitted will be
    /// emitted again in the new order.
    pub fn set_sorting(&mut self, sorting: SortFlags) -> Result<()> {
        self.sorting = sorting;
        self.flags.clear();
        self.pending.clear();
        self.materialized = None;
        self.sequence = 0;

        for oid in self.starts.clone() {
            self.enqueue(oid)?;
        }

        Ok(())
    }

    /// Start the walk at `oid`; annotated tags are peeled to their commit
    ///
    /// Fails with `NotFound` if `oid` does not lead to a commit. Pushing the
    /// same commit twice has no further effect.
    pub fn push(&mut self, oid: &ObjectId) -> Result<()> {
        let oid = self.peel(oid)?;

        if !self.starts.contains(&oid) {
            self.starts.push(oid);
        }
        self.enqueue(oid)?;
        // a materialised walk is recomputed to include the new tip
        self.materialized = None;

        debug!(%oid, "pushed commit");
        Ok(())
    }

    /// Suppress `oid` and all of its ancestors from the rest of the walk
    pub fn hide(&mut self, oid: &ObjectId) -> Result<()> {
        let oid = self.peel(oid)?;

        if !self.hidden_roots.contains(&oid) {
            self.hidden_roots.push(oid);
            self.hidden_dirty = true;
        }

        debug!(%oid, "hid commit");
        Ok(())
    }

    /// Forget pushed, hidden and visited commits; the sort order is kept
    pub fn reset(&mut self) {
        self.starts.clear();
        self.hidden_roots.clear();
        self.hidden.clear();
        self.hidden_dirty = false;
        self.flags.clear();
        self.pending.clear();
        self.sequence = 0;
        self.materialized = None;
    }

    /// Number of commits reachable from `oid`, ignoring this walker's state
    pub fn count_from(&self, oid: &ObjectId) -> Result<usize> {
        let mut walker = RevList::new(self.repository);
        walker.push(oid)?;

        walker.try_fold(0, |count, commit| commit.map(|_| count + 1))
    }

    fn peel(&mut self, oid: &ObjectId) -> Result<ObjectId> {
        match self.repository.peel_to_commit(oid) {
            Ok((oid, commit)) => {
                self.commits.entry(oid).or_insert(commit);
                Ok(oid)
            }
            Err(RepositoryError::TypeMismatch { oid, .. }) => {
                Err(RepositoryError::not_found("commit", oid))
            }
            Err(error) => Err(error),
        }
    }

    fn load(&mut self, oid: &ObjectId) -> Result<&Commit> {
        if !self.commits.contains_key(oid) {
            let commit = self.repository.database().parse_object_as_commit(oid)?;
            self.commits.insert(*oid, commit);
        }

        self.commits
            .get(oid)
            .ok_or_else(|| RepositoryError::not_found("commit", oid))
    }

    fn flags_of(&self, oid: &ObjectId) -> CommitFlags {
        self.flags.get(oid).copied().unwrap_or_default()
    }

    fn enqueue(&mut self, oid: ObjectId) -> Result<()> {
        if self.flags_of(&oid).contains(CommitFlags::SEEN) {
            return Ok(());
        }
        self.flags.entry(oid).or_default().insert(CommitFlags::SEEN);

        let pending = self.pending_entry(oid)?;
        self.pending.push(pending);

        Ok(())
    }

    /// Frontier entry for `oid` keyed for the configured order
    fn pending_entry(&mut self, oid: ObjectId) -> Result<PendingCommit> {
        let time = if self.sorting.contains(SortFlags::TIME) {
            self.load(&oid)?.timestamp()
        } else {
            0
        };
        self.sequence += 1;

        Ok(PendingCommit {
            time,
            sequence: self.sequence,
            oid,
        })
    }

    /// Grow the hidden set to cover every ancestor of the hidden commits
    fn expand_hidden(&mut self) -> Result<()> {
        if !self.hidden_dirty {
            return Ok(());
        }

        let mut queue = self
            .hidden_roots
            .iter()
            .copied()
            .filter(|oid| !self.hidden.contains(oid))
            .collect::<VecDeque<_>>();

        while let Some(oid) = queue.pop_front() {
            if !self.hidden.insert(oid) {
                continue;
            }

            let parents = self.load(&oid)?.parents().to_vec();
            queue.extend(parents.into_iter().filter(|parent| !self.hidden.contains(parent)));
        }

        self.hidden_dirty = false;
        trace!(hidden = self.hidden.len(), "expanded hidden set");
        Ok(())
    }

    /// Next commit in insertion or time order, expanding the frontier
    fn next_incremental(&mut self) -> Option<Result<WalkedCommit>> {
        while let Some(PendingCommit { oid, .. }) = self.pending.pop() {
            if self.hidden.contains(&oid) || self.flags_of(&oid).contains(CommitFlags::EMITTED) {
                continue;
            }

            let commit = match self.load(&oid) {
                Ok(commit) => commit.clone(),
                Err(error) => return Some(Err(error)),
            };
            self.flags.entry(oid).or_default().insert(CommitFlags::EMITTED);

            for parent in commit.parents() {
                if self.hidden.contains(parent) {
                    continue;
                }
                if let Err(error) = self.enqueue(*parent) {
                    return Some(Err(error));
                }
            }

            return Some(Ok(WalkedCommit { oid, commit }));
        }

        None
    }

    fn materialize(&mut self) -> Result<VecDeque<WalkedCommit>> {
        let mut sequence = if self.sorting.contains(SortFlags::TOPOLOGICAL) {
            self.topological_order()?
        } else {
            self.frontier_order()?
        };

        if self.sorting.contains(SortFlags::REVERSE) {
            sequence.make_contiguous().reverse();
        }

        debug!(commits = sequence.len(), sorting = ?self.sorting, "materialized walk");
        Ok(sequence)
    }

    /// The incremental order computed in one pass over a private frontier
    ///
    /// Emitted commits are walked through but left out; nothing is marked.
    fn frontier_order(&mut self) -> Result<VecDeque<WalkedCommit>> {
        let mut frontier = BinaryHeap::new();
        let mut discovered = HashSet::new();
        for oid in self.starts.clone() {
            if !self.hidden.contains(&oid) && discovered.insert(oid) {
                frontier.push(self.pending_entry(oid)?);
            }
        }

        let mut sequence = VecDeque::new();
        while let Some(PendingCommit { oid, .. }) = frontier.pop() {
            let commit = self.load(&oid)?.clone();

            for parent in commit.parents() {
                if !self.hidden.contains(parent) && discovered.insert(*parent) {
                    frontier.push(self.pending_entry(*parent)?);
                }
            }

            if !self.flags_of(&oid).contains(CommitFlags::EMITTED) {
                sequence.push_back(WalkedCommit { oid, commit });
            }
        }

        Ok(sequence)
    }

    /// Kahn's algorithm over the commits reachable from the pushed tips
    fn topological_order(&mut self) -> Result<VecDeque<WalkedCommit>> {
        let reachable = self.collect_reachable()?;

        let mut in_degree = reachable
            .iter()
            .map(|oid| (*oid, 0usize))
            .collect::<HashMap<_, _>>();
        for oid in &reachable {
            for parent in self.load(oid)?.parents().to_vec() {
                if let Some(degree) = in_degree.get_mut(&parent) {
                    *degree += 1;
                }
            }
        }

        let mut ready = ReadySet::new(self.sorting.contains(SortFlags::TIME));
        let tips = reachable
            .iter()
            .copied()
            .filter(|oid| in_degree.get(oid) == Some(&0))
            .collect::<Vec<_>>();
        self.release(&mut ready, tips)?;

        let mut sequence = VecDeque::with_capacity(reachable.len());
        while let Some(oid) = ready.pop() {
            let commit = self.load(&oid)?.clone();

            let mut released = Vec::new();
            for parent in commit.parents() {
                let Some(degree) = in_degree.get_mut(parent) else {
                    continue;
                };
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    released.push(*parent);
                }
            }
            self.release(&mut ready, released)?;

            sequence.push_back(WalkedCommit { oid, commit });
        }

        if sequence.len() != reachable.len() {
            let stuck = in_degree
                .iter()
                .find(|(_, degree)| **degree > 0)
                .map(|(oid, _)| oid.to_string())
                .unwrap_or_default();
            return Err(RepositoryError::corrupt_graph(
                stuck,
                "commit graph contains a cycle",
            ));
        }

        Ok(sequence)
    }

    fn release(&mut self, ready: &mut ReadySet, commits: Vec<ObjectId>) -> Result<()> {
        for oid in commits {
            self.sequence += 1;
            let time = self.load(&oid)?.timestamp();
            ready.push(PendingCommit {
                time,
                sequence: self.sequence,
                oid,
            });
        }
        ready.settle();

        Ok(())
    }

    /// Non-hidden, not yet emitted commits reachable from the tips, in discovery order
    ///
    /// Emitted commits are still walked through so their ancestors are found.
    fn collect_reachable(&mut self) -> Result<Vec<ObjectId>> {
        let mut reachable = Vec::new();
        let mut discovered = HashSet::new();
        let mut queue = self.starts.iter().copied().collect::<VecDeque<_>>();

        while let Some(oid) = queue.pop_front() {
            if self.hidden.contains(&oid) || !discovered.insert(oid) {
                continue;
            }

            if !self.flags_of(&oid).contains(CommitFlags::EMITTED) {
                reachable.push(oid);
            }
            queue.extend(self.load(&oid)?.parents().iter().copied());
        }

        Ok(reachable)
    }
}

/// Commits whose descendants have all been emitted
enum ReadySet {
    /// Most recently released batch first, which keeps a line of history together
    Stack { stack: Vec<ObjectId>, batch: Vec<ObjectId> },
    /// Newest first
    Time(BinaryHeap<PendingCommit>),
}

impl ReadySet {
    fn new(by_time: bool) -> Self {
        if by_time {
            ReadySet::Time(BinaryHeap::new())
        } else {
            ReadySet::Stack {
                stack: Vec::new(),
                batch: Vec::new(),
            }
        }
    }

    fn push(&mut self, commit: PendingCommit) {
        match self {
            ReadySet::Stack { batch, .. } => batch.push(commit.oid),
            ReadySet::Time(heap) => heap.push(commit),
        }
    }

    /// Move the last released batch onto the stack so its first member pops first
    fn settle(&mut self) {
        if let ReadySet::Stack { stack, batch } = self {
            stack.extend(batch.drain(..).rev());
        }
    }

    fn pop(&mut self) -> Option<ObjectId> {
        match self {
            ReadySet::Stack { stack, .. } => stack.pop(),
            ReadySet::Time(heap) => heap.pop().map(|commit| commit.oid),
        }
    }
}

impl Iterator for RevList<'_> {
    type Item = Result<WalkedCommit>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(error) = self.expand_hidden() {
            return Some(Err(error));
        }

        let needs_full_set = self
            .sorting
            .intersects(SortFlags::TOPOLOGICAL | SortFlags::REVERSE);
        if !needs_full_set {
            return self.next_incremental();
        }

        if self.materialized.is_none() {
            match self.materialize() {
                Ok(sequence) => self.materialized = Some(sequence),
                Err(error) => {
                    self.materialized = Some(VecDeque::new());
                    return Some(Err(error));
                }
            }
        }

        let materialized = self.materialized.as_mut()?;
        while let Some(walked) = materialized.pop_front() {
            if self.hidden.contains(&walked.oid) {
                continue;
            }

            self.flags
                .entry(walked.oid)
                .or_default()
                .insert(CommitFlags::SEEN | CommitFlags::EMITTED);
            trace!(oid = %walked.oid, "emitting commit");
            return Some(Ok(walked));
        }

        None
    }
}
