//!  Commit creation and history traversal
//!
//!  commits are the snapshots of the working tree. history is strictly
//!  linear: every commit created here has at most one parent, the previous
//!  HEAD.
//!
//! this module handles commit creation, history walking, and tree diffs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use git2::{DiffOptions, Repository, Sort};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{CommitId, GitSignature, TreeId};

/// information about a commit
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub id: CommitId,
    pub tree_id: TreeId,
    pub parent_ids: Vec<CommitId>,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&git2::Commit<'_>> for CommitInfo {
    fn from(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        // commits written here always carry a valid time
        let timestamp =
            DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0).unwrap_or_default();

        Self {
            id: CommitId::new(commit.id()),
            tree_id: TreeId::new(commit.tree_id()),
            parent_ids: commit.parent_ids().map(CommitId::new).collect(),
            message: commit.message().unwrap_or_default().to_string(),
            author_name: author.name().unwrap_or_default().to_string(),
            author_email: author.email().unwrap_or_default().to_string(),
            timestamp,
        }
    }
}

impl CommitInfo {
    /// the previous snapshot, None for the root commit
    pub fn first_parent(&self) -> Option<CommitId> {
        self.parent_ids.first().copied()
    }

    /// get a short summary of the commit (first line of message)
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or(&self.message)
    }

    /// the message body after the blank separator line, if any
    pub fn body(&self) -> Option<&str> {
        self.message
            .split_once("\n\n")
            .map(|(_, body)| body.trim_end_matches('\n'))
            .filter(|body| !body.is_empty())
    }
}

/// Appends a snapshot commit to HEAD.
///
/// History stays linear: a commit has at most one parent, and HEAD always
/// moves to the new commit.
pub struct CommitBuilder<'a> {
    repo: &'a Repository,
    tree_id: git2::Oid,
    parent: Option<CommitId>,
    message: String,
    signature: GitSignature,
}

impl<'a> CommitBuilder<'a> {
    pub fn new(repo: &'a Repository, tree_id: git2::Oid) -> Self {
        Self {
            repo,
            tree_id,
            parent: None,
            message: String::new(),
            signature: GitSignature::default(),
        }
    }

    /// the commit HEAD points at before this one; None starts history
    pub fn parent(mut self, parent: Option<CommitId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// used as both author and committer
    pub fn signature(mut self, signature: GitSignature) -> Self {
        self.signature = signature;
        self
    }

    pub fn commit(self) -> StorageResult<CommitId> {
        let tree = self.repo.find_tree(self.tree_id)?;
        let sig = self.signature.to_git2_signature()?;
        let parent = self
            .parent
            .map(|id| self.repo.find_commit(id.raw()))
            .transpose()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, &self.message, &tree, &parents)?;
        Ok(CommitId::new(oid))
    }
}

/// get information about a commit
pub fn get_commit(repo: &Repository, id: CommitId) -> StorageResult<CommitInfo> {
    let commit = repo
        .find_commit(id.raw())
        .map_err(|_| StorageError::CommitNotFound(id.to_string()))?;

    Ok(CommitInfo::from(&commit))
}

/// find the tree of a commit
pub fn get_tree_at_commit(repo: &Repository, id: CommitId) -> StorageResult<git2::Tree<'_>> {
    let commit = repo
        .find_commit(id.raw())
        .map_err(|_| StorageError::CommitNotFound(id.to_string()))?;

    Ok(commit.tree()?)
}

/// paths that differ between the trees of two commits
///
/// `old` may be None to diff against the empty tree (root commit).
pub fn changed_paths(
    repo: &Repository,
    old: Option<CommitId>,
    new: CommitId,
) -> StorageResult<Vec<PathBuf>> {
    let old_tree = old.map(|id| get_tree_at_commit(repo, id)).transpose()?;
    let new_tree = get_tree_at_commit(repo, new)?;

    let mut opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), Some(&mut opts))?;

    let paths = diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(PathBuf::from)
        })
        .collect();

    Ok(paths)
}

/// walk first-parent history from `start`, most recent first
pub fn history(
    repo: &Repository,
    start: CommitId,
) -> StorageResult<impl Iterator<Item = StorageResult<CommitInfo>> + '_> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push(start.raw())?;
    revwalk.set_sorting(Sort::TOPOLOGICAL)?;
    revwalk.simplify_first_parent()?;

    Ok(revwalk.map(move |oid| -> StorageResult<CommitInfo> {
        let commit = repo.find_commit(oid?)?;
        Ok(CommitInfo::from(&commit))
    }))
}
