//!   Core Git repository wrapper.
//!
//!  This is the collaborator the versioning engine talks to. It wraps
//!  `git2::Repository` with thread-safe access and exposes the handful of
//!  operations the engine needs: staging, commit-all, history, checkout and
//!  tree lookups.
//!
//! Nothing outside this module touches git2 directly.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use git2::build::CheckoutBuilder;
use git2::{ErrorCode, ObjectType, Repository, StatusOptions, TreeWalkMode, TreeWalkResult};
use parking_lot::RwLock;
use tracing::debug;

use crate::storage::commit::{self, CommitBuilder, CommitInfo};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BlobId, CommitId, GitSignature};

/// The main Git repository wrapper.
///
/// Clone this to share the handle - it uses Arc internally. Access is
/// serialized through a lock, but nothing here coordinates separate
/// processes writing to the same directory.
#[derive(Clone)]
pub struct GitRepository {
    inner: Arc<GitRepositoryInner>,
}

struct GitRepositoryInner {
    repo: RwLock<Repository>,
    path: PathBuf,
    signature: RwLock<GitSignature>,
}

impl GitRepository {
    fn from_repository(repo: Repository, path: &Path) -> Self {
        Self {
            inner: Arc::new(GitRepositoryInner {
                repo: RwLock::new(repo),
                path: path.to_path_buf(),
                signature: RwLock::new(GitSignature::default()),
            }),
        }
    }

    /// Open an existing repository.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let repo =
            Repository::open(path).map_err(|_| StorageError::NotInitialized(path.to_path_buf()))?;
        if repo.is_bare() {
            return Err(StorageError::InvalidPath(path.to_path_buf()));
        }

        Ok(Self::from_repository(repo, path))
    }

    /// Initialize a new repository.
    ///
    /// No initial commit is made; history starts empty.
    pub fn init(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let repo = Repository::init(path)?;
        debug!(path = %path.display(), "initialized repository");

        Ok(Self::from_repository(repo, path))
    }

    /// Open or initialize a repository.
    pub fn open_or_init(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if path.join(".git").exists() {
            Self::open(path)
        } else {
            Self::init(path)
        }
    }

    /// Get the working tree root.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Set the signature for commits.
    pub fn with_signature(self, signature: GitSignature) -> Self {
        self.set_signature(signature);
        self
    }

    /// Replace the author identity applied to every commit.
    pub fn set_signature(&self, signature: GitSignature) {
        *self.inner.signature.write() = signature;
    }

    /// The author identity applied to every commit.
    pub fn signature(&self) -> GitSignature {
        self.inner.signature.read().clone()
    }

    /// Execute a function with read access to the repository.
    pub fn with_repo<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Repository) -> StorageResult<T>,
    {
        let repo = self.inner.repo.read();
        f(&repo)
    }

    /// Execute a function with write access to the repository.
    pub fn with_repo_mut<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Repository) -> StorageResult<T>,
    {
        let repo = self.inner.repo.write();
        f(&repo)
    }

    // ==================== History ====================

    /// Get the current HEAD commit, or None while HEAD is unborn.
    pub fn head(&self) -> StorageResult<Option<CommitId>> {
        self.with_repo(head_commit)
    }

    /// Get information about a commit.
    pub fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo> {
        self.with_repo(|repo| commit::get_commit(repo, id))
    }

    /// Resolve a revision (full or abbreviated sha, `HEAD~1`, ...) to a commit.
    pub fn resolve(&self, rev: &str) -> StorageResult<CommitId> {
        self.with_repo(|repo| {
            repo.revparse_single(rev)
                .and_then(|object| object.peel_to_commit())
                .map(|commit| CommitId::new(commit.id()))
                .map_err(|_| StorageError::CommitNotFound(rev.to_string()))
        })
    }

    /// All commits reachable from HEAD, most recent first.
    pub fn commits(&self) -> StorageResult<Vec<CommitInfo>> {
        self.with_repo(|repo| match head_commit(repo)? {
            Some(head) => commit::history(repo, head)?.collect(),
            None => Ok(Vec::new()),
        })
    }

    /// Number of commits reachable from HEAD, counted on every call.
    pub fn commit_count(&self) -> StorageResult<usize> {
        self.with_repo(|repo| match head_commit(repo)? {
            Some(head) => {
                let mut count = 0;
                for item in commit::history(repo, head)? {
                    item?;
                    count += 1;
                }
                Ok(count)
            }
            None => Ok(0),
        })
    }

    /// Paths that differ between two commits (`old = None` means the empty tree).
    pub fn changed_paths(&self, old: Option<CommitId>, new: CommitId) -> StorageResult<Vec<PathBuf>> {
        self.with_repo(|repo| commit::changed_paths(repo, old, new))
    }

    // ==================== Index & Commits ====================

    /// Stage a path (relative to the working tree root) into the index.
    pub fn add(&self, path: &str) -> StorageResult<()> {
        let relative = validate_relative(path)?;
        self.with_repo_mut(|repo| {
            let mut index = repo.index()?;
            index.add_path(relative)?;
            index.write()?;
            debug!(path, "staged path");
            Ok(())
        })
    }

    /// Check whether a path is known to HEAD's tree or to the index.
    pub fn is_tracked(&self, path: &str) -> StorageResult<bool> {
        let relative = validate_relative(path)?;
        self.with_repo(|repo| {
            let index = repo.index()?;
            if index.get_path(relative, 0).is_some() {
                return Ok(true);
            }
            match head_commit(repo)? {
                Some(head) => Ok(blob_in_tree(repo, head, relative)?.is_some()),
                None => Ok(false),
            }
        })
    }

    /// Commit every tracked change in the working tree, like `git commit -a`.
    ///
    /// Untracked files are not picked up; they must be staged with [`add`]
    /// first. A commit is created even when the tree is unchanged.
    ///
    /// [`add`]: GitRepository::add
    pub fn commit_all(&self, message: &str) -> StorageResult<CommitId> {
        let signature = self.signature();
        self.with_repo_mut(|repo| {
            let mut index = repo.index()?;
            index.update_all(["*"].iter(), None)?;
            index.write()?;
            let tree_id = index.write_tree()?;

            CommitBuilder::new(repo, tree_id)
                .parent(head_commit(repo)?)
                .message(message)
                .signature(signature)
                .commit()
        })
    }

    /// Whether any tracked path differs between HEAD, the index and the
    /// working tree. Untracked files are ignored.
    pub fn is_dirty(&self) -> StorageResult<bool> {
        self.with_repo(|repo| {
            let mut opts = StatusOptions::new();
            opts.include_untracked(false).include_ignored(false);
            let statuses = repo.statuses(Some(&mut opts))?;
            Ok(statuses
                .iter()
                .any(|entry| entry.status() != git2::Status::CURRENT))
        })
    }

    // ==================== Trees & Checkout ====================

    /// Look up the blob stored at `path` in a commit's tree.
    pub fn lookup(&self, at: CommitId, path: &str) -> StorageResult<Option<BlobId>> {
        let relative = validate_relative(path)?;
        self.with_repo(|repo| blob_in_tree(repo, at, relative))
    }

    /// Read the content of the blob stored at `path` in a commit's tree.
    pub fn read_blob_at(&self, at: CommitId, path: &str) -> StorageResult<Option<Vec<u8>>> {
        let relative = validate_relative(path)?;
        self.with_repo(|repo| match blob_in_tree(repo, at, relative)? {
            Some(blob_id) => Ok(Some(repo.find_blob(blob_id.raw())?.content().to_vec())),
            None => Ok(None),
        })
    }

    /// Force-restore `paths` from a commit into the working tree and index.
    ///
    /// An empty slice restores every path committed in HEAD or in `at`, like
    /// `git checkout <at> -- .`: paths committed since `at` are removed, while
    /// files that are only staged or untracked are left alone. HEAD does not
    /// move. A failure part way through leaves already restored paths in
    /// place; checking the same paths out again completes the restore.
    pub fn checkout(&self, at: CommitId, paths: &[String]) -> StorageResult<()> {
        for path in paths {
            validate_relative(path)?;
        }
        self.with_repo_mut(|repo| {
            let tree = commit::get_tree_at_commit(repo, at)?;

            let scope: BTreeSet<String> = if paths.is_empty() {
                let mut committed = tree_paths(&tree)?;
                if let Some(head) = head_commit(repo)? {
                    committed.extend(tree_paths(&commit::get_tree_at_commit(repo, head)?)?);
                }
                committed
            } else {
                paths.iter().cloned().collect()
            };
            if scope.is_empty() {
                return Ok(());
            }

            let mut checkout = CheckoutBuilder::new();
            checkout.force().disable_pathspec_match(true);
            for path in &scope {
                checkout.path(path.as_str());
            }

            repo.checkout_tree(tree.as_object(), Some(&mut checkout))?;
            debug!(commit = %at.short(), paths = scope.len(), "checked out paths");
            Ok(())
        })
    }
}

fn head_commit(repo: &Repository) -> StorageResult<Option<CommitId>> {
    match repo.head() {
        Ok(head) => Ok(Some(CommitId::new(head.peel_to_commit()?.id()))),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(StorageError::Git(e)),
    }
}

fn blob_in_tree(repo: &Repository, at: CommitId, path: &Path) -> StorageResult<Option<BlobId>> {
    let tree = commit::get_tree_at_commit(repo, at)?;
    let result = match tree.get_path(path) {
        Ok(entry) if entry.kind() == Some(ObjectType::Blob) => Ok(Some(BlobId::new(entry.id()))),
        Ok(_) => Ok(None),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(StorageError::Git(e)),
    };
    result
}

/// Every blob path in a tree, relative to the working tree root.
fn tree_paths(tree: &git2::Tree<'_>) -> StorageResult<BTreeSet<String>> {
    let mut paths = BTreeSet::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if let (Some(ObjectType::Blob), Some(name)) = (entry.kind(), entry.name()) {
            paths.insert(format!("{root}{name}"));
        }
        TreeWalkResult::Ok
    })?;
    Ok(paths)
}

/// Paths handed to the index must stay inside the working tree.
fn validate_relative(path: &str) -> StorageResult<&Path> {
    let relative = Path::new(path);
    let escapes = path.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(StorageError::InvalidPath(relative.to_path_buf()));
    }
    Ok(relative)
}
