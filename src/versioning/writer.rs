//! Working-tree writer.
//!
//! Saving a record writes its snapshot to `<TypeName>/<identityHash>` in the
//! working tree and stages the blob the first time it appears. Nothing is
//! committed here.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::storage::CommitId;
use crate::versioning::api::Versioning;
use crate::versioning::error::VersioningResult;
use crate::versioning::path::BlobPath;
use crate::versioning::record::Versioned;
use crate::versioning::snapshot;

impl Versioning {
    /// Write a record's snapshot into the working tree.
    ///
    /// The previous content is fully replaced; readers see either the old or
    /// the new blob, never a partial one. The blob is staged on its first
    /// write only.
    #[instrument(skip_all, fields(type_name = record.type_name(), id = %record.record_id()))]
    pub fn write(&self, record: &dyn Versioned) -> VersioningResult<BlobPath> {
        let blob_path = self.blob_path(record)?;
        let target = blob_path.absolute(self.repo.path());

        let bytes = snapshot::serialize(&record.attributes()?)?;
        write_atomically(&target, &bytes)?;

        let relative = blob_path.relative();
        if !self.repo.is_tracked(&relative)? {
            self.repo.add(&relative)?;
            debug!(path = %relative, "staged new blob");
        }

        self.pending.lock().insert(blob_path.clone());
        debug!(path = %relative, bytes = bytes.len(), "wrote blob");
        Ok(blob_path)
    }

    /// Persist a record after the application saved it.
    ///
    /// Writes the blob when `auto_save` is on and commits when `auto_commit`
    /// is on as well. Returns the commit, if one was made.
    pub fn save(&self, record: &dyn Versioned) -> VersioningResult<Option<CommitId>> {
        if !self.config.auto_save {
            return Ok(None);
        }

        self.write(record)?;
        if self.config.auto_commit {
            return self.commit(None, None).map(Some);
        }
        Ok(None)
    }
}

/// Mode of blob files, matching what a checkout of a regular blob produces.
#[cfg(unix)]
const BLOB_MODE: u32 = 0o644;

/// Write to a temp file next to the target, then rename over it.
fn write_atomically(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = target.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "blob path has no parent directory")
    })?;
    ensure_dir(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(BLOB_MODE))?;
    }
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory tree; losing a creation race to another writer is fine.
fn ensure_dir(dir: &Path) -> io::Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::error::VersioningError;
    use crate::versioning::record::Record;
    use crate::versioning::testing::{article, setup, setup_with};

    #[test]
    fn test_write_then_read() {
        let (_dir, versioning) = setup();
        let record = article("1", "Hello").with("views", 3);

        let path = versioning.write(&record).unwrap();
        assert_eq!(path, BlobPath::resolve("Article", "1").unwrap());

        let bytes = fs::read(path.absolute(versioning.repository().path())).unwrap();
        assert_eq!(snapshot::deserialize(&bytes).unwrap(), record.attributes);
    }

    #[test]
    fn test_write_replaces_content() {
        let (_dir, versioning) = setup();
        let mut record = article("1", "A rather long first title");
        versioning.write(&record).unwrap();

        record.set("title", "Short");
        let path = versioning.write(&record).unwrap();

        let bytes = fs::read(path.absolute(versioning.repository().path())).unwrap();
        let restored = snapshot::deserialize(&bytes).unwrap();
        assert_eq!(restored.get("title"), Some(&serde_json::json!("Short")));
    }

    #[cfg(unix)]
    #[test]
    fn test_written_blob_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, versioning) = setup();
        let mut record = article("1", "first");
        let path = versioning.write(&record).unwrap();
        let full = path.absolute(versioning.repository().path());
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&full), BLOB_MODE);

        versioning.commit(None, None).unwrap();
        record.set("title", "second, longer");
        versioning.write(&record).unwrap();
        assert_eq!(mode(&full), BLOB_MODE);
    }

    #[test]
    fn test_first_write_stages_blob() {
        let (_dir, versioning) = setup();
        let record = article("1", "Hello");
        let path = BlobPath::resolve("Article", "1").unwrap();

        assert!(!versioning.repository().is_tracked(&path.relative()).unwrap());
        versioning.write(&record).unwrap();
        assert!(versioning.repository().is_tracked(&path.relative()).unwrap());

        // second write of a staged blob is fine
        versioning.write(&record).unwrap();

        let commit = versioning.commit(None, None).unwrap();
        assert!(versioning.repository().lookup(commit, &path.relative()).unwrap().is_some());
    }

    #[test]
    fn test_write_tracks_pending_changes() {
        let (_dir, versioning) = setup();
        assert!(!versioning.has_pending_changes());

        versioning.write(&article("1", "One")).unwrap();
        versioning.write(&article("2", "Two")).unwrap();
        versioning.write(&article("1", "One again")).unwrap();
        assert_eq!(versioning.pending_paths().len(), 2);

        versioning.commit(None, None).unwrap();
        assert!(!versioning.has_pending_changes());
    }

    #[test]
    fn test_write_untracked_type_fails() {
        let (_dir, versioning) = setup();
        let record = Record::new("Invoice", "1");

        assert!(matches!(
            versioning.write(&record),
            Err(VersioningError::UntrackedType(_))
        ));
    }

    #[test]
    fn test_write_invalid_identity_fails() {
        let (_dir, versioning) = setup();
        let record = Record::new("Article", "");

        assert!(matches!(
            versioning.write(&record),
            Err(VersioningError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("Article");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_save_respects_flags() {
        let (_dir, versioning) = setup();
        assert_eq!(versioning.save(&article("1", "Hello")).unwrap(), None);
        assert!(versioning.has_pending_changes());
        assert_eq!(versioning.repository().commit_count().unwrap(), 0);

        let (_dir, versioning) = setup_with(|config| config.auto_commit(true));
        let commit = versioning.save(&article("1", "Hello")).unwrap();
        assert!(commit.is_some());
        assert_eq!(versioning.repository().commit_count().unwrap(), 1);

        let (_dir, versioning) = setup_with(|config| config.auto_save(false).auto_commit(true));
        assert_eq!(versioning.save(&article("1", "Hello")).unwrap(), None);
        assert!(!versioning.has_pending_changes());
    }
}
