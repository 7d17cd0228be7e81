//! Shared fixtures for the versioning tests.

use tempfile::TempDir;

use crate::config::VersioningConfig;
use crate::versioning::api::Versioning;
use crate::versioning::record::Record;

pub(crate) fn setup() -> (TempDir, Versioning) {
    setup_with(|config| config)
}

pub(crate) fn setup_with(
    configure: impl FnOnce(VersioningConfig) -> VersioningConfig,
) -> (TempDir, Versioning) {
    let dir = TempDir::new().unwrap();
    let config = VersioningConfig::new(dir.path())
        .author("Test Author", "author@example.com")
        .track("Article")
        .track("Comment");
    let versioning = Versioning::open(configure(config)).unwrap();
    (dir, versioning)
}

pub(crate) fn article(id: &str, title: &str) -> Record {
    Record::new("Article", id).with("title", title)
}
