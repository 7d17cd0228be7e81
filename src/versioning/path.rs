//! Blob path resolution.
//!
//! Every record lives at `<TypeName>/<identityHash>` inside the working
//! tree: one flat directory per record type, one file per record. The hash
//! is the Git object id of the identity bytes, so it is stable across
//! process runs and always filesystem safe.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::{ObjectType, Oid};
use serde::{Deserialize, Serialize};

use crate::storage::StorageError;
use crate::versioning::error::{InvalidNameError, VersioningError, VersioningResult};
use crate::versioning::record::Versioned;

/// A validated record type name, used as the blob directory.
///
/// Valid names:
/// - 1-64 characters
/// - ASCII alphanumeric, underscores, hyphens only
/// - Must start with a letter or underscore
///
/// Module paths such as `blog::Article` are rejected rather than escaped, so
/// two types can never map to the same directory; use a flattened name like
/// `blog-Article` instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    /// create a new TypeName, validating the input
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        let first_char = name.chars().next().ok_or(InvalidNameError::Empty)?;

        if name.len() > 64 {
            return Err(InvalidNameError::TooLong(name.len()));
        }

        if !first_char.is_ascii_alphabetic() && first_char != '_' {
            return Err(InvalidNameError::InvalidStart(first_char));
        }

        for (i, c) in name.chars().enumerate() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }

        Ok(())
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TypeName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(name: TypeName) -> Self {
        name.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A caller-supplied stable record identity (primary key, UUID, ...).
///
/// Any non-blank string is accepted; it is hashed before touching the
/// filesystem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidNameError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidNameError::Empty);
        }
        Ok(Self(id))
    }

    /// Generate a new ULID-based identity.
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic, filesystem-safe hash of the identity.
    pub fn hash(&self) -> Result<String, git2::Error> {
        Oid::hash_object(ObjectType::Blob, self.0.as_bytes()).map(|oid| oid.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a record's blob in the repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobPath {
    type_name: TypeName,
    identity_hash: String,
}

impl BlobPath {
    /// Resolve the blob path for a (type name, identity) pair.
    pub fn resolve(type_name: &str, record_id: &str) -> VersioningResult<Self> {
        let type_name = TypeName::new(type_name).map_err(VersioningError::InvalidTypeName)?;
        let record_id = RecordId::new(record_id).map_err(VersioningError::InvalidIdentity)?;
        Self::new(type_name, &record_id)
    }

    /// Resolve the blob path of a record.
    pub fn for_record(record: &dyn Versioned) -> VersioningResult<Self> {
        Self::resolve(record.type_name(), &record.record_id())
    }

    pub fn new(type_name: TypeName, record_id: &RecordId) -> VersioningResult<Self> {
        let identity_hash = record_id.hash().map_err(StorageError::from)?;
        Ok(Self {
            type_name,
            identity_hash,
        })
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn identity_hash(&self) -> &str {
        &self.identity_hash
    }

    /// Path inside the repository, always `/`-separated.
    pub fn relative(&self) -> String {
        format!("{}/{}", self.type_name, self.identity_hash)
    }

    /// Path on disk under the repository root.
    pub fn absolute(&self, root: &Path) -> PathBuf {
        root.join(self.type_name.as_str()).join(&self.identity_hash)
    }

    /// Relative or absolute path depending on `relative`.
    pub fn to_path(&self, root: &Path, relative: bool) -> PathBuf {
        if relative {
            PathBuf::from(self.relative())
        } else {
            self.absolute(root)
        }
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_name, self.identity_hash)
    }
}
