// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::archive::{Archive, Owner, SourceKind};

/// Errors of the archive store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The archive file exists but could not be read.
    #[error("Failed to read archive {}: {source}", path.display())]
    Read {
        /// Archive file.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The archive could not be written or moved into place.
    #[error("Failed to write archive {}: {source}", path.display())]
    Write {
        /// Archive file.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The archive could not be serialized.
    #[error("Failed to serialize archive: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Addresses one archive: an owner directory and a source kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveKey {
    /// Directory name of the owner, see [`Owner::slug`].
    pub owner_slug: String,
    /// Kind of data.
    pub source: SourceKind,
}

impl ArchiveKey {
    /// Creates a key from its parts.
    #[must_use]
    pub fn new(owner_slug: impl Into<String>, source: SourceKind) -> Self {
        Self {
            owner_slug: owner_slug.into(),
            source,
        }
    }

    /// Key of the archive holding `source` data of `owner`.
    #[must_use]
    pub fn for_owner(owner: &Owner, source: SourceKind) -> Self {
        Self::new(owner.slug(), source)
    }

    /// Path of the archive relative to the store root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.owner_slug).join(format!("{}.json", self.source.slug()))
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_slug, self.source.slug())
    }
}

/// JSON archive files under a root directory, `<root>/<owner_slug>/<source_slug>.json`.
///
/// Every save replaces the whole file atomically, so a crash never leaves a half-written
/// archive. Each key must only be written by one task at a time.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    /// Creates a store rooted at `root`. Nothing is touched on disk until the first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File of the archive addressed by `key`.
    #[must_use]
    pub fn path(&self, key: &ArchiveKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Loads the archive addressed by `key`.
    ///
    /// A missing file is `None`. So is a file that does not parse: a corrupt archive is
    /// logged and treated as absent, and the next import rebuilds it from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub async fn load(&self, key: &ArchiveKey) -> Result<Option<Archive>, StoreError> {
        let path = self.path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no archive yet");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        match serde_json::from_str::<Archive>(&content) {
            Ok(archive) => Ok(Some(archive)),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "archive is corrupt, treating as absent");
                Ok(None)
            }
        }
    }

    /// Saves `archive` under `key`, replacing any previous file atomically.
    ///
    /// The pretty-printed JSON goes to a sibling temporary file first, which is then renamed
    /// over the target. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing or the final rename fails.
    #[tracing::instrument(skip(self, key, archive), fields(key = %key, entries = archive.entries.len()))]
    pub async fn save(&self, key: &ArchiveKey, archive: &Archive) -> Result<(), StoreError> {
        let path = self.path(key);
        let content = serde_json::to_string_pretty(archive)?;

        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp = temp_path(&path);
        if let Err(source) = fs::write(&tmp, content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(source));
        }
        if let Err(source) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(source));
        }

        tracing::debug!(path = %path.display(), "archive saved");
        Ok(())
    }

    /// Keys of every `source` archive present in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but cannot be listed.
    pub async fn keys(&self, source: SourceKind) -> Result<Vec<ArchiveKey>, StoreError> {
        let mut reader = match fs::read_dir(&self.root).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut keys = vec![];
        loop {
            let entry = match reader.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(StoreError::Read {
                        path: self.root.clone(),
                        source: e,
                    });
                }
            };
            let Some(owner_slug) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            let key = ArchiveKey::new(owner_slug, source);
            if fs::metadata(self.path(&key)).await.is_ok_and(|m| m.is_file()) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
