// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Temporary directory management for integration tests.
//!
//! This module provides utilities for creating and managing temporary
//! directories with automatic cleanup on drop.

use std::path::PathBuf;

use plansync_core::SourceBatch;
use tokio::fs;

/// Temporary directories used for testing.
///
/// Automatically cleans up all created directories when dropped.
#[derive(Debug)]
pub struct TempDirs {
    /// Root of the archive store.
    pub archive_dir: PathBuf,
    /// Directory of scraped batches.
    pub incoming_dir: PathBuf,
}

impl TempDirs {
    /// Creates new temporary directories for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let base = tempfile::tempdir()?.keep();

        let archive_dir = base.join("archive");
        let incoming_dir = base.join("incoming");

        fs::create_dir_all(&archive_dir).await?;
        fs::create_dir_all(&incoming_dir).await?;

        Ok(Self {
            archive_dir,
            incoming_dir,
        })
    }

    /// Gets the base temporary directory.
    #[must_use]
    pub fn base(&self) -> PathBuf {
        // archive_dir and incoming_dir share the same parent (base)
        self.archive_dir
            .parent()
            .expect("temp directories should have a parent")
            .to_path_buf()
    }

    /// Writes the batch of `owner_id` into the incoming directory.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub async fn write_batch(
        &self,
        owner_id: u64,
        batch: &SourceBatch,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.incoming_dir.join(format!("{owner_id}.json"));
        fs::write(&path, serde_json::to_string_pretty(batch)?).await?;
        Ok(path)
    }
}

/// Sets up temporary directories for integration tests.
///
/// This is a convenience wrapper around [`TempDirs::new`].
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub async fn setup_temp_dirs() -> Result<TempDirs, Box<dyn std::error::Error>> {
    TempDirs::new().await
}

// Implement Drop for automatic cleanup
impl Drop for TempDirs {
    fn drop(&mut self) {
        let base = self.base();
        if let Err(e) = std::fs::remove_dir_all(&base) {
            tracing::warn!(path = %base.display(), err = %e, "failed to clean up temp directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn temp_dirs_creates_directories() {
        let dirs = TempDirs::new().await.unwrap();

        assert!(dirs.archive_dir.is_dir());
        assert!(dirs.incoming_dir.is_dir());
        assert_eq!(dirs.archive_dir.parent(), dirs.incoming_dir.parent());
    }

    #[tokio::test]
    async fn temp_dirs_write_batch() {
        let dirs = TempDirs::new().await.unwrap();

        let path = dirs.write_batch(7, &SourceBatch::default()).await.unwrap();

        assert!(path.exists());
        assert!(path.starts_with(&dirs.incoming_dir));
        assert_eq!(path.file_name().unwrap(), "7.json");
    }

    #[tokio::test]
    async fn temp_dirs_cleanup_on_drop() {
        let base = {
            let dirs = TempDirs::new().await.unwrap();
            let base = dirs.base();
            assert!(base.exists());
            base
        };

        assert!(!base.exists());
    }
}
