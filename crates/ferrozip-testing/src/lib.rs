//! Testing utilities and fixtures for ferrozip
//!
//! This crate provides temporary directory helpers, standard file trees,
//! directory comparison assertions, and a builder for hand-crafted zip
//! archives (including malicious ones) used across the workspace tests.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod assertions;
pub mod fixtures;
pub mod helpers;

/// Creates a temporary test directory with cleanup on drop
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new temporary test directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Returns the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Joins `name` onto the test directory
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Creates a file with the given name and content in the test directory
    pub fn create_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Creates a directory with the given name in the test directory
    pub fn create_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Reads a file in the test directory as UTF-8
    pub fn read_to_string(&self, name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.join(name))?)
    }
}
