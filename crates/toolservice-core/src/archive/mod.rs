//! Packaging of generated project directories into downloadable archives
//!
//! This module provides:
//! - The `Packager` trait implemented by each archive format
//! - `ZipPackager`, the zip implementation
//! - `PackagerRegistry`, lookup of packagers by format name

pub mod zip;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub use self::zip::ZipPackager;

/// Errors raised while packaging a directory
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to write zip archive: {0}")]
    Zip(#[from] ::zip::result::ZipError),
}

/// Speed/size trade-off for compressed archives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    /// Fastest compression; archives are built inside a request
    #[default]
    Fastest,
    Default,
    Smallest,
    /// No compression at all
    Stored,
}

/// An archive format that can package a directory tree
pub trait Packager: Send + Sync {
    /// Format name used to select the packager (e.g. "zip")
    fn name(&self) -> &str;

    /// File extension including the leading dot (e.g. ".zip")
    fn file_extension(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// Package everything below `root` into an in-memory archive
    fn pack(&self, root: &Path) -> Result<Vec<u8>, PackageError>;
}

/// Packagers keyed by format name
#[derive(Clone)]
pub struct PackagerRegistry {
    packagers: HashMap<String, Arc<dyn Packager>>,
}

impl PackagerRegistry {
    /// Create a registry with no packagers
    pub fn empty() -> Self {
        Self {
            packagers: HashMap::new(),
        }
    }

    /// Create a registry holding the zip packager at `compression`
    pub fn with_compression(compression: CompressionLevel) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ZipPackager::new(compression)));
        registry
    }

    /// Register a packager, replacing any previous one with the same name
    pub fn register(&mut self, packager: Arc<dyn Packager>) {
        self.packagers.insert(packager.name().to_string(), packager);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Packager>> {
        self.packagers.get(name).cloned()
    }

    /// Registered format names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.packagers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PackagerRegistry {
    fn default() -> Self {
        Self::with_compression(CompressionLevel::default())
    }
}

impl std::fmt::Debug for PackagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagerRegistry")
            .field("packagers", &self.names())
            .finish()
    }
}
