//! Archive operations module
//!
//! Three operations share the zip codec in [`codec`]: [`create_archive`] walks sources
//! into a new archive, [`extract_archive`] materializes entries under a
//! destination root, and [`list_entries`] reports entry metadata only.

pub mod codec;
pub mod extractor;
pub mod listing;
pub mod writer;

pub use extractor::extract_archive;
pub use listing::list_entries;
pub use writer::create_archive;

use crate::{Error, Result};
use chrono::NaiveDateTime;
use codec::{ArchiveReader, CentralRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Level meaning "let the codec choose"
pub const DEFAULT_LEVEL: i32 = -1;

/// Archive entry information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveEntry {
    /// Slash-separated name as stored in the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Compressed size in bytes
    pub compressed_size: u64,
    /// Last modification time (local wall clock, as zip stores it)
    pub modified: Option<NaiveDateTime>,
    /// Compression method
    pub method: EntryMethod,
    /// Unix permissions (if available)
    pub mode: Option<u32>,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Compression method of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMethod {
    Stored,
    Deflated,
    /// Any other method, by its zip method id
    Other(u16),
}

impl From<u16> for EntryMethod {
    fn from(code: u16) -> Self {
        match code {
            0 => EntryMethod::Stored,
            8 => EntryMethod::Deflated,
            other => EntryMethod::Other(other),
        }
    }
}

impl From<&CentralRecord> for ArchiveEntry {
    fn from(record: &CentralRecord) -> Self {
        ArchiveEntry {
            name: record.name.clone(),
            size: record.size,
            compressed_size: record.compressed_size,
            modified: record.modified(),
            method: record.method.into(),
            mode: record.unix_mode(),
            is_dir: record.is_dir(),
        }
    }
}

/// Options for archive creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOptions {
    /// Descend into directories given as sources (default: false)
    pub recursive: bool,
    /// Compression level: -1 codec default, 0 store, 1-9 deflate effort.
    /// Anything else is treated as -1. (default: -1)
    pub level: i32,
    /// Glob patterns matched against base names; matching files are left
    /// out and matching directories are not descended into (default: none)
    pub exclude: Vec<String>,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            level: DEFAULT_LEVEL,
            exclude: Vec::new(),
        }
    }
}

impl PackOptions {
    /// Compression method implied by the level
    pub fn method(&self) -> EntryMethod {
        if self.level == 0 {
            EntryMethod::Stored
        } else {
            EntryMethod::Deflated
        }
    }

    /// Deflate level to hand to the codec, `None` for its default
    pub fn deflate_level(&self) -> Option<u32> {
        match self.level {
            1..=9 => Some(self.level as u32),
            _ => None,
        }
    }
}

/// Options for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Directory to extract into (default: ".")
    pub output_dir: PathBuf,
    /// Replace files that already exist (default: false)
    pub overwrite: bool,
    /// Keep only the base name of each entry (default: false)
    pub junk_paths: bool,
    /// Only extract entries whose base name matches one of these globs;
    /// empty extracts everything (default: empty)
    pub patterns: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            overwrite: false,
            junk_paths: false,
            patterns: Vec::new(),
        }
    }
}

/// Open a zip archive for reading, attaching the archive path to failures.
pub(crate) fn open_archive(path: &Path) -> Result<ArchiveReader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::at("open archive", path, e))?;
    ArchiveReader::new(BufReader::new(file)).map_err(|e| archive_error(path, e))
}

/// Map a codec error raised while reading `path`.
///
/// Malformed structure or data makes the archive invalid; unsupported
/// features are codec errors; anything else is plain I/O.
pub(crate) fn archive_error(path: &Path, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => Error::InvalidArchive {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        io::ErrorKind::Unsupported => Error::Zip(err.to_string()),
        _ => Error::io_at("read archive", path, err),
    }
}
