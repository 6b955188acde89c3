//! Ferrozip - zip/unzip compatible archiving library
//!
//! This library provides the packing and unpacking engine behind the
//! `fzip` and `fzunzip` tools: traversal of a file set, glob-based
//! inclusion/exclusion, compression-level selection, and extraction that
//! refuses to write outside its destination root.

pub mod archive;
pub mod config;
pub mod error;
pub mod pattern;
pub mod security;
pub mod status;
pub mod utils;

pub use error::{Error, Result};

// Re-export commonly used types
pub use archive::{
    create_archive, extract_archive, list_entries, ArchiveEntry, EntryMethod, ExtractOptions,
    PackOptions,
};
pub use pattern::matches_any;
pub use status::{Discard, StatusSink};
