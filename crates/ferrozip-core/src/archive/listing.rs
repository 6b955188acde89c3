//! Listing archive contents without extracting

use crate::archive::{open_archive, ArchiveEntry};
use crate::Result;
use std::path::Path;
use tracing::info;

/// Inspect zip archive contents without extracting
///
/// Every central directory record is reported, directories and repeated
/// names included, in archive order.
pub fn list_entries<P: AsRef<Path>>(archive_path: P) -> Result<Vec<ArchiveEntry>> {
    let archive_path = archive_path.as_ref();
    info!("Listing ZIP archive: {:?}", archive_path);

    let archive = open_archive(archive_path)?;
    Ok(archive.records().iter().map(ArchiveEntry::from).collect())
}
