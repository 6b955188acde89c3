//! Archive creation

use crate::archive::codec::{ArchiveWriter, EntryHeader};
use crate::archive::PackOptions;
use crate::pattern::matches_any;
use crate::security::{entry_name, source_name};
use crate::status::StatusSink;
use crate::{Error, Result};
use std::fs::{self, File, Metadata};
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Sizes at or above this need zip64 headers
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Create a zip archive at `destination` from `sources`.
///
/// Sources are processed in order. Directories are skipped with a status
/// line unless `options.recursive` is set, in which case they are walked
/// depth-first in file-name order. Only regular files become entries;
/// directories are implied by their files' names.
///
/// A file given directly is stored under its path exactly as passed, with
/// separators converted to `/`. Files found by walking a directory are
/// stored under the cleaned join of the directory and their relative path.
/// Names are not deduplicated: the same file passed twice is stored twice.
///
/// Any failure aborts the whole operation. The destination file may be
/// left behind truncated and should be discarded by the caller.
pub fn create_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    destination: P,
    sources: &[Q],
    options: &PackOptions,
    sink: &mut dyn StatusSink,
) -> Result<()> {
    let destination = destination.as_ref();

    info!(
        "Creating ZIP {:?} from {} source(s) (recursive: {}, level: {})",
        destination,
        sources.len(),
        options.recursive,
        options.level
    );

    let file =
        File::create(destination).map_err(|e| Error::io_at("create archive", destination, e))?;
    let mut zip = ArchiveWriter::new(BufWriter::new(file));
    let mut added = 0usize;

    for source in sources {
        let path = source.as_ref();
        let metadata = fs::metadata(path).map_err(|e| Error::at("stat", path, e))?;

        if metadata.is_dir() {
            if !options.recursive {
                sink.status(&format!(
                    "adding: {}/ (skipped, not recursive)",
                    source_name(path)
                ));
                continue;
            }
            added += add_directory(&mut zip, path, options, sink)?;
        } else if matches_any(&path.to_string_lossy(), &options.exclude) {
            debug!("Excluded by pattern: {:?}", path);
        } else {
            add_file(&mut zip, path, source_name(path), &metadata, options, sink)?;
            added += 1;
        }
    }

    zip.finish()
        .map_err(|e| Error::io_at("write archive", destination, e))?;

    info!("Successfully created ZIP archive with {} entries", added);
    Ok(())
}

/// Walk a directory and add every regular file that survives exclusion
fn add_directory<W: Write + Seek>(
    zip: &mut ArchiveWriter<W>,
    root: &Path,
    options: &PackOptions,
    sink: &mut dyn StatusSink,
) -> Result<usize> {
    let mut added = 0;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let excluded = matches_any(&entry.path().to_string_lossy(), &options.exclude);
            if excluded {
                debug!("Excluded by pattern: {:?}", entry.path());
            }
            !excluded
        });

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }

        let metadata = if file_type.is_symlink() {
            match fs::metadata(path) {
                Ok(target) if target.is_file() => target,
                Ok(_) => {
                    warn!("Skipping symlink to non-regular file: {:?}", path);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping dangling symlink {:?}: {}", path, e);
                    continue;
                }
            }
        } else {
            entry.metadata()?
        };

        if !metadata.is_file() {
            warn!("Skipping special file: {:?}", path);
            continue;
        }

        add_file(zip, path, entry_name(path), &metadata, options, sink)?;
        added += 1;
    }

    Ok(added)
}

/// Append a single file as an entry called `name`
fn add_file<W: Write + Seek>(
    zip: &mut ArchiveWriter<W>,
    path: &Path,
    name: String,
    metadata: &Metadata,
    options: &PackOptions,
    sink: &mut dyn StatusSink,
) -> Result<()> {
    debug!("Adding file to ZIP: {:?} as {}", path, name);

    let header = EntryHeader {
        name,
        method: options.method(),
        level: options.deflate_level(),
        modified: metadata.modified().ok(),
        mode: permissions(metadata),
        large: metadata.len() >= ZIP64_THRESHOLD,
    };

    let file = File::open(path).map_err(|e| Error::at("open", path, e))?;
    zip.add_file(&header, &mut BufReader::new(file))
        .map_err(|e| Error::io_at("write", path, e))?;

    sink.status(&format!("adding: {}", header.name));
    Ok(())
}

#[cfg(unix)]
fn permissions(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn permissions(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
