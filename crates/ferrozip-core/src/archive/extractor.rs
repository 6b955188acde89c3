//! Archive extraction

use crate::archive::{archive_error, open_archive, ExtractOptions};
use crate::pattern::{base_name, matches_any};
use crate::security::{absolute_root, clean_path, resolve_destination};
use crate::status::StatusSink;
use crate::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Extract the entries of `archive_path` under `options.output_dir`.
///
/// Entries are processed in archive order, every central directory record
/// once, so a name stored twice is seen twice. An entry that would resolve
/// outside the output directory, or a file that already exists while
/// `overwrite` is off, aborts the whole extraction. Files written before
/// the failure are left in place.
pub fn extract_archive<P: AsRef<Path>>(
    archive_path: P,
    options: &ExtractOptions,
    sink: &mut dyn StatusSink,
) -> Result<()> {
    let archive_path = archive_path.as_ref();

    info!(
        "Extracting ZIP {:?} to {:?} with options: {:?}",
        archive_path, options.output_dir, options
    );

    let root = absolute_root(&options.output_dir)?;
    let mut archive = open_archive(archive_path)?;
    let mut extracted = 0usize;

    for i in 0..archive.len() {
        let entry = archive.records()[i].clone();
        let name = entry.name.as_str();

        if !options.patterns.is_empty() && !matches_any(name, &options.patterns) {
            debug!("Not selected by patterns: {}", name);
            continue;
        }

        let target = if options.junk_paths {
            base_name(name)
        } else {
            name
        };
        let destination = resolve_destination(&root, target, name)?;
        let shown = display_path(&options.output_dir, &root, &destination);

        if entry.is_dir() {
            let mode = entry
                .unix_mode()
                .map_or(DEFAULT_DIR_MODE, |m| m & 0o777);
            debug!("Creating directory {:?} (mode {:o})", destination, mode);
            make_dirs(&destination, mode)?;
            continue;
        }

        if fs::symlink_metadata(&destination).is_ok() {
            if !options.overwrite {
                return Err(Error::FileExists(shown));
            }
            if !destination.is_dir() {
                debug!("Overwriting existing file: {:?}", destination);
                fs::remove_file(&destination)
                    .map_err(|e| Error::io_at("remove", &destination, e))?;
            }
        }

        if let Some(parent) = destination.parent() {
            make_dirs(parent, DEFAULT_DIR_MODE)?;
        }

        let mut data = archive
            .open(i)
            .map_err(|e| archive_error(archive_path, e))?;
        let mode = entry
            .unix_mode()
            .map_or(DEFAULT_FILE_MODE, |m| m & 0o777);
        let mut output = create_file(&destination, mode)?;
        io::copy(&mut data, &mut output).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => Error::InvalidArchive {
                path: archive_path.to_path_buf(),
                reason: format!("{}: {}", name, e),
            },
            _ => Error::io_at("extract", &shown, e),
        })?;
        drop(output);

        set_mode(&destination, mode)?;

        if let Some(time) = entry.file_time() {
            filetime::set_file_times(&destination, time, time)
                .map_err(|e| Error::io_at("set times", &destination, e))?;
        }

        sink.status(&format!("inflating: {}", shown.display()));
        extracted += 1;
    }

    info!("Successfully extracted {} file(s)", extracted);
    Ok(())
}

/// Path to report to the user: the destination under the output directory
/// as it was given, rather than its absolute form.
fn display_path(output_dir: &Path, root: &Path, destination: &Path) -> PathBuf {
    match destination.strip_prefix(root) {
        Ok(relative) => clean_path(&output_dir.join(relative)),
        Err(_) => destination.to_path_buf(),
    }
}

#[cfg(unix)]
fn make_dirs(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .map_err(|e| Error::io_at("mkdir", path, e))
}

#[cfg(not(unix))]
fn make_dirs(path: &Path, _mode: u32) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io_at("mkdir", path, e))
}

fn create_file(path: &Path, mode: u32) -> Result<fs::File> {
    let mut open = OpenOptions::new();
    open.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    open.open(path).map_err(|e| Error::io_at("create", path, e))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| Error::io_at("chmod", path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
