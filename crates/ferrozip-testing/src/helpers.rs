//! Helpers for building archives by hand
//!
//! Tests that need entries the writer would never produce (`..` segments,
//! absolute names, explicit directory records) build them here directly
//! with an independent zip codec. Archives with repeated names, which that
//! codec refuses to write, are laid out byte by byte.

use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One record of a hand-built archive
#[derive(Debug, Clone)]
pub enum RawEntry {
    File {
        name: String,
        content: Vec<u8>,
        mode: u32,
    },
    Dir {
        name: String,
        mode: u32,
    },
}

impl RawEntry {
    /// A regular file with mode 0644
    pub fn file(name: &str, content: &[u8]) -> Self {
        RawEntry::File {
            name: name.to_string(),
            content: content.to_vec(),
            mode: 0o644,
        }
    }

    /// A regular file with explicit permissions
    pub fn file_with_mode(name: &str, content: &[u8], mode: u32) -> Self {
        RawEntry::File {
            name: name.to_string(),
            content: content.to_vec(),
            mode,
        }
    }

    /// A directory record with mode 0755
    pub fn dir(name: &str) -> Self {
        RawEntry::Dir {
            name: name.to_string(),
            mode: 0o755,
        }
    }
}

/// Writes `entries` verbatim, in order, into a new archive at `path`
pub fn write_raw_archive(path: &Path, entries: &[RawEntry]) -> Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);

    for entry in entries {
        match entry {
            RawEntry::File {
                name,
                content,
                mode,
            } => {
                let options = SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .unix_permissions(*mode);
                zip.start_file(name.as_str(), options)?;
                zip.write_all(content)?;
            }
            RawEntry::Dir { name, mode } => {
                let options = SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Stored)
                    .unix_permissions(*mode);
                zip.add_directory(name.as_str(), options)?;
            }
        }
    }

    zip.finish()?;
    Ok(())
}

/// Writes stored files verbatim, in order, without any check on names.
///
/// Every record is a regular file with mode 0644 dated 1980-01-01, so
/// two entries may share a name.
pub fn write_stored_archive(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, content) in entries {
        let offset = out.len() as u32;
        let crc = crc32fast::hash(content);

        out.write_u32::<LittleEndian>(0x0403_4b50)?;
        out.write_u16::<LittleEndian>(20)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_u16::<LittleEndian>(1 << 5 | 1)?;
        out.write_u32::<LittleEndian>(crc)?;
        out.write_u32::<LittleEndian>(content.len() as u32)?;
        out.write_u32::<LittleEndian>(content.len() as u32)?;
        out.write_u16::<LittleEndian>(name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_all(name.as_bytes())?;
        out.write_all(content)?;

        central.write_u32::<LittleEndian>(0x0201_4b50)?;
        central.write_u16::<LittleEndian>(3 << 8 | 20)?;
        central.write_u16::<LittleEndian>(20)?;
        central.write_u16::<LittleEndian>(0)?;
        central.write_u16::<LittleEndian>(0)?;
        central.write_u16::<LittleEndian>(0)?;
        central.write_u16::<LittleEndian>(1 << 5 | 1)?;
        central.write_u32::<LittleEndian>(crc)?;
        central.write_u32::<LittleEndian>(content.len() as u32)?;
        central.write_u32::<LittleEndian>(content.len() as u32)?;
        central.write_u16::<LittleEndian>(name.len() as u16)?;
        // Extra and comment lengths, disk number, internal attributes
        central.write_u16::<LittleEndian>(0)?;
        central.write_u16::<LittleEndian>(0)?;
        central.write_u16::<LittleEndian>(0)?;
        central.write_u16::<LittleEndian>(0)?;
        central.write_u32::<LittleEndian>(0o100644 << 16)?;
        central.write_u32::<LittleEndian>(offset)?;
        central.write_all(name.as_bytes())?;
    }

    let cd_offset = out.len() as u32;
    out.write_all(&central)?;

    out.write_u32::<LittleEndian>(0x0605_4b50)?;
    out.write_u16::<LittleEndian>(0)?;
    out.write_u16::<LittleEndian>(0)?;
    out.write_u16::<LittleEndian>(entries.len() as u16)?;
    out.write_u16::<LittleEndian>(entries.len() as u16)?;
    out.write_u32::<LittleEndian>(central.len() as u32)?;
    out.write_u32::<LittleEndian>(cd_offset)?;
    out.write_u16::<LittleEndian>(0)?;

    fs::write(path, out)?;
    Ok(())
}
