//! Streaming entry encoder

use super::format::*;
use crate::archive::EntryMethod;
use crate::utils::DosDateTime;
use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::{SystemTime, UNIX_EPOCH};

const BUFFER_SIZE: usize = 64 * 1024;

/// Everything about an entry except its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Slash-separated name, written as given
    pub name: String,
    pub method: EntryMethod,
    /// Deflate level 1-9, `None` for the encoder default
    pub level: Option<u32>,
    pub modified: Option<SystemTime>,
    /// Permission bits; the regular file type bits are added on write
    pub mode: u32,
    /// Reserve ZIP64 sizes in the local header
    pub large: bool,
}

impl EntryHeader {
    /// A regular file with mode 0644 and no timestamp
    pub fn file(name: String, method: EntryMethod) -> Self {
        Self {
            name,
            method,
            level: None,
            modified: None,
            mode: 0o644,
            large: false,
        }
    }
}

/// Writes entries one after another, then the central directory.
///
/// Names are not checked against earlier entries; adding the same name
/// twice produces two records.
pub struct ArchiveWriter<W: Write + Seek> {
    inner: W,
    records: Vec<CentralRecord>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records: Vec::new(),
        }
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append an entry holding everything `source` yields.
    ///
    /// Returns the number of uncompressed bytes written.
    pub fn add_file<R: Read + ?Sized>(
        &mut self,
        header: &EntryHeader,
        source: &mut R,
    ) -> io::Result<u64> {
        let method = match header.method {
            EntryMethod::Stored => METHOD_STORED,
            EntryMethod::Deflated => METHOD_DEFLATED,
            EntryMethod::Other(code) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("cannot write compression method {}", code),
                ))
            }
        };

        let offset = self.inner.stream_position()?;
        let mtime = header
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_secs()).ok());
        let mut record = CentralRecord {
            name: header.name.clone(),
            version_made_by: HOST_UNIX << 8 | VERSION_DEFAULT,
            flags: if header.name.is_ascii() { 0 } else { FLAG_UTF8 },
            method,
            modified: header
                .modified
                .map_or(DosDateTime::MIN, DosDateTime::from_system_time),
            mtime,
            crc32: 0,
            compressed_size: 0,
            size: 0,
            external_attributes: (S_IFREG | header.mode & 0o7777) << 16,
            local_header_offset: offset,
        };

        self.write_local_header(&record, header.large)?;
        let (size, compressed_size, crc32) = self.write_data(source, method, header.level)?;

        let limit = u64::from(ZIP64_MARKER);
        if !header.large && (size >= limit || compressed_size >= limit) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}: grew past 4 GiB while being added", header.name),
            ));
        }

        record.size = size;
        record.compressed_size = compressed_size;
        record.crc32 = crc32;
        self.patch_local_header(&record, header.large)?;
        self.records.push(record);

        Ok(size)
    }

    /// Write the central directory and end records, returning the sink.
    pub fn finish(mut self) -> io::Result<W> {
        let cd_offset = self.inner.stream_position()?;
        for record in &self.records {
            record.write_to(&mut self.inner)?;
        }
        let cd_end = self.inner.stream_position()?;
        let cd_size = cd_end - cd_offset;
        let total = self.records.len() as u64;

        let needs_zip64 = total >= u64::from(ZIP64_COUNT_MARKER)
            || cd_size >= u64::from(ZIP64_MARKER)
            || cd_offset >= u64::from(ZIP64_MARKER);
        if needs_zip64 {
            Zip64EndOfCentralDirectory {
                total_entries: total,
                cd_size,
                cd_offset,
            }
            .write_to(&mut self.inner)?;
            Zip64Locator {
                eocd64_offset: cd_end,
            }
            .write_to(&mut self.inner)?;
        }

        let count = total.min(u64::from(ZIP64_COUNT_MARKER)) as u16;
        EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: count,
            total_entries: count,
            cd_size: cd_size.min(u64::from(ZIP64_MARKER)) as u32,
            cd_offset: cd_offset.min(u64::from(ZIP64_MARKER)) as u32,
            comment_len: 0,
        }
        .write_to(&mut self.inner)?;

        self.inner.flush()?;
        Ok(self.inner)
    }

    /// Local header with zeroed CRC and sizes, followed by name and extra
    /// field. A ZIP64 field comes first so its position is fixed.
    fn write_local_header(&mut self, record: &CentralRecord, large: bool) -> io::Result<()> {
        let mut extra = Vec::new();
        if large {
            extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID)?;
            extra.write_u16::<LittleEndian>(16)?;
            extra.write_u64::<LittleEndian>(0)?;
            extra.write_u64::<LittleEndian>(0)?;
        }
        if let Some(mtime) = record.mtime.and_then(|t| i32::try_from(t).ok()) {
            extra.write_u16::<LittleEndian>(EXTENDED_TIMESTAMP_ID)?;
            extra.write_u16::<LittleEndian>(5)?;
            extra.write_u8(1)?;
            extra.write_i32::<LittleEndian>(mtime)?;
        }

        let w = &mut self.inner;
        w.write_u32::<LittleEndian>(LOCAL_HEADER_SIGNATURE)?;
        w.write_u16::<LittleEndian>(if large { VERSION_ZIP64 } else { VERSION_DEFAULT })?;
        w.write_u16::<LittleEndian>(record.flags)?;
        w.write_u16::<LittleEndian>(record.method)?;
        w.write_u16::<LittleEndian>(record.modified.time)?;
        w.write_u16::<LittleEndian>(record.modified.date)?;
        w.write_u32::<LittleEndian>(0)?;
        let size = if large { ZIP64_MARKER } else { 0 };
        w.write_u32::<LittleEndian>(size)?;
        w.write_u32::<LittleEndian>(size)?;
        w.write_u16::<LittleEndian>(record.name.len() as u16)?;
        w.write_u16::<LittleEndian>(extra.len() as u16)?;
        w.write_all(record.name.as_bytes())?;
        w.write_all(&extra)
    }

    /// Fill in CRC and sizes once the data is written.
    fn patch_local_header(&mut self, record: &CentralRecord, large: bool) -> io::Result<()> {
        let end = self.inner.stream_position()?;
        let w = &mut self.inner;

        w.seek(SeekFrom::Start(record.local_header_offset + 14))?;
        w.write_u32::<LittleEndian>(record.crc32)?;
        if large {
            let zip64_data = record.local_header_offset
                + LOCAL_HEADER_SIZE
                + record.name.len() as u64
                + 4;
            w.seek(SeekFrom::Start(zip64_data))?;
            w.write_u64::<LittleEndian>(record.size)?;
            w.write_u64::<LittleEndian>(record.compressed_size)?;
        } else {
            w.write_u32::<LittleEndian>(record.compressed_size as u32)?;
            w.write_u32::<LittleEndian>(record.size as u32)?;
        }

        w.seek(SeekFrom::Start(end))?;
        Ok(())
    }

    /// Returns (size, compressed size, CRC-32).
    fn write_data<R: Read + ?Sized>(
        &mut self,
        source: &mut R,
        method: u16,
        level: Option<u32>,
    ) -> io::Result<(u64, u64, u32)> {
        let mut hasher = Hasher::new();
        let mut counter = CountingWriter::new(&mut self.inner);

        let size = if method == METHOD_DEFLATED {
            let compression = level.map_or_else(Compression::default, Compression::new);
            let mut encoder = DeflateEncoder::new(&mut counter, compression);
            let size = copy_hashed(source, &mut encoder, &mut hasher)?;
            encoder.finish()?;
            size
        } else {
            copy_hashed(source, &mut counter, &mut hasher)?
        };

        Ok((size, counter.count, hasher.finalize()))
    }
}

/// Passes writes through, counting bytes
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn copy_hashed<R: Read + ?Sized, W: Write + ?Sized>(
    source: &mut R,
    dest: &mut W,
    hasher: &mut Hasher,
) -> io::Result<u64> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
        dest.write_all(&buffer[..n])?;
        total += n as u64;
    }
}
