//! On-disk ZIP structures

use crate::utils::{local_from_unix, to_file_time, DosDateTime};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::NaiveDateTime;
use filetime::FileTime;
use std::io::{self, Cursor, Read, Write};

pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;
pub const ZIP64_EOCD_SIGNATURE: u32 = 0x0606_4b50;
pub const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;

pub const LOCAL_HEADER_SIZE: u64 = 30;
pub const CENTRAL_HEADER_SIZE: u64 = 46;
pub const EOCD_SIZE: usize = 22;
pub const ZIP64_EOCD_SIZE: u64 = 56;
pub const ZIP64_LOCATOR_SIZE: u64 = 20;
pub const MAX_COMMENT_SIZE: usize = 65535;

/// Value of a 32-bit field whose real value lives in the ZIP64 extra field
pub const ZIP64_MARKER: u32 = u32::MAX;
/// Value of a 16-bit entry count whose real value lives in the ZIP64 EOCD
pub const ZIP64_COUNT_MARKER: u16 = u16::MAX;

pub const ZIP64_EXTRA_ID: u16 = 0x0001;
pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

pub const FLAG_ENCRYPTED: u16 = 1;
pub const FLAG_UTF8: u16 = 1 << 11;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATED: u16 = 8;

/// Version needed to extract: deflate and directories
pub const VERSION_DEFAULT: u16 = 20;
/// Version needed to extract: ZIP64
pub const VERSION_ZIP64: u16 = 45;

const HOST_DOS: u16 = 0;
pub const HOST_UNIX: u16 = 3;
const HOST_OSX: u16 = 19;

const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
const DOS_DIRECTORY: u32 = 0x10;

pub fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

/// End of central directory record, 22 bytes plus comment
#[derive(Debug, Clone, Copy)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Parse the fixed part, signature included.
    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        let mut cursor = Cursor::new(data);
        if cursor.read_u32::<LittleEndian>()? != EOCD_SIGNATURE {
            return Err(invalid("invalid end of central directory"));
        }

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == ZIP64_COUNT_MARKER
            || self.total_entries == ZIP64_COUNT_MARKER
            || self.cd_size == ZIP64_MARKER
            || self.cd_offset == ZIP64_MARKER
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(EOCD_SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.disk_number)?;
        w.write_u16::<LittleEndian>(self.disk_with_cd)?;
        w.write_u16::<LittleEndian>(self.disk_entries)?;
        w.write_u16::<LittleEndian>(self.total_entries)?;
        w.write_u32::<LittleEndian>(self.cd_size)?;
        w.write_u32::<LittleEndian>(self.cd_offset)?;
        w.write_u16::<LittleEndian>(self.comment_len)
    }
}

/// ZIP64 end of central directory record, fixed part
#[derive(Debug, Clone, Copy)]
pub struct Zip64EndOfCentralDirectory {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        if r.read_u32::<LittleEndian>()? != ZIP64_EOCD_SIGNATURE {
            return Err(invalid("invalid zip64 end of central directory"));
        }
        let _record_size = r.read_u64::<LittleEndian>()?;
        let _version_made_by = r.read_u16::<LittleEndian>()?;
        let _version_needed = r.read_u16::<LittleEndian>()?;
        let disk_number = r.read_u32::<LittleEndian>()?;
        let disk_with_cd = r.read_u32::<LittleEndian>()?;
        let disk_entries = r.read_u64::<LittleEndian>()?;
        let total_entries = r.read_u64::<LittleEndian>()?;
        let cd_size = r.read_u64::<LittleEndian>()?;
        let cd_offset = r.read_u64::<LittleEndian>()?;

        if disk_number != 0 || disk_with_cd != 0 || disk_entries != total_entries {
            return Err(invalid("multi-disk archives are not supported"));
        }

        Ok(Self {
            total_entries,
            cd_size,
            cd_offset,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(ZIP64_EOCD_SIGNATURE)?;
        // Size of the remaining record
        w.write_u64::<LittleEndian>(ZIP64_EOCD_SIZE - 12)?;
        w.write_u16::<LittleEndian>(HOST_UNIX << 8 | VERSION_ZIP64)?;
        w.write_u16::<LittleEndian>(VERSION_ZIP64)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u64::<LittleEndian>(self.total_entries)?;
        w.write_u64::<LittleEndian>(self.total_entries)?;
        w.write_u64::<LittleEndian>(self.cd_size)?;
        w.write_u64::<LittleEndian>(self.cd_offset)
    }
}

/// ZIP64 end of central directory locator, 20 bytes
#[derive(Debug, Clone, Copy)]
pub struct Zip64Locator {
    pub eocd64_offset: u64,
}

impl Zip64Locator {
    /// Parse a locator, or `None` if `data` does not start with one.
    pub fn from_bytes(data: &[u8]) -> io::Result<Option<Self>> {
        let mut cursor = Cursor::new(data);
        if cursor.read_u32::<LittleEndian>()? != ZIP64_LOCATOR_SIGNATURE {
            return Ok(None);
        }
        let _disk_with_eocd64 = cursor.read_u32::<LittleEndian>()?;
        let eocd64_offset = cursor.read_u64::<LittleEndian>()?;
        Ok(Some(Self { eocd64_offset }))
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(ZIP64_LOCATOR_SIGNATURE)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u64::<LittleEndian>(self.eocd64_offset)?;
        w.write_u32::<LittleEndian>(1)
    }
}

/// One central directory record.
///
/// Sizes and the local header offset are always the real 64-bit values;
/// ZIP64 markers are resolved on read and reintroduced on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralRecord {
    pub name: String,
    pub version_made_by: u16,
    pub flags: u16,
    pub method: u16,
    pub modified: DosDateTime,
    /// Modification time from the extended timestamp field, Unix seconds
    pub mtime: Option<i64>,
    pub crc32: u32,
    pub compressed_size: u64,
    pub size: u64,
    pub external_attributes: u32,
    pub local_header_offset: u64,
}

impl CentralRecord {
    /// Parse one record, signature included.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        if r.read_u32::<LittleEndian>()? != CENTRAL_HEADER_SIGNATURE {
            return Err(invalid("invalid central directory header"));
        }

        let version_made_by = r.read_u16::<LittleEndian>()?;
        let _version_needed = r.read_u16::<LittleEndian>()?;
        let flags = r.read_u16::<LittleEndian>()?;
        let method = r.read_u16::<LittleEndian>()?;
        let time = r.read_u16::<LittleEndian>()?;
        let date = r.read_u16::<LittleEndian>()?;
        let crc32 = r.read_u32::<LittleEndian>()?;
        let compressed_size = r.read_u32::<LittleEndian>()?;
        let size = r.read_u32::<LittleEndian>()?;
        let name_len = r.read_u16::<LittleEndian>()?;
        let extra_len = r.read_u16::<LittleEndian>()?;
        let comment_len = r.read_u16::<LittleEndian>()?;
        let _disk_start = r.read_u16::<LittleEndian>()?;
        let _internal_attributes = r.read_u16::<LittleEndian>()?;
        let external_attributes = r.read_u32::<LittleEndian>()?;
        let local_header_offset = r.read_u32::<LittleEndian>()?;

        let mut name = vec![0u8; usize::from(name_len)];
        r.read_exact(&mut name)?;
        let mut extra = vec![0u8; usize::from(extra_len)];
        r.read_exact(&mut extra)?;
        let mut comment = vec![0u8; usize::from(comment_len)];
        r.read_exact(&mut comment)?;

        let mut record = CentralRecord {
            name: String::from_utf8_lossy(&name).into_owned(),
            version_made_by,
            flags,
            method,
            modified: DosDateTime { date, time },
            mtime: None,
            crc32,
            compressed_size: u64::from(compressed_size),
            size: u64::from(size),
            external_attributes,
            local_header_offset: u64::from(local_header_offset),
        };
        record.apply_extra(&extra, size, compressed_size, local_header_offset)?;
        Ok(record)
    }

    /// Resolve ZIP64 markers and pick up the extended timestamp.
    fn apply_extra(
        &mut self,
        extra: &[u8],
        size: u32,
        compressed_size: u32,
        offset: u32,
    ) -> io::Result<()> {
        let mut cursor = Cursor::new(extra);

        while extra.len() as u64 - cursor.position() >= 4 {
            let id = cursor.read_u16::<LittleEndian>()?;
            let len = cursor.read_u16::<LittleEndian>()?;
            let mut data = vec![0u8; usize::from(len)];
            cursor
                .read_exact(&mut data)
                .map_err(|_| invalid(format!("truncated extra field in {}", self.name)))?;
            let mut field = Cursor::new(data.as_slice());

            match id {
                ZIP64_EXTRA_ID => {
                    let truncated = |_: io::Error| invalid("truncated zip64 extra field");
                    if size == ZIP64_MARKER {
                        self.size = field.read_u64::<LittleEndian>().map_err(truncated)?;
                    }
                    if compressed_size == ZIP64_MARKER {
                        self.compressed_size =
                            field.read_u64::<LittleEndian>().map_err(truncated)?;
                    }
                    if offset == ZIP64_MARKER {
                        self.local_header_offset =
                            field.read_u64::<LittleEndian>().map_err(truncated)?;
                    }
                }
                EXTENDED_TIMESTAMP_ID if len >= 5 => {
                    let flags = field.read_u8()?;
                    if flags & 1 != 0 {
                        self.mtime = Some(i64::from(field.read_i32::<LittleEndian>()?));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Whether any field needs the ZIP64 extra field
    pub fn needs_zip64(&self) -> bool {
        self.size >= u64::from(ZIP64_MARKER)
            || self.compressed_size >= u64::from(ZIP64_MARKER)
            || self.local_header_offset >= u64::from(ZIP64_MARKER)
    }

    fn extra_field(&self) -> io::Result<Vec<u8>> {
        let mut extra = Vec::new();

        if self.needs_zip64() {
            let mut zip64 = Vec::new();
            if self.size >= u64::from(ZIP64_MARKER) {
                zip64.write_u64::<LittleEndian>(self.size)?;
            }
            if self.compressed_size >= u64::from(ZIP64_MARKER) {
                zip64.write_u64::<LittleEndian>(self.compressed_size)?;
            }
            if self.local_header_offset >= u64::from(ZIP64_MARKER) {
                zip64.write_u64::<LittleEndian>(self.local_header_offset)?;
            }
            extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID)?;
            extra.write_u16::<LittleEndian>(zip64.len() as u16)?;
            extra.extend_from_slice(&zip64);
        }

        if let Some(mtime) = self.mtime.and_then(|t| i32::try_from(t).ok()) {
            extra.write_u16::<LittleEndian>(EXTENDED_TIMESTAMP_ID)?;
            extra.write_u16::<LittleEndian>(5)?;
            extra.write_u8(1)?;
            extra.write_i32::<LittleEndian>(mtime)?;
        }

        Ok(extra)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let clamp = |value: u64| value.min(u64::from(ZIP64_MARKER)) as u32;
        let extra = self.extra_field()?;
        let version = if self.needs_zip64() {
            VERSION_ZIP64
        } else {
            VERSION_DEFAULT
        };

        w.write_u32::<LittleEndian>(CENTRAL_HEADER_SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.version_made_by & 0xff00 | version)?;
        w.write_u16::<LittleEndian>(version)?;
        w.write_u16::<LittleEndian>(self.flags)?;
        w.write_u16::<LittleEndian>(self.method)?;
        w.write_u16::<LittleEndian>(self.modified.time)?;
        w.write_u16::<LittleEndian>(self.modified.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(clamp(self.compressed_size))?;
        w.write_u32::<LittleEndian>(clamp(self.size))?;
        w.write_u16::<LittleEndian>(self.name.len() as u16)?;
        w.write_u16::<LittleEndian>(extra.len() as u16)?;
        // Comment length, disk number, internal attributes
        w.write_u16::<LittleEndian>(0)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(self.external_attributes)?;
        w.write_u32::<LittleEndian>(clamp(self.local_header_offset))?;
        w.write_all(self.name.as_bytes())?;
        w.write_all(&extra)
    }

    fn host(&self) -> u16 {
        self.version_made_by >> 8
    }

    /// Unix mode bits, when the record was written on a Unix-like host
    pub fn unix_mode(&self) -> Option<u32> {
        match self.host() {
            HOST_UNIX | HOST_OSX if self.external_attributes >> 16 != 0 => {
                Some(self.external_attributes >> 16)
            }
            _ => None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
            || self.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFDIR)
            || (self.host() == HOST_DOS && self.external_attributes & DOS_DIRECTORY != 0)
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Modification time as local wall-clock time
    pub fn modified(&self) -> Option<NaiveDateTime> {
        match self.mtime {
            Some(seconds) => local_from_unix(seconds),
            None => self.modified.to_naive(),
        }
    }

    /// Modification time to stamp on an extracted file
    pub fn file_time(&self) -> Option<FileTime> {
        match self.mtime {
            Some(seconds) => Some(FileTime::from_unix_time(seconds, 0)),
            None => self.modified.to_naive().map(to_file_time),
        }
    }
}
