//! Central directory scan and entry decoding
//!
//! A zip file is read from its end:
//! 1. Find the end of central directory record (EOCD), allowing for a
//!    trailing comment
//! 2. If any EOCD field is saturated, follow the ZIP64 locator to the
//!    ZIP64 EOCD
//! 3. Parse every central directory record, in order
//! 4. To read an entry, skip its local header and decode the data

use super::format::*;
use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher;
use flate2::read::DeflateDecoder;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Random-access reader over a zip archive.
///
/// Records are kept in central directory order, duplicates included.
pub struct ArchiveReader<R> {
    inner: R,
    records: Vec<CentralRecord>,
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Read the central directory of `inner`.
    ///
    /// Structural problems are reported as [`io::ErrorKind::InvalidData`]
    /// or [`io::ErrorKind::UnexpectedEof`].
    pub fn new(mut inner: R) -> io::Result<Self> {
        let records = read_central_directory(&mut inner)?;
        Ok(Self { inner, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CentralRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CentralRecord> {
        self.records
    }

    /// Open the data of the record at `index` for reading.
    ///
    /// The returned reader yields the uncompressed bytes and fails with
    /// [`io::ErrorKind::InvalidData`] at the end if the size or CRC-32 does
    /// not match the central directory.
    pub fn open(&mut self, index: usize) -> io::Result<EntryReader<'_>> {
        let record = self
            .records
            .get(index)
            .ok_or_else(|| invalid(format!("no entry at index {}", index)))?;

        if record.is_encrypted() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{}: encrypted entries are not supported", record.name),
            ));
        }

        self.inner.seek(SeekFrom::Start(record.local_header_offset))?;
        let mut header = [0u8; LOCAL_HEADER_SIZE as usize];
        self.inner.read_exact(&mut header)?;

        let mut cursor = Cursor::new(&header[..]);
        if cursor.read_u32::<LittleEndian>()? != LOCAL_HEADER_SIGNATURE {
            return Err(invalid(format!("{}: invalid local file header", record.name)));
        }
        cursor.set_position(26);
        let name_len = cursor.read_u16::<LittleEndian>()?;
        let extra_len = cursor.read_u16::<LittleEndian>()?;
        self.inner
            .seek(SeekFrom::Current(i64::from(name_len) + i64::from(extra_len)))?;

        let data = (&mut self.inner).take(record.compressed_size);
        let decoder: Box<dyn Read + '_> = match record.method {
            METHOD_STORED => Box::new(data),
            METHOD_DEFLATED => Box::new(DeflateDecoder::new(data)),
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("{}: unsupported compression method {}", record.name, other),
                ))
            }
        };

        Ok(EntryReader {
            inner: decoder,
            hasher: Hasher::new(),
            read: 0,
            expected_size: record.size,
            expected_crc: record.crc32,
            verified: false,
        })
    }
}

/// Decoded entry data, checked against the central directory on EOF
pub struct EntryReader<'a> {
    inner: Box<dyn Read + 'a>,
    hasher: Hasher,
    read: u64,
    expected_size: u64,
    expected_crc: u32,
    verified: bool,
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;

        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.read += n as u64;
            if self.read > self.expected_size {
                return Err(invalid("entry data longer than recorded size"));
            }
        } else if !buf.is_empty() && !self.verified {
            self.verified = true;
            if self.read != self.expected_size {
                return Err(invalid("entry data shorter than recorded size"));
            }
            let crc = self.hasher.clone().finalize();
            if crc != self.expected_crc {
                return Err(invalid(format!(
                    "checksum mismatch (expected {:08x}, got {:08x})",
                    self.expected_crc, crc
                )));
            }
        }

        Ok(n)
    }
}

fn read_central_directory<R: Read + Seek>(r: &mut R) -> io::Result<Vec<CentralRecord>> {
    let (eocd_offset, eocd) = find_eocd(r)?;

    if eocd.disk_number != 0 || eocd.disk_with_cd != 0 || eocd.disk_entries != eocd.total_entries {
        return Err(invalid("multi-disk archives are not supported"));
    }

    let (total_entries, cd_size, cd_offset, cd_end) = if eocd.is_zip64() {
        let start = eocd64_start(r, eocd_offset)?;
        r.seek(SeekFrom::Start(start))?;
        let eocd64 = Zip64EndOfCentralDirectory::read_from(r)?;
        (eocd64.total_entries, eocd64.cd_size, eocd64.cd_offset, start)
    } else {
        (
            u64::from(eocd.total_entries),
            u64::from(eocd.cd_size),
            u64::from(eocd.cd_offset),
            eocd_offset,
        )
    };

    if cd_offset.checked_add(cd_size).map_or(true, |end| end > cd_end) {
        return Err(invalid("central directory lies outside the file"));
    }

    r.seek(SeekFrom::Start(cd_offset))?;
    let mut directory = vec![0u8; cd_size as usize];
    r.read_exact(&mut directory)?;

    let mut cursor = Cursor::new(directory.as_slice());
    let capacity = total_entries.min(cd_size / CENTRAL_HEADER_SIZE) as usize;
    let mut records = Vec::with_capacity(capacity);
    for _ in 0..total_entries {
        records.push(CentralRecord::read_from(&mut cursor)?);
    }

    Ok(records)
}

/// Locate the EOCD record, searching back over a possible comment.
fn find_eocd<R: Read + Seek>(r: &mut R) -> io::Result<(u64, EndOfCentralDirectory)> {
    let file_size = r.seek(SeekFrom::End(0))?;
    if file_size < EOCD_SIZE as u64 {
        return Err(invalid("file too small to be a zip archive"));
    }

    let search_size = file_size.min((EOCD_SIZE + MAX_COMMENT_SIZE) as u64);
    let search_start = file_size - search_size;
    r.seek(SeekFrom::Start(search_start))?;
    let mut tail = vec![0u8; search_size as usize];
    r.read_exact(&mut tail)?;

    let signature = EOCD_SIGNATURE.to_le_bytes();
    for pos in (0..=tail.len() - EOCD_SIZE).rev() {
        if tail[pos..pos + 4] != signature {
            continue;
        }
        let eocd = EndOfCentralDirectory::from_bytes(&tail[pos..pos + EOCD_SIZE])?;
        if pos + EOCD_SIZE + usize::from(eocd.comment_len) <= tail.len() {
            return Ok((search_start + pos as u64, eocd));
        }
    }

    Err(invalid("end of central directory not found"))
}

/// Offset of the ZIP64 EOCD record, from the locator just before the EOCD
fn eocd64_start<R: Read + Seek>(r: &mut R, eocd_offset: u64) -> io::Result<u64> {
    if eocd_offset < ZIP64_LOCATOR_SIZE {
        return Err(invalid("zip64 locator missing"));
    }

    r.seek(SeekFrom::Start(eocd_offset - ZIP64_LOCATOR_SIZE))?;
    let mut data = [0u8; ZIP64_LOCATOR_SIZE as usize];
    r.read_exact(&mut data)?;

    match Zip64Locator::from_bytes(&data)? {
        Some(locator) if locator.eocd64_offset + ZIP64_EOCD_SIZE <= eocd_offset => {
            Ok(locator.eocd64_offset)
        }
        Some(_) => Err(invalid("zip64 end of central directory lies outside the file")),
        None => Err(invalid("zip64 locator missing")),
    }
}
