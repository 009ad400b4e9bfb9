//! Central directory parsing.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If any EOCD field is saturated, follow the ZIP64 locator to the ZIP64 EOCD
//! 3. Read the whole Central Directory in one request and parse every header
//!
//! Entry data is only touched later, through [`ZipArchive::open_entry`].

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};
use log::debug;

use super::stream::EntryStream;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// An opened ZIP archive: the parsed central directory plus the source it
/// came from.
///
/// Opening reads only the archive tail and the central directory. Entry
/// contents are streamed on demand with [`open_entry`](Self::open_entry).
pub struct ZipArchive<R: ReadAt> {
    reader: Arc<R>,
    entries: Vec<ZipEntry>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Parse the central directory of `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if no EOCD can be found, the ZIP64 records are
    /// missing, or any central directory header is malformed.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let size = reader.size();
        let (eocd, eocd_offset) = find_eocd(reader.as_ref(), size).await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = read_zip64_eocd(reader.as_ref(), eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.checked_add(cd_size).is_none_or(|end| end > eocd_offset) {
            bail!(
                "Central Directory (offset {}, size {}) lies outside the archive",
                cd_offset,
                cd_size
            );
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        reader
            .read_exact_at(cd_offset, &mut cd_data)
            .await
            .context("Failed to read Central Directory")?;

        // The declared count is untrusted; never reserve more headers than fit.
        let capacity = total_entries.min(cd_size / CDFH_MIN_SIZE as u64) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for index in 0..total_entries {
            let entry = parse_cdfh(&mut cursor)
                .with_context(|| format!("Invalid Central Directory entry #{}", index))?;
            entries.push(entry);
        }

        debug!(
            "opened archive: {} entries, central directory {} bytes at {}",
            entries.len(),
            cd_size,
            cd_offset
        );

        Ok(Self { reader, entries })
    }

    /// Entries in central directory order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Offset of the first byte of `entry`'s compressed data.
    ///
    /// The Local File Header's name and extra field lengths may differ from
    /// the central directory copy, so the header itself is read.
    pub async fn data_offset(&self, entry: &ZipEntry) -> Result<u64> {
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset, &mut lfh_buf)
            .await
            .with_context(|| format!("Failed to read Local File Header of {}", entry.name))?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.name);
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Open a decompression stream over `entry`'s content.
    ///
    /// # Errors
    ///
    /// Fails for encrypted entries, unsupported compression methods, data
    /// that would extend past the end of the archive, or an invalid Local
    /// File Header.
    pub async fn open_entry<'a>(&'a self, entry: &'a ZipEntry) -> Result<EntryStream<'a, R>> {
        if entry.is_encrypted() {
            bail!("Encrypted entry {} is not supported", entry.name);
        }
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            bail!(
                "Unsupported compression method {} for {}",
                method,
                entry.name
            );
        }

        let data_offset = self.data_offset(entry).await?;
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > self.reader.size())
        {
            bail!("Data of {} extends past the end of the archive", entry.name);
        }

        Ok(EntryStream::new(self.reader.as_ref(), entry, data_offset))
    }
}

/// Find and parse the End of Central Directory record.
///
/// Tries the comment-less position first, then searches backwards through
/// the largest possible comment window.
async fn find_eocd<R: ReadAt>(reader: &R, size: u64) -> Result<(EndOfCentralDirectory, u64)> {
    let eocd_size = EndOfCentralDirectory::SIZE as u64;
    if size < eocd_size {
        bail!("Not a valid ZIP file: {} bytes is too small", size);
    }

    let offset = size - eocd_size;
    let mut buf = [0u8; EndOfCentralDirectory::SIZE];
    reader.read_exact_at(offset, &mut buf).await?;
    if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
        return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
    }

    let search_size = (MAX_COMMENT_SIZE + eocd_size).min(size);
    let search_start = size - search_size;
    let mut buf = vec![0u8; search_size as usize];
    reader.read_exact_at(search_start, &mut buf).await?;

    // The comment length must account for every byte after the record.
    for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
        if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
            continue;
        }
        let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
        if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
            let eocd =
                EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
            return Ok((eocd, search_start + i as u64));
        }
    }

    bail!("Not a valid ZIP file: End of Central Directory not found")
}

/// Read the ZIP64 EOCD via the locator stored just before the regular EOCD.
async fn read_zip64_eocd<R: ReadAt>(reader: &R, eocd_offset: u64) -> Result<Zip64Eocd> {
    let Some(locator_offset) = eocd_offset.checked_sub(Zip64EocdLocator::SIZE as u64) else {
        bail!("Missing ZIP64 End of Central Directory Locator");
    };
    let mut locator_buf = [0u8; Zip64EocdLocator::SIZE];
    reader.read_exact_at(locator_offset, &mut locator_buf).await?;
    let locator = Zip64EocdLocator::from_bytes(&locator_buf)?;

    let mut eocd64_buf = [0u8; Zip64Eocd::MIN_SIZE];
    reader
        .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
        .await?;
    Zip64Eocd::from_bytes(&eocd64_buf)
}

/// Parse one Central Directory File Header.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header signature");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut name_bytes)?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();
    let is_directory = name.ends_with('/');

    let mut extra = vec![0u8; extra_field_length as usize];
    cursor.read_exact(&mut extra)?;
    let mut extra = Cursor::new(extra.as_slice());
    while extra.position() + 4 <= extra_field_length as u64 {
        let header_id = extra.read_u16::<LittleEndian>()?;
        let field_size = extra.read_u16::<LittleEndian>()? as u64;
        let field_end = extra.position() + field_size;

        if header_id == ZIP64_EXTRA_ID {
            // Only saturated header fields are present, in this fixed order
            if uncompressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                uncompressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                compressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                lfh_offset = extra.read_u64::<LittleEndian>()?;
            }
        }
        extra.set_position(field_end);
    }

    let comment_end = cursor.position() + file_comment_length as u64;
    if comment_end > cursor.get_ref().len() as u64 {
        bail!("File comment of {} is truncated", name);
    }
    cursor.set_position(comment_end);

    Ok(ZipEntry {
        name,
        is_directory,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        flags,
        lfh_offset,
        last_mod_time,
        last_mod_date,
    })
}
