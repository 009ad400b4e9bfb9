//! Chunked decompression of a single entry.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use flate2::{Crc, Decompress, FlushDecompress, Status};
use log::trace;

use crate::io::ReadAt;

use super::structures::{CompressionMethod, ZipEntry};

/// Compressed bytes fetched from the source per read.
const INPUT_BLOCK_SIZE: usize = 8 * 1024;

/// A source of decompressed data that is consumed chunk by chunk.
///
/// Any step may fail; `Ok(0)` marks the end of the data.
#[async_trait]
pub trait ChunkRead: Send {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Decompressed view of one entry's data.
///
/// Input is fetched lazily in bounded blocks and never past the entry's
/// compressed size. The CRC-32 of everything produced is checked against the
/// central directory once the stream reports end of data. All state is owned
/// by the stream, so dropping it at any point releases the entry.
pub struct EntryStream<'a, R: ReadAt> {
    reader: &'a R,
    entry: &'a ZipEntry,
    next_offset: u64,
    /// Compressed bytes not yet fetched from the source.
    remaining: u64,
    input: Vec<u8>,
    input_pos: usize,
    inflater: Decompress,
    inflate_done: bool,
    crc: Crc,
    finished: bool,
}

impl<'a, R: ReadAt> EntryStream<'a, R> {
    pub(super) fn new(reader: &'a R, entry: &'a ZipEntry, data_offset: u64) -> Self {
        Self {
            reader,
            entry,
            next_offset: data_offset,
            remaining: entry.compressed_size,
            input: Vec::new(),
            input_pos: 0,
            inflater: Decompress::new(false),
            inflate_done: false,
            crc: Crc::new(),
            finished: false,
        }
    }

    pub fn entry(&self) -> &ZipEntry {
        self.entry
    }

    /// Read the next chunk of decompressed data into `buf`.
    ///
    /// Returns `Ok(0)` once the entry is exhausted. The checksum is verified
    /// on that final call, so a corrupt entry fails instead of ending.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.finished || buf.is_empty() {
            return Ok(0);
        }

        let n = match self.entry.compression_method {
            CompressionMethod::Stored => self.read_stored(buf).await?,
            CompressionMethod::Deflate => self.read_deflate(buf).await?,
            CompressionMethod::Unknown(method) => {
                bail!("Unsupported compression method {}", method)
            }
        };

        if n == 0 {
            self.finish()?;
        } else {
            self.crc.update(&buf[..n]);
            trace!("{}: read {} bytes", self.entry.name, n);
        }
        Ok(n)
    }

    async fn read_stored(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = (buf.len() as u64).min(self.remaining) as usize;
        if n == 0 {
            return Ok(0);
        }
        self.reader
            .read_exact_at(self.next_offset, &mut buf[..n])
            .await?;
        self.next_offset += n as u64;
        self.remaining -= n as u64;
        Ok(n)
    }

    async fn fill_input(&mut self) -> Result<()> {
        let n = (INPUT_BLOCK_SIZE as u64).min(self.remaining) as usize;
        self.input.resize(n, 0);
        self.reader
            .read_exact_at(self.next_offset, &mut self.input)
            .await?;
        self.next_offset += n as u64;
        self.remaining -= n as u64;
        self.input_pos = 0;
        Ok(())
    }

    async fn read_deflate(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.inflate_done {
            return Ok(0);
        }

        loop {
            if self.input_pos == self.input.len() && self.remaining > 0 {
                self.fill_input().await?;
            }

            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();
            let status = self
                .inflater
                .decompress(&self.input[self.input_pos..], buf, FlushDecompress::None)
                .map_err(|e| anyhow!("Corrupt deflate data in {}: {}", self.entry.name, e))?;
            let consumed = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            self.input_pos += consumed;

            if status == Status::StreamEnd {
                self.inflate_done = true;
                return Ok(produced);
            }
            if produced > 0 {
                return Ok(produced);
            }
            if consumed == 0 {
                if self.input_pos == self.input.len() && self.remaining == 0 {
                    bail!("Deflate data of {} is truncated", self.entry.name);
                }
                bail!("Deflate data of {} made no progress", self.entry.name);
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let actual = self.crc.sum();
        if actual != self.entry.crc32 {
            bail!(
                "CRC-32 mismatch for {}: expected {:08x}, got {:08x}",
                self.entry.name,
                self.entry.crc32,
                actual
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<'a, R: ReadAt> ChunkRead for EntryStream<'a, R> {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        EntryStream::read_chunk(self, buf).await
    }
}
