use log::{debug, warn};

use crate::error::{AbuseReason, Error, Result};
use crate::io::ReadAt;
use crate::zip::{ChunkRead, ZipArchive, ZipEntry};

use super::limits::{CounterScope, SafetyLimits};

/// Streams entries through the configured [`SafetyLimits`].
///
/// One checker is meant to cover one pass over one archive; with
/// [`CounterScope::Archive`] its counters carry over between calls to
/// [`check`](Self::check).
pub struct SafetyChecker {
    limits: SafetyLimits,
    total_size: u64,
    total_entries: u64,
    buf: Vec<u8>,
}

impl SafetyChecker {
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            buf: vec![0u8; limits.chunk_size.max(1)],
            limits,
            total_size: 0,
            total_entries: 0,
        }
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Decompressed bytes counted so far.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Entries counted so far.
    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }

    /// Read `entry` to the end and fail if any threshold is crossed.
    ///
    /// The entry stream is dropped before returning on every path.
    pub async fn check<R: ReadAt>(
        &mut self,
        archive: &ZipArchive<R>,
        entry: &ZipEntry,
    ) -> Result<()> {
        let stream = archive.open_entry(entry).await?;
        self.check_stream(stream, entry).await
    }

    /// Drain `stream`, the decompressed content of `entry`, against the limits.
    ///
    /// The ratio is evaluated after every chunk against the entry's compressed
    /// size; an entry with a compressed size of zero fails as soon as it
    /// produces a byte. Size and entry limits are evaluated once the stream
    /// is exhausted.
    pub async fn check_stream<S: ChunkRead>(
        &mut self,
        mut stream: S,
        entry: &ZipEntry,
    ) -> Result<()> {
        if self.limits.scope == CounterScope::PerEntry {
            self.total_size = 0;
            self.total_entries = 0;
        }
        self.total_entries += 1;

        let mut entry_size = 0u64;
        loop {
            let n = stream.read_chunk(&mut self.buf).await?;
            if n == 0 {
                break;
            }
            entry_size += n as u64;
            self.total_size += n as u64;

            let ratio = entry_size as f64 / entry.compressed_size as f64;
            if ratio > self.limits.max_ratio {
                return Err(self.reject(AbuseReason::SuspiciousCompressionRatio, entry));
            }
        }

        if self.total_size > self.limits.max_total_size {
            return Err(self.reject(AbuseReason::UncompressedSizeExceeded, entry));
        }
        if self.total_entries > self.limits.max_entries {
            return Err(self.reject(AbuseReason::TooManyEntries, entry));
        }

        debug!(
            "checked {}: {} bytes from {} compressed",
            entry.name, entry_size, entry.compressed_size
        );
        Ok(())
    }

    fn reject(&self, reason: AbuseReason, entry: &ZipEntry) -> Error {
        warn!(
            "rejecting archive at {} ({:?}): {} bytes over {} entries",
            entry.name, reason, self.total_size, self.total_entries
        );
        Error::Abuse {
            reason,
            entry: entry.name.clone(),
        }
    }
}
