//! Read-only ZIP archive decoding.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, entry metadata, etc.)
//! - [`parser`]: Central directory parsing into a [`ZipArchive`]
//! - [`stream`]: Chunked, checksummed decompression of a single entry
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The central directory is the source of truth for entry names and sizes;
//! local headers are only read to locate each entry's data.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) method
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod parser;
mod stream;
mod structures;

pub use parser::ZipArchive;
pub use stream::{ChunkRead, EntryStream};
pub use structures::*;
