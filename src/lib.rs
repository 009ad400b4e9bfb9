//! # ziptree
//!
//! Turns the flat entry list of a ZIP archive into a tree of directories and
//! files, refusing archives that look like zip bombs.
//!
//! Every entry is fully decompressed in small chunks before it is added to
//! the tree. The build stops at the first entry that crosses one of the
//! configured [`SafetyLimits`]:
//!
//! - decompressed/compressed ratio of a single entry (default 10)
//! - total decompressed size (default 1 GB)
//! - number of entries (default 10 000)
//!
//! ## Features
//!
//! - Entry names split on both `/` and `\`
//! - Directory nodes shared between entries, in first-seen order
//! - Support for ZIP64 format (archives larger than 4GB)
//! - Support for STORED (uncompressed) and DEFLATE compression methods
//! - CRC-32 verification of every entry
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use ziptree::{LocalFileReader, TreeBuilder, ZipArchive, walk};
//!
//! # async fn run() -> ziptree::Result<()> {
//! let reader = Arc::new(LocalFileReader::new(Path::new("archive.zip"))?);
//! let archive = ZipArchive::open(reader).await?;
//!
//! let tree = TreeBuilder::default().build(&archive).await?;
//! walk(&tree, |path, node| {
//!     let kind = if node.is_directory() { "dir " } else { "file" };
//!     println!("{kind} {path}");
//! });
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod io;
pub mod safety;
pub mod tree;
pub mod zip;

use std::sync::Arc;

pub use error::{AbuseReason, Error, Result};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use safety::{CounterScope, SafetyChecker, SafetyLimits};
pub use tree::{ArchiveNode, TreeBuilder, find, split_path, walk};
pub use zip::{ChunkRead, CompressionMethod, EntryStream, ZipArchive, ZipEntry};

/// Open the archive behind `reader` and build its tree with default limits.
pub async fn build_tree<R: ReadAt>(reader: Arc<R>) -> Result<Vec<ArchiveNode>> {
    let archive = ZipArchive::open(reader).await?;
    TreeBuilder::default().build(&archive).await
}
