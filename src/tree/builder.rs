use log::{debug, warn};

use crate::error::Result;
use crate::io::ReadAt;
use crate::safety::{SafetyChecker, SafetyLimits};
use crate::zip::{ZipArchive, ZipEntry};

use super::node::{ArchiveNode, split_path};

/// Builds the directory tree of an archive, checking every entry first.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    limits: SafetyLimits,
}

impl TreeBuilder {
    pub fn new(limits: SafetyLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Walk `archive` in central directory order and return its top-level
    /// nodes.
    ///
    /// Each entry is streamed through a [`SafetyChecker`] before it is added
    /// to the tree. The first failure aborts the build and the partial tree is
    /// dropped. Counters start from zero on every call, so building twice over
    /// the same archive gives the same result.
    pub async fn build<R: ReadAt>(&self, archive: &ZipArchive<R>) -> Result<Vec<ArchiveNode>> {
        let mut checker = SafetyChecker::new(self.limits);
        let mut root = Vec::new();

        for entry in archive.entries() {
            checker.check(archive, entry).await?;
            graft(&mut root, entry);
        }

        debug!(
            "built tree: {} top-level nodes from {} entries, {} bytes decompressed",
            root.len(),
            archive.len(),
            checker.total_size()
        );
        Ok(root)
    }
}

/// Insert the path of `entry` under `root`, reusing nodes with equal names.
///
/// Every segment but the last becomes a directory. The last one becomes a
/// file holding `entry` unless the entry is itself a directory. Existing
/// nodes are never replaced. Returns `false` when the path runs through an
/// existing file, in which case the entry is skipped.
fn graft(root: &mut Vec<ArchiveNode>, entry: &ZipEntry) -> bool {
    let segments = split_path(&entry.name);
    let last = segments.len().saturating_sub(1);
    let mut level = root;

    for (i, segment) in segments.iter().enumerate() {
        let pos = match level.iter().position(|node| node.name() == *segment) {
            Some(pos) => pos,
            None => {
                let node = if entry.is_directory || i != last {
                    ArchiveNode::directory(*segment)
                } else {
                    ArchiveNode::file(*segment, entry.clone())
                };
                level.push(node);
                level.len() - 1
            }
        };

        if i == last {
            break;
        }
        match level[pos].children_mut() {
            Some(children) => level = children,
            None => {
                warn!(
                    "skipping {}: {} is a file",
                    entry.name,
                    segments[..=i].join("/")
                );
                return false;
            }
        }
    }
    true
}
