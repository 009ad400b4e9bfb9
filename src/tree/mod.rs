//! Reconstruction of the directory hierarchy from flat entry names.

mod builder;
mod node;

pub use builder::TreeBuilder;
pub use node::{ArchiveNode, find, split_path, walk};
