use crate::zip::ZipEntry;

/// One path segment of an archive, as a directory or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveNode {
    Directory {
        name: String,
        /// Unique by name, in first-seen order.
        children: Vec<ArchiveNode>,
    },
    File {
        name: String,
        entry: ZipEntry,
    },
}

impl ArchiveNode {
    pub fn directory(name: impl Into<String>) -> Self {
        ArchiveNode::Directory {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn file(name: impl Into<String>, entry: ZipEntry) -> Self {
        ArchiveNode::File {
            name: name.into(),
            entry,
        }
    }

    /// The single path segment this node stands for.
    pub fn name(&self) -> &str {
        match self {
            ArchiveNode::Directory { name, .. } | ArchiveNode::File { name, .. } => name,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, ArchiveNode::Directory { .. })
    }

    /// Metadata of the originating entry; `None` for directories.
    pub fn entry(&self) -> Option<&ZipEntry> {
        match self {
            ArchiveNode::File { entry, .. } => Some(entry),
            ArchiveNode::Directory { .. } => None,
        }
    }

    /// Child nodes; always empty for files.
    pub fn children(&self) -> &[ArchiveNode] {
        match self {
            ArchiveNode::Directory { children, .. } => children,
            ArchiveNode::File { .. } => &[],
        }
    }

    pub(super) fn children_mut(&mut self) -> Option<&mut Vec<ArchiveNode>> {
        match self {
            ArchiveNode::Directory { children, .. } => Some(children),
            ArchiveNode::File { .. } => None,
        }
    }
}

/// Split an entry name on both `/` and `\`.
///
/// Trailing empty segments are dropped when the name contains a separator,
/// so `docs/` is one segment and `/` is none. Leading and interior empty
/// segments are kept.
pub fn split_path(name: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = name.split(['/', '\\']).collect();
    if segments.len() > 1 {
        while segments.last() == Some(&"") {
            segments.pop();
        }
    }
    segments
}

/// Look up a node by a `/` or `\` separated path below `roots`.
pub fn find<'a>(roots: &'a [ArchiveNode], path: &str) -> Option<&'a ArchiveNode> {
    let mut level = roots;
    let mut found = None;
    for segment in split_path(path) {
        let node = level.iter().find(|node| node.name() == segment)?;
        level = node.children();
        found = Some(node);
    }
    found
}

/// Visit every node depth-first, parents before children, with its full
/// `/`-joined path.
pub fn walk<'a, F>(roots: &'a [ArchiveNode], mut visit: F)
where
    F: FnMut(&str, &'a ArchiveNode),
{
    fn go<'a, F: FnMut(&str, &'a ArchiveNode)>(
        nodes: &'a [ArchiveNode],
        prefix: &mut String,
        nested: bool,
        visit: &mut F,
    ) {
        for node in nodes {
            let len = prefix.len();
            if nested {
                prefix.push('/');
            }
            prefix.push_str(node.name());
            visit(prefix.as_str(), node);
            go(node.children(), prefix, true, visit);
            prefix.truncate(len);
        }
    }

    go(roots, &mut String::new(), false, &mut visit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::CompressionMethod;

    fn entry(name: &str) -> ZipEntry {
        ZipEntry {
            name: name.to_string(),
            is_directory: false,
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            flags: 0,
            lfh_offset: 0,
            last_mod_time: 0,
            last_mod_date: 0,
        }
    }

    #[test]
    fn split_handles_both_separators() {
        assert_eq!(split_path("a/b\\c"), ["a", "b", "c"]);
        assert_eq!(split_path("docs/"), ["docs"]);
        assert_eq!(split_path("a//b"), ["a", "", "b"]);
        assert_eq!(split_path("/a"), ["", "a"]);
        assert!(split_path("/").is_empty());
        assert_eq!(split_path(""), [""]);
    }

    #[test]
    fn file_has_no_children() {
        let node = ArchiveNode::file("x", entry("x"));
        assert!(!node.is_directory());
        assert!(node.children().is_empty());
        assert_eq!(node.entry().map(|e| e.name.as_str()), Some("x"));
    }

    #[test]
    fn walk_and_find() {
        let roots = vec![
            ArchiveNode::Directory {
                name: "a".into(),
                children: vec![ArchiveNode::file("b", entry("a/b"))],
            },
            ArchiveNode::file("c", entry("c")),
        ];

        let mut paths = Vec::new();
        walk(&roots, |path, node| paths.push((path.to_string(), node.is_directory())));
        assert_eq!(
            paths,
            [
                ("a".to_string(), true),
                ("a/b".to_string(), false),
                ("c".to_string(), false)
            ]
        );

        assert_eq!(find(&roots, "a\\b").map(ArchiveNode::name), Some("b"));
        assert!(find(&roots, "c/d").is_none());
        assert!(find(&roots, "/").is_none());
    }
}
