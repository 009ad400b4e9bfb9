/// How the size and entry counters of a [`SafetyChecker`](super::SafetyChecker)
/// are scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterScope {
    /// Counters accumulate over every entry checked by one checker, so the
    /// size and entry limits apply to the archive as a whole.
    #[default]
    Archive,
    /// Counters restart for every entry. The size limit then bounds a single
    /// entry and the entry limit can never be reached.
    PerEntry,
}

/// Resource thresholds applied while reading an archive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyLimits {
    /// Largest accepted decompressed/compressed ratio for one entry.
    pub max_ratio: f64,
    /// Largest accepted number of decompressed bytes.
    pub max_total_size: u64,
    /// Largest accepted number of entries.
    pub max_entries: u64,
    /// Size of each decompressed read, in bytes.
    pub chunk_size: usize,
    pub scope: CounterScope,
}

impl SafetyLimits {
    pub const DEFAULT_MAX_RATIO: f64 = 10.0;
    pub const DEFAULT_MAX_TOTAL_SIZE: u64 = 1_000_000_000;
    pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;
    pub const DEFAULT_CHUNK_SIZE: usize = 2048;

    pub fn with_max_ratio(mut self, max_ratio: f64) -> Self {
        self.max_ratio = max_ratio;
        self
    }

    pub fn with_max_total_size(mut self, max_total_size: u64) -> Self {
        self.max_total_size = max_total_size;
        self
    }

    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// A zero chunk size is raised to one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_scope(mut self, scope: CounterScope) -> Self {
        self.scope = scope;
        self
    }
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_ratio: Self::DEFAULT_MAX_RATIO,
            max_total_size: Self::DEFAULT_MAX_TOTAL_SIZE,
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            scope: CounterScope::Archive,
        }
    }
}
