//! Zip bomb detection.
//!
//! Every entry is decompressed in full, in small chunks, before it is
//! accepted. Three thresholds are enforced:
//!
//! - the ratio of decompressed bytes to compressed size of one entry,
//!   checked after every chunk so an amplifying entry is abandoned early
//! - total decompressed bytes
//! - number of entries
//!
//! The last two are checked once an entry is exhausted. Whether they span the
//! whole archive or a single entry is controlled by [`CounterScope`].

mod checker;
mod limits;

pub use checker::SafetyChecker;
pub use limits::{CounterScope, SafetyLimits};
