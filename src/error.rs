use std::fmt;

use thiserror::Error;

/// Which resource threshold an archive tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbuseReason {
    /// Decompressed-to-compressed ratio of one entry exceeded the limit.
    SuspiciousCompressionRatio,
    /// Total decompressed bytes exceeded the limit.
    UncompressedSizeExceeded,
    /// Number of entries exceeded the limit.
    TooManyEntries,
}

impl fmt::Display for AbuseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AbuseReason::SuspiciousCompressionRatio => {
                "ratio between compressed and uncompressed data is highly suspicious, looks like a zip bomb"
            }
            AbuseReason::UncompressedSizeExceeded => {
                "the uncompressed data size is too large for the available resources"
            }
            AbuseReason::TooManyEntries => {
                "too many entries in this archive, can lead to inode exhaustion"
            }
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The archive crossed a safety threshold while `entry` was being read.
    #[error("archive rejected at {entry}: {reason}")]
    Abuse { reason: AbuseReason, entry: String },

    /// The archive could not be read or decoded.
    #[error(transparent)]
    Read(#[from] anyhow::Error),
}

impl Error {
    pub fn abuse_reason(&self) -> Option<AbuseReason> {
        match self {
            Error::Abuse { reason, .. } => Some(*reason),
            Error::Read(_) => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abuse_message_names_entry() {
        let err = Error::Abuse {
            reason: AbuseReason::TooManyEntries,
            entry: "a/b.txt".into(),
        };
        assert!(err.to_string().starts_with("archive rejected at a/b.txt: too many entries"));
        assert_eq!(err.abuse_reason(), Some(AbuseReason::TooManyEntries));
    }

    #[test]
    fn read_errors_are_transparent() {
        let err = Error::from(anyhow::anyhow!("Invalid Local File Header"));
        assert_eq!(err.to_string(), "Invalid Local File Header");
        assert_eq!(err.abuse_reason(), None);
    }
}
