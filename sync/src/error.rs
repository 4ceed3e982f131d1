//! outcomes of a failed snapshot attempt.
//!
//! [`VersionedRecord::read`](crate::VersionedRecord::read) never fails, it
//! retries. these errors only surface from the single-attempt and bounded
//! variants ([`try_read`](crate::VersionedRecord::try_read),
//! [`read_bounded`](crate::VersionedRecord::read_bounded)).

use thiserror::Error;

/// why a snapshot attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    /// the opening version load was odd.
    #[error("write in progress (version {version})")]
    WriteInProgress { version: u64 },

    /// a write began and/or completed between the two version loads.
    #[error("record changed during read (version {before} -> {after})")]
    Interrupted { before: u64, after: u64 },

    /// the retry budget ran out before a consistent snapshot was taken.
    #[error("no consistent snapshot after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl ReadError {
    /// `true` for the per-attempt conflicts, `false` once a budget is spent.
    #[inline]
    pub fn is_conflict(&self) -> bool {
        !matches!(self, ReadError::Exhausted { .. })
    }
}

/// result type alias
pub type Result<T> = std::result::Result<T, ReadError>;
