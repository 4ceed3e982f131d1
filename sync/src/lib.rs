//! lock-free single-writer, multi-reader record.
//!
//! this crate provides [`VersionedRecord`], a seqlock over a fixed array of
//! integer fields, for scenarios where:
//! - one thread owns all updates
//! - many threads need consistent copies of every field at once
//! - readers must never slow the writer down
//!
//! # available types
//!
//! - [`VersionedRecord`]: the record itself, usable by reference or `Arc`
//! - [`Writer`] / [`Reader`]: owned handles from [`VersionedRecord::split`],
//!   the writer is unique by construction
//! - [`Snapshot`]: a copy plus the version it was taken at
//! - [`ReadError`]: why a single or bounded read attempt gave up
//!
//! # example
//!
//! ```
//! use vrec_sync::VersionedRecord;
//!
//! let record = VersionedRecord::<4>::new();
//!
//! // write (single writer only)
//! record.write([1, 2, 3, 4]);
//!
//! // read (from any thread, lock-free)
//! assert_eq!(record.read(), [1, 2, 3, 4]);
//! ```

pub mod error;
mod handle;
mod record;

pub use error::{ReadError, Result};
pub use handle::{Reader, Writer};
pub use record::{Snapshot, VersionedRecord, DEFAULT_FIELD_COUNT};

// wait strategies accepted by `read_with`
pub use vrec_cpu::{BackoffWait, BusySpin, SpinHint, WaitStrategy, YieldingWait};
