//! vrec harness: drives a versioned record with one writer thread and many
//! reader threads and checks that no reader ever sees a torn snapshot.
//!
//! # architecture
//!
//! ```text
//! ┌─────────────────┐          ┌─────────────────┐ ┌─────────────────┐
//! │  writer_role    │          │  reader_role 0  │ │  reader_role n  │
//! │ (single writer) │          │  (any thread)   │ │  (any thread)   │
//! └────────┬────────┘          └────────┬────────┘ └────────┬────────┘
//!          │ Writer<8>                  │ Reader<8>         │ Reader<8>
//!          ▼                            ▼                   ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │            Arc<VersionedRecord<8>> (version + 8 fields)          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod roles;
pub mod runner;

pub use config::{HarnessConfig, WaitKind};
pub use error::{Error, Result};
pub use roles::{reader_role, writer_role, ReaderReport, WriterReport};
pub use runner::{run, RunReport};
