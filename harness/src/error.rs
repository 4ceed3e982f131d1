//! error types for the harness

use thiserror::Error;
use vrec_cpu::CpuAffinityError;

/// harness errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("cpu affinity error: {0}")]
    Affinity(#[from] CpuAffinityError),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// result type alias
pub type Result<T> = std::result::Result<T, Error>;
