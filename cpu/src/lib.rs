// vrec-cpu

mod affinity;
mod cache_padded;
mod error;
pub mod wait_strategy;

pub use {
    affinity::{cpu_count, max_cpu_id, pin_current_thread},
    cache_padded::{CachePadded, CACHE_LINE_SIZE},
    error::CpuAffinityError,
    wait_strategy::{cpu_pause, BackoffWait, BusySpin, SpinHint, WaitStrategy, YieldingWait},
};
