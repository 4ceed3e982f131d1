// wait strategies for seqlock reader retries
// decides what a reader does between a failed snapshot attempt and the next one
// none of them affect correctness: a reader always re-validates the version after waiting
//
// | strategy      | latency  | cpu      | use case                              |
// |---------------|----------|----------|---------------------------------------|
// | BusySpin      | lowest   | highest  | isolated cores, writer on other core  |
// | SpinHint      | low      | high     | default, smt friendly                 |
// | YieldingWait  | moderate | low      | readers sharing cores with the writer |
// | BackoffWait   | variable | adaptive | bursty writers, many readers          |

use core::hint;

// strategy for waiting between two read attempts
// `attempt` is the number of failed attempts so far in the current read (starts at 0)
pub trait WaitStrategy: Send + Sync {
    fn wait(&self, attempt: u32);
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for &W {
    #[inline]
    fn wait(&self, attempt: u32) {
        (**self).wait(attempt)
    }
}

// cpu spin-loop hint, maps to PAUSE on x86/x86_64 and YIELD/ISB on aarch64
// not a memory fence
#[inline(always)]
pub fn cpu_pause() {
    hint::spin_loop();
}

// pure busy spin: retry immediately, no hint, no yield
#[derive(Debug, Clone, Copy, Default)]
pub struct BusySpin;

impl WaitStrategy for BusySpin {
    #[inline(always)]
    fn wait(&self, _attempt: u32) {}
}

// busy spin with a single pause hint per retry
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinHint;

impl WaitStrategy for SpinHint {
    #[inline(always)]
    fn wait(&self, _attempt: u32) {
        cpu_pause();
    }
}

// spin for `spin_tries` attempts, then yield the thread on every further retry
#[derive(Debug, Clone, Copy)]
pub struct YieldingWait {
    spin_tries: u32,
}

impl YieldingWait {
    #[inline]
    pub const fn new(spin_tries: u32) -> Self {
        Self { spin_tries }
    }
}

impl Default for YieldingWait {
    fn default() -> Self {
        Self::new(100)
    }
}

impl WaitStrategy for YieldingWait {
    #[inline]
    fn wait(&self, attempt: u32) {
        if attempt < self.spin_tries {
            cpu_pause();
        } else {
            std::thread::yield_now();
        }
    }
}

// bounded exponential backoff
// attempt k pauses 2^min(k, max_shift) times, so a single wait never exceeds 2^max_shift pauses
// once `yield_after` attempts have failed the thread also yields after pausing
#[derive(Debug, Clone, Copy)]
pub struct BackoffWait {
    max_shift: u32,
    yield_after: u32,
}

impl BackoffWait {
    // hard ceiling on max_shift: 2^10 pauses is already several microseconds
    pub const MAX_SHIFT_LIMIT: u32 = 10;

    #[inline]
    pub const fn new(max_shift: u32, yield_after: u32) -> Self {
        let max_shift = if max_shift > Self::MAX_SHIFT_LIMIT {
            Self::MAX_SHIFT_LIMIT
        } else {
            max_shift
        };
        Self {
            max_shift,
            yield_after,
        }
    }

    // number of pauses issued for a given attempt
    #[inline]
    pub const fn pauses(&self, attempt: u32) -> u32 {
        let shift = if attempt < self.max_shift {
            attempt
        } else {
            self.max_shift
        };
        1 << shift
    }

    #[inline]
    pub const fn max_pauses(&self) -> u32 {
        1 << self.max_shift
    }
}

impl Default for BackoffWait {
    // 1, 2, 4 .. 64 pauses, yield from the 32nd failed attempt
    fn default() -> Self {
        Self::new(6, 32)
    }
}

impl WaitStrategy for BackoffWait {
    fn wait(&self, attempt: u32) {
        for _ in 0..self.pauses(attempt) {
            cpu_pause();
        }
        if attempt >= self.yield_after {
            std::thread::yield_now();
        }
    }
}
