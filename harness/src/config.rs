//! configuration for a writer/readers run.
//!
//! every setting comes from a `--flag value` pair, falling back to an
//! environment variable, falling back to the default.
//!
//! | flag         | env            | default |
//! |--------------|----------------|---------|
//! | `--readers`  | `VREC_READERS` | 4       |
//! | `--writes`   | `VREC_WRITES`  | 100000  |
//! | `--reads`    | `VREC_READS`   | 100000  |
//! | `--pace-us`  | `VREC_PACE_US` | none    |
//! | `--wait`     | `VREC_WAIT`    | hint    |
//! | `--pin`      | `VREC_PIN`     | none    |

use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// upper bound on reader threads.
pub const MAX_READERS: usize = 256;

/// wait strategy readers use between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitKind {
    /// retry immediately.
    Busy,
    /// one pause hint per retry.
    #[default]
    Hint,
    /// spin, then yield the thread.
    Yield,
    /// bounded exponential backoff.
    Backoff,
}

impl FromStr for WaitKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "busy" => Ok(WaitKind::Busy),
            "hint" => Ok(WaitKind::Hint),
            "yield" => Ok(WaitKind::Yield),
            "backoff" => Ok(WaitKind::Backoff),
            other => Err(Error::InvalidConfig(format!(
                "unknown wait strategy {:?} (expected busy, hint, yield or backoff)",
                other
            ))),
        }
    }
}

/// harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// number of reader threads.
    pub readers: usize,
    /// number of writes the writer performs.
    pub writes: u64,
    /// number of reads each reader performs.
    pub reads: u64,
    /// sleep between writes; `None` writes back to back.
    pub write_pace: Option<Duration>,
    /// reader retry strategy.
    pub wait: WaitKind,
    /// first cpu to pin to: writer on `cpu`, reader i on `cpu + 1 + i`
    /// (modulo cpu count). `None` leaves placement to the scheduler.
    pub pin_from: Option<usize>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            readers: 4,
            writes: 100_000,
            reads: 100_000,
            write_pace: None,
            wait: WaitKind::Hint,
            pin_from: None,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// the reference run: one writer, three incrementing writes, one reader.
    pub fn reference() -> Self {
        Self {
            readers: 1,
            writes: 3,
            reads: 1,
            ..Self::default()
        }
    }

    /// set reader thread count.
    pub fn with_readers(mut self, readers: usize) -> Self {
        self.readers = readers;
        self
    }

    /// set number of writes.
    pub fn with_writes(mut self, writes: u64) -> Self {
        self.writes = writes;
        self
    }

    /// set reads per reader.
    pub fn with_reads(mut self, reads: u64) -> Self {
        self.reads = reads;
        self
    }

    /// sleep `pace` between writes.
    pub fn with_write_pace(mut self, pace: Duration) -> Self {
        self.write_pace = Some(pace);
        self
    }

    /// set reader wait strategy.
    pub fn with_wait(mut self, wait: WaitKind) -> Self {
        self.wait = wait;
        self
    }

    /// pin threads starting at `cpu`.
    pub fn with_pin_from(mut self, cpu: usize) -> Self {
        self.pin_from = Some(cpu);
        self
    }

    /// reject configurations that cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.readers == 0 {
            return Err(Error::InvalidConfig("at least one reader is required".into()));
        }
        if self.readers > MAX_READERS {
            return Err(Error::InvalidConfig(format!(
                "{} readers requested, at most {} supported",
                self.readers, MAX_READERS
            )));
        }
        Ok(())
    }

    /// build from command line arguments (`args[0]` is the program name),
    /// consulting `env` for anything not given as a flag.
    pub fn from_args<E>(args: &[String], env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let lookup = |flag: &str, var: &str| arg_value(args, flag).or_else(|| env(var));
        let mut config = Self::default();

        if let Some(v) = lookup("--readers", "VREC_READERS") {
            config.readers = parse_num(&v, "readers")?;
        }
        if let Some(v) = lookup("--writes", "VREC_WRITES") {
            config.writes = parse_num(&v, "writes")?;
        }
        if let Some(v) = lookup("--reads", "VREC_READS") {
            config.reads = parse_num(&v, "reads")?;
        }
        if let Some(v) = lookup("--pace-us", "VREC_PACE_US") {
            config.write_pace = Some(Duration::from_micros(parse_num(&v, "pace-us")?));
        }
        if let Some(v) = lookup("--wait", "VREC_WAIT") {
            config.wait = v.parse()?;
        }
        if let Some(v) = lookup("--pin", "VREC_PIN") {
            config.pin_from = Some(parse_num(&v, "pin")?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn parse_num<T: FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{}: {:?} is not a valid number", name, value)))
}
