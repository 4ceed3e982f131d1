//! writer-role and reader-role entry points.
//!
//! the writer starts from whatever the record holds and increments every
//! field by one per write, so starting from zeros the k-th write publishes
//! all-k at version 2k. the reader checks each snapshot against that shape:
//! all fields equal, and equal to the number of writes its version implies.

use std::time::{Duration, Instant};
use vrec_sync::{Reader, Snapshot, WaitStrategy, Writer};

/// what the writer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterReport {
    pub writes: u64,
    pub final_version: u64,
    pub elapsed: Duration,
}

/// what one reader saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderReport {
    pub reads: u64,
    /// snapshots mixing values from different writes.
    pub torn: u64,
    /// snapshots older than the previous one.
    pub regressions: u64,
    /// failed attempts summed over all reads.
    pub retries: u64,
    /// reads that observed a different write than the read before.
    pub transitions: u64,
    pub last_value: u64,
    pub elapsed: Duration,
}

impl ReaderReport {
    /// fold one snapshot into the report.
    pub fn record<const N: usize>(&mut self, snapshot: &Snapshot<N>) {
        let first = snapshot.fields[0];
        let uniform = snapshot.fields.iter().all(|&f| f == first);
        if !uniform || first != snapshot.write_count() {
            self.torn += 1;
        }
        if self.reads > 0 {
            if first < self.last_value {
                self.regressions += 1;
            }
            if first != self.last_value {
                self.transitions += 1;
            }
        }
        self.retries += u64::from(snapshot.retries);
        self.last_value = first;
        self.reads += 1;
    }
}

/// perform `writes` writes, each incrementing every field by one, sleeping
/// `pace` between writes when given.
pub fn writer_role<const N: usize>(
    writer: &Writer<N>,
    writes: u64,
    pace: Option<Duration>,
) -> WriterReport {
    let start = Instant::now();
    for i in 0..writes {
        writer.update(|fields| {
            for field in fields.iter_mut() {
                *field = field.wrapping_add(1);
            }
        });
        if let Some(pace) = pace {
            if i + 1 < writes {
                std::thread::sleep(pace);
            }
        }
    }

    let report = WriterReport {
        writes,
        final_version: writer.version(),
        elapsed: start.elapsed(),
    };
    log::debug!("writer done: {:?}", report);
    report
}

/// perform `reads` reads with `wait` between failed attempts and validate
/// every snapshot.
pub fn reader_role<const N: usize, W: WaitStrategy>(
    reader: &Reader<N>,
    reads: u64,
    wait: &W,
) -> ReaderReport {
    let start = Instant::now();
    let mut report = ReaderReport::default();
    for _ in 0..reads {
        let snapshot = reader.read_versioned_with(wait);
        let torn_before = report.torn;
        report.record(&snapshot);
        if torn_before == 0 && report.torn == 1 {
            // first one only
            log::error!("torn snapshot at version {}: {:?}", snapshot.version, snapshot.fields);
        }
    }
    report.elapsed = start.elapsed();
    log::debug!("reader done: {:?}", report);
    report
}
