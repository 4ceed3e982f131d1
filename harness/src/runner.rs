//! one writer thread, N reader threads, one shared record.

use crate::config::{HarnessConfig, WaitKind};
use crate::error::{Error, Result};
use crate::roles::{reader_role, writer_role, ReaderReport, WriterReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use vrec_cpu::{cpu_count, pin_current_thread};
use vrec_sync::{
    BackoffWait, BusySpin, Reader, SpinHint, VersionedRecord, YieldingWait, DEFAULT_FIELD_COUNT,
};

/// aggregated outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub writer: WriterReport,
    pub readers: Vec<ReaderReport>,
}

impl RunReport {
    pub fn total_reads(&self) -> u64 {
        self.readers.iter().map(|r| r.reads).sum()
    }

    pub fn torn(&self) -> u64 {
        self.readers.iter().map(|r| r.torn).sum()
    }

    pub fn regressions(&self) -> u64 {
        self.readers.iter().map(|r| r.regressions).sum()
    }

    /// torn plus regressed snapshots.
    pub fn inconsistent(&self) -> u64 {
        self.torn() + self.regressions()
    }

    pub fn retries(&self) -> u64 {
        self.readers.iter().map(|r| r.retries).sum()
    }

    /// no reader saw a mixed or out-of-order snapshot.
    pub fn is_consistent(&self) -> bool {
        self.inconsistent() == 0
    }
}

/// run one writer and `config.readers` readers over a fresh zeroed record.
///
/// threads are scoped: every participant is joined before the record drops.
pub fn run(config: &HarnessConfig) -> Result<RunReport> {
    config.validate()?;

    let cpus = match config.pin_from {
        Some(_) => Some(cpu_count()?),
        None => None,
    };
    let cpu_for = |slot: usize| -> Option<usize> {
        let first = config.pin_from?;
        let cpus = cpus?;
        Some((first % cpus + slot % cpus) % cpus)
    };

    let (writer, reader) = VersionedRecord::<DEFAULT_FIELD_COUNT>::new().split();
    let go = AtomicBool::new(false);

    log::info!(
        "run: readers={} writes={} reads={} wait={:?} pace={:?} pin={:?}",
        config.readers,
        config.writes,
        config.reads,
        config.wait,
        config.write_pace,
        config.pin_from,
    );

    thread::scope(|s| -> Result<RunReport> {
        let go = &go;

        let spawned = (0..config.readers)
            .map(|i| {
                let reader = reader.clone();
                let cpu = cpu_for(i + 1);
                thread::Builder::new()
                    .name(format!("vrec-reader-{}", i))
                    .spawn_scoped(s, move || {
                        pin(cpu);
                        wait_for_start(go);
                        read_with_kind(&reader, config.reads, config.wait)
                    })
            })
            .collect::<std::io::Result<Vec<_>>>()
            .and_then(|readers| {
                let cpu = cpu_for(0);
                let writer = thread::Builder::new()
                    .name("vrec-writer".into())
                    .spawn_scoped(s, move || {
                        pin(cpu);
                        wait_for_start(go);
                        writer_role(&writer, config.writes, config.write_pace)
                    })?;
                Ok((readers, writer))
            });

        // release whatever did start, even if a spawn failed, so the scope can join it
        go.store(true, Ordering::Release);
        let (readers, writer) = spawned?;

        let writer = writer.join();
        let readers: Vec<_> = readers.into_iter().map(|h| h.join()).collect();

        let writer = writer.map_err(|_| Error::Panicked("writer"))?;
        let readers = readers
            .into_iter()
            .map(|r| r.map_err(|_| Error::Panicked("reader")))
            .collect::<Result<Vec<_>>>()?;

        let report = RunReport { writer, readers };
        log::info!(
            "done: reads={} retries={} torn={} regressions={} final_version={} in {:?}",
            report.total_reads(),
            report.retries(),
            report.torn(),
            report.regressions(),
            report.writer.final_version,
            report.writer.elapsed,
        );
        Ok(report)
    })
}

fn wait_for_start(go: &AtomicBool) {
    while !go.load(Ordering::Acquire) {
        thread::yield_now();
    }
}

fn read_with_kind(
    reader: &Reader<DEFAULT_FIELD_COUNT>,
    reads: u64,
    wait: WaitKind,
) -> ReaderReport {
    match wait {
        WaitKind::Busy => reader_role(reader, reads, &BusySpin),
        WaitKind::Hint => reader_role(reader, reads, &SpinHint),
        WaitKind::Yield => reader_role(reader, reads, &YieldingWait::default()),
        WaitKind::Backoff => reader_role(reader, reads, &BackoffWait::default()),
    }
}

// placement is best effort: a refused pin is logged and the run continues
fn pin(cpu: Option<usize>) {
    if let Some(cpu) = cpu {
        if let Err(e) = pin_current_thread(cpu) {
            log::warn!("could not pin {:?} to cpu {}: {}", thread::current().name(), cpu, e);
        }
    }
}
