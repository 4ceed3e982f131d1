//! vrec-harness: one writer, many readers, zero torn reads expected.
//!
//! thin orchestration: parse -> run -> report

use std::env;
use std::io::Write;
use std::process;
use vrec_harness::{run, HarnessConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = buf.timestamp_nanos();
            writeln!(
                buf,
                "[{} {:5} {}:{}] {}",
                ts,
                record.level(),
                record.module_path().unwrap_or(""),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match HarnessConfig::from_args(&args, |var| env::var(var).ok()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            process::exit(2);
        }
    };

    let report = match run(&config) {
        Ok(report) => report,
        Err(e) => {
            log::error!("run failed: {}", e);
            process::exit(1);
        }
    };

    for (i, r) in report.readers.iter().enumerate() {
        log::info!(
            "reader {}: reads={} retries={} transitions={} last={} torn={} regressions={} in {:?}",
            i,
            r.reads,
            r.retries,
            r.transitions,
            r.last_value,
            r.torn,
            r.regressions,
            r.elapsed,
        );
    }

    if !report.is_consistent() {
        log::error!(
            "{} inconsistent snapshots observed ({} torn, {} regressions)",
            report.inconsistent(),
            report.torn(),
            report.regressions(),
        );
        process::exit(1);
    }
    log::info!("ok: {} reads, no torn or regressed snapshots", report.total_reads());
}
