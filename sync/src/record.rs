//! VersionedRecord: a fixed-size array of integer fields guarded by a sequence
//! counter. one writer publishes whole-record updates, any number of readers
//! take consistent copies without blocking it.
//!
//! # characteristics
//!
//! - **single writer**: only one thread may write over the record's lifetime
//!   (use [`Writer`](crate::Writer) to have the type system enforce it)
//! - **multiple readers**: any number of threads can read concurrently
//! - **lock-free reads**: readers never block, they retry on conflict
//! - **writer priority**: the writer never waits for readers
//!
//! # protocol
//!
//! writer:
//! 1. acquire-load version `v` (even)
//! 2. release-store `v + 1`, the record is now dirty
//! 3. release-store every field, in index order
//! 4. release-store `v + 2`, the record is clean again
//!
//! reader:
//! 1. acquire-load version `snap`; if odd, retry
//! 2. acquire-load every field, in index order
//! 3. acquire-load version again; if it differs from `snap`, retry
//!
//! every field is its own atomic cell and every field store is a release. a
//! reader whose acquire load observes a new field value therefore also
//! observes the dirty version (or later) on its closing version load, so a
//! field value can never leak out ahead of the version transition.
//!
//! # example
//!
//! ```
//! use vrec_sync::VersionedRecord;
//!
//! let record = VersionedRecord::<8>::new();
//!
//! // writer (single thread only)
//! record.write([1; 8]);
//!
//! // reader (any thread)
//! assert_eq!(record.read(), [1; 8]);
//! assert_eq!(record.version(), 2);
//! ```

use crate::error::ReadError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vrec_cpu::{CachePadded, SpinHint, WaitStrategy};

/// field count of the reference layout.
pub const DEFAULT_FIELD_COUNT: usize = 8;

#[inline(always)]
const fn is_dirty(version: u64) -> bool {
    (version & 1) != 0
}

/// a single-writer, multi-reader record of `N` integer fields.
///
/// the version counter sits on its own cache line; readers poll it on every
/// attempt and the writer's field stores should not invalidate it.
#[repr(C)]
pub struct VersionedRecord<const N: usize = DEFAULT_FIELD_COUNT> {
    /// odd = write in progress, even = consistent.
    version: CachePadded<AtomicU64>,
    fields: [AtomicU64; N],
}

/// a consistent copy of the record plus how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot<const N: usize> {
    /// the (even) version both bracketing loads observed.
    pub version: u64,
    pub fields: [u64; N],
    /// failed attempts before this snapshot was accepted.
    pub retries: u32,
}

impl<const N: usize> Snapshot<N> {
    /// number of writes completed when the snapshot was taken.
    #[inline]
    pub fn write_count(&self) -> u64 {
        self.version / 2
    }
}

impl<const N: usize> VersionedRecord<N> {
    /// create a clean record (version 0) with every field zeroed.
    ///
    /// `N` must be at least 1; a zero-field record fails to compile.
    ///
    /// ```
    /// use vrec_sync::VersionedRecord;
    ///
    /// static RECORD: VersionedRecord<4> = VersionedRecord::new();
    /// assert_eq!(RECORD.read(), [0; 4]);
    /// ```
    #[inline]
    pub const fn new() -> Self {
        const { assert!(N > 0, "a versioned record needs at least one field") };
        Self {
            version: CachePadded::new(AtomicU64::new(0)),
            fields: [const { AtomicU64::new(0) }; N],
        }
    }

    /// create a clean record (version 0) holding `values`.
    #[inline]
    pub fn with_values(values: [u64; N]) -> Self {
        const { assert!(N > 0, "a versioned record needs at least one field") };
        Self {
            version: CachePadded::new(AtomicU64::new(0)),
            fields: values.map(AtomicU64::new),
        }
    }

    /// allocate a zeroed record behind an `Arc` for sharing across threads.
    ///
    /// allocation failure aborts the process; a partially built record is
    /// never handed out.
    #[inline]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// number of fields, `N`.
    #[inline]
    pub const fn field_count(&self) -> usize {
        N
    }

    /// current version. even = clean, odd = write in progress.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// `true` while a write is in progress.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        is_dirty(self.version())
    }

    /// publish `values` as the new record contents.
    ///
    /// # contract
    ///
    /// must only be called by the single writer. a second concurrent writer
    /// cannot cause undefined behaviour (every cell is atomic) but will
    /// corrupt the version sequence and let readers accept mixed snapshots.
    /// serializing writers would need a compare-and-swap on the version
    /// (claim `even -> even + 1`) in place of the plain store below.
    ///
    /// ```
    /// use vrec_sync::VersionedRecord;
    ///
    /// let record = VersionedRecord::<2>::new();
    /// record.write([3, 4]);
    /// assert_eq!(record.read(), [3, 4]);
    /// ```
    #[inline]
    pub fn write(&self, values: [u64; N]) {
        let v = self.begin_write();
        for (cell, value) in self.fields.iter().zip(values) {
            cell.store(value, Ordering::Release);
        }
        self.end_write(v);
    }

    /// read-modify-write: `f` receives the current values and whatever it
    /// leaves behind is published with [`write`](Self::write).
    ///
    /// same single-writer contract as `write`. `f` runs before the record
    /// turns dirty, so a panic inside it leaves the record clean.
    ///
    /// ```
    /// use vrec_sync::VersionedRecord;
    ///
    /// let record = VersionedRecord::<3>::with_values([1, 2, 3]);
    /// record.update(|fields| fields.iter_mut().for_each(|f| *f += 10));
    /// assert_eq!(record.read(), [11, 12, 13]);
    /// ```
    #[inline]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut [u64; N]),
    {
        // sole mutator: our own last stores are visible without ordering
        let mut values = std::array::from_fn(|i| self.fields[i].load(Ordering::Relaxed));
        f(&mut values);
        self.write(values);
    }

    /// replace a single field, still as a full dirty/clean transition.
    ///
    /// # panics
    ///
    /// if `index >= N`. the index is checked before the record turns dirty.
    #[inline]
    pub fn write_field(&self, index: usize, value: u64) {
        let cell = &self.fields[index];
        let v = self.begin_write();
        cell.store(value, Ordering::Release);
        self.end_write(v);
    }

    /// one snapshot attempt, no retry.
    ///
    /// ```
    /// use vrec_sync::VersionedRecord;
    ///
    /// let record = VersionedRecord::<2>::with_values([5, 6]);
    /// assert_eq!(record.try_read(), Ok([5, 6]));
    /// ```
    #[inline]
    pub fn try_read(&self) -> Result<[u64; N], ReadError> {
        self.attempt(&mut |_: u64| {}).map(|(_, fields)| fields)
    }

    /// read a consistent snapshot, spinning until one is obtained.
    ///
    /// a writer that never pauses can starve this loop; wrap it with
    /// [`read_bounded`](Self::read_bounded) when that matters.
    #[inline]
    pub fn read(&self) -> [u64; N] {
        self.read_with(&SpinHint)
    }

    /// like [`read`](Self::read), with the wait between attempts chosen by `wait`.
    ///
    /// ```
    /// use vrec_sync::{BackoffWait, VersionedRecord};
    ///
    /// let record = VersionedRecord::<4>::with_values([9; 4]);
    /// assert_eq!(record.read_with(&BackoffWait::default()), [9; 4]);
    /// ```
    #[inline]
    pub fn read_with<W: WaitStrategy>(&self, wait: &W) -> [u64; N] {
        self.read_hooked(wait, |_| {}).fields
    }

    /// like [`read`](Self::read), also reporting the version and retry count.
    #[inline]
    pub fn read_versioned(&self) -> Snapshot<N> {
        self.read_versioned_with(&SpinHint)
    }

    /// [`read_versioned`](Self::read_versioned) with a chosen wait strategy.
    #[inline]
    pub fn read_versioned_with<W: WaitStrategy>(&self, wait: &W) -> Snapshot<N> {
        self.read_hooked(wait, |_| {})
    }

    /// read with a retry budget of `max_attempts` snapshot attempts.
    ///
    /// returns [`ReadError::Exhausted`] when every attempt collided with a
    /// write. a budget of 0 makes no attempt.
    ///
    /// ```
    /// use vrec_sync::VersionedRecord;
    ///
    /// let record = VersionedRecord::<2>::new();
    /// assert_eq!(record.read_bounded(1), Ok([0, 0]));
    /// ```
    pub fn read_bounded(&self, max_attempts: u32) -> Result<[u64; N], ReadError> {
        for attempt in 0..max_attempts {
            match self.attempt(&mut |_: u64| {}) {
                Ok((_, fields)) => return Ok(fields),
                Err(_) => SpinHint.wait(attempt),
            }
        }
        Err(ReadError::Exhausted {
            attempts: max_attempts,
        })
    }

    #[inline(always)]
    fn begin_write(&self) -> u64 {
        let v = self.version.load(Ordering::Acquire);
        debug_assert!(!is_dirty(v), "concurrent writers on a single-writer record");
        self.version.store(v.wrapping_add(1), Ordering::Release);
        v
    }

    #[inline(always)]
    fn end_write(&self, v: u64) {
        self.version.store(v.wrapping_add(2), Ordering::Release);
    }

    /// retry loop shared by every blocking read. `hook` runs once per attempt
    /// that saw an even version, between the opening version load and the
    /// field loads.
    #[inline(always)]
    fn read_hooked<W, P>(&self, wait: &W, mut hook: P) -> Snapshot<N>
    where
        W: WaitStrategy,
        P: FnMut(u64),
    {
        let mut retries = 0u32;
        loop {
            if let Ok((version, fields)) = self.attempt(&mut hook) {
                return Snapshot {
                    version,
                    fields,
                    retries,
                };
            }
            wait.wait(retries);
            retries = retries.saturating_add(1);
        }
    }

    #[inline(always)]
    fn attempt<P: FnMut(u64)>(&self, hook: &mut P) -> Result<(u64, [u64; N]), ReadError> {
        let before = self.version.load(Ordering::Acquire);
        if is_dirty(before) {
            return Err(ReadError::WriteInProgress { version: before });
        }

        hook(before);

        let fields = std::array::from_fn(|i| self.fields[i].load(Ordering::Acquire));

        let after = self.version.load(Ordering::Acquire);
        if after != before {
            return Err(ReadError::Interrupted { before, after });
        }

        Ok((before, fields))
    }
}

impl<const N: usize> Default for VersionedRecord<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for VersionedRecord<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("VersionedRecord");
        match self.attempt(&mut |_: u64| {}) {
            Ok((version, fields)) => out.field("version", &version).field("fields", &fields),
            Err(_) => out.field("fields", &"<write in progress>"),
        };
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;
    use std::time::Duration;
    use vrec_cpu::BusySpin;

    #[test]
    fn test_new_is_clean_and_zeroed() {
        let record = VersionedRecord::<DEFAULT_FIELD_COUNT>::new();
        assert_eq!(record.version(), 0);
        assert!(!record.is_dirty());
        assert_eq!(record.field_count(), 8);
        assert_eq!(record.read(), [0; 8]);
    }

    #[test]
    fn test_version_increments_by_two() {
        let record = VersionedRecord::<4>::new();
        for i in 1..=5u64 {
            record.write([i; 4]);
            assert_eq!(record.version(), 2 * i);
            assert!(!record.is_dirty());
        }

        record.write_field(1, 99);
        assert_eq!(record.version(), 12);
        record.update(|_| {});
        assert_eq!(record.version(), 14);
    }

    #[test]
    fn test_version_wraps() {
        let record = VersionedRecord::<1>::new();
        record.version.store(u64::MAX - 1, Ordering::Relaxed);
        record.write([1]);
        assert_eq!(record.version(), 0);
        assert_eq!(record.read(), [1]);
    }

    #[test]
    fn test_reads_without_writes_are_stable() {
        let record = VersionedRecord::<8>::with_values([1, 2, 3, 4, 5, 6, 7, 8]);
        for _ in 0..1000 {
            assert_eq!(record.read(), [1, 2, 3, 4, 5, 6, 7, 8]);
        }
        let snapshot = record.read_versioned();
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.retries, 0);
        assert_eq!(snapshot.write_count(), 0);
    }

    #[test]
    fn test_update_sees_last_write() {
        let record = VersionedRecord::<3>::new();
        for _ in 0..3 {
            record.update(|fields| fields.iter_mut().for_each(|f| *f += 1));
        }
        assert_eq!(record.read(), [3, 3, 3]);
    }

    #[test]
    fn test_write_field() {
        let record = VersionedRecord::<3>::with_values([1, 2, 3]);
        record.write_field(2, 30);
        assert_eq!(record.read(), [1, 2, 30]);
    }

    #[test]
    fn test_write_field_out_of_range_leaves_record_clean() {
        let record = VersionedRecord::<2>::new();
        let result = std::panic::catch_unwind(|| record.write_field(2, 1));
        assert!(result.is_err());
        assert_eq!(record.version(), 0);
        assert_eq!(record.try_read(), Ok([0, 0]));
    }

    #[test]
    fn test_try_read_while_dirty() {
        let record = VersionedRecord::<2>::new();
        let v = record.begin_write();
        assert!(record.is_dirty());
        assert_eq!(
            record.try_read(),
            Err(ReadError::WriteInProgress { version: 1 })
        );
        assert_eq!(
            record.read_bounded(16),
            Err(ReadError::Exhausted { attempts: 16 })
        );
        record.end_write(v);
        assert_eq!(record.try_read(), Ok([0, 0]));
    }

    #[test]
    fn test_read_bounded_zero_budget() {
        let record = VersionedRecord::<2>::new();
        assert_eq!(
            record.read_bounded(0),
            Err(ReadError::Exhausted { attempts: 0 })
        );
    }

    #[test]
    fn test_reader_waits_out_dirty_window() {
        let record = Arc::new(VersionedRecord::<4>::new());
        let v = record.begin_write();

        let reader = {
            let record = Arc::clone(&record);
            thread::spawn(move || record.read_versioned())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!reader.is_finished(), "reader returned from an odd version");

        for cell in &record.fields {
            cell.store(7, Ordering::Release);
        }
        record.end_write(v);

        let snapshot = reader.join().unwrap();
        assert_eq!(snapshot.fields, [7; 4]);
        assert_eq!(snapshot.version, 2);
        assert!(snapshot.retries > 0);
    }

    #[test]
    fn test_write_between_version_loads_forces_retry() {
        // reader pauses after an even opening load, a full write runs, the
        // reader resumes and must reject its first attempt
        let record = Arc::new(VersionedRecord::<8>::new());
        let paused = Arc::new(Barrier::new(2));
        let resumed = Arc::new(Barrier::new(2));

        let reader = {
            let record = Arc::clone(&record);
            let paused = Arc::clone(&paused);
            let resumed = Arc::clone(&resumed);
            thread::spawn(move || {
                let mut seen = Vec::new();
                let snapshot = record.read_hooked(&BusySpin, |snap| {
                    seen.push(snap);
                    if seen.len() == 1 {
                        paused.wait();
                        resumed.wait();
                    }
                });
                (snapshot, seen)
            })
        };

        paused.wait();
        record.write([1; 8]);
        resumed.wait();

        let (snapshot, seen) = reader.join().unwrap();
        assert_eq!(seen, [0, 2]);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.fields, [1; 8]);
    }

    #[test]
    fn test_attempt_reports_interrupted() {
        let record = VersionedRecord::<2>::new();
        let result = record.attempt(&mut |_: u64| record.write([4, 4]));
        assert_eq!(result, Err(ReadError::Interrupted { before: 0, after: 2 }));
        assert_eq!(record.try_read(), Ok([4, 4]));
    }

    // remembers every attempt number it was asked to wait on
    #[derive(Default)]
    struct RecordingWait(Mutex<Vec<u32>>);

    impl WaitStrategy for RecordingWait {
        fn wait(&self, attempt: u32) {
            self.0.lock().unwrap().push(attempt);
        }
    }

    #[test]
    fn test_wait_attempt_restarts_each_read() {
        let record = VersionedRecord::<2>::new();
        let wait = RecordingWait::default();

        for read in 0..2u64 {
            let mut calls = 0u64;
            let snapshot = record.read_hooked(&wait, |_| {
                calls += 1;
                // interrupt the first two attempts of every read
                if calls <= 2 {
                    record.write([read * 2 + calls; 2]);
                }
            });
            assert_eq!(snapshot.retries, 2);
            assert_eq!(snapshot.fields, [read * 2 + 2; 2]);
        }

        assert_eq!(*wait.0.lock().unwrap(), [0, 1, 0, 1]);
        assert_eq!(record.version(), 8);
    }

    #[test]
    fn test_concurrent_readers_never_tear() {
        let record = Arc::new(VersionedRecord::<8>::new());

        let writer = {
            let record = Arc::clone(&record);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    record.update(|fields| fields.iter_mut().for_each(|f| *f += 1));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let record = Arc::clone(&record);
                thread::spawn(move || {
                    let mut last = 0u64;
                    for _ in 0..10_000 {
                        let snapshot = record.read_versioned();
                        let first = snapshot.fields[0];
                        assert!(snapshot.fields.iter().all(|&f| f == first));
                        assert_eq!(first, snapshot.write_count());
                        assert!(first >= last);
                        last = first;
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(record.read(), [10_000; 8]);
    }

    #[test]
    fn test_default() {
        let record: VersionedRecord = VersionedRecord::default();
        assert_eq!(record.read(), [0; DEFAULT_FIELD_COUNT]);
    }

    #[test]
    fn test_debug() {
        let record = VersionedRecord::<2>::with_values([4, 2]);
        let debug = format!("{:?}", record);
        assert!(debug.contains("VersionedRecord"));
        assert!(debug.contains("[4, 2]"));

        let v = record.begin_write();
        assert!(format!("{:?}", record).contains("<write in progress>"));
        record.end_write(v);
    }
}
