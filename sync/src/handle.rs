//! owned writer / reader handles over a shared record.
//!
//! [`VersionedRecord::split`] moves a record behind an `Arc` and hands back
//! exactly one [`Writer`] plus a [`Reader`] that can be cloned freely. the
//! writer is `Send` but neither `Clone` nor `Sync`, so at most one thread can
//! ever write through it. the record is dropped with the last handle.
//!
//! ```
//! use std::thread;
//! use vrec_sync::VersionedRecord;
//!
//! let (writer, reader) = VersionedRecord::<8>::new().split();
//!
//! let readers: Vec<_> = (0..2)
//!     .map(|_| {
//!         let reader = reader.clone();
//!         thread::spawn(move || {
//!             let snapshot = reader.read();
//!             assert!(snapshot.iter().all(|&f| f == snapshot[0]));
//!         })
//!     })
//!     .collect();
//!
//! for _ in 0..3 {
//!     writer.update(|fields| fields.iter_mut().for_each(|f| *f += 1));
//! }
//!
//! for r in readers {
//!     r.join().unwrap();
//! }
//! assert_eq!(reader.read(), [3; 8]);
//! ```

use crate::error::ReadError;
use crate::record::{Snapshot, VersionedRecord, DEFAULT_FIELD_COUNT};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use vrec_cpu::WaitStrategy;

impl<const N: usize> VersionedRecord<N> {
    /// share the record as one writer and a cloneable reader.
    pub fn split(self) -> (Writer<N>, Reader<N>) {
        let record = Arc::new(self);
        let reader = Reader {
            record: Arc::clone(&record),
        };
        let writer = Writer {
            record,
            _not_sync: PhantomData,
        };
        (writer, reader)
    }
}

/// the single write handle of a shared record.
///
/// serializing several writers (a compare-and-swap loop claiming the odd
/// version) is not provided; this handle is the only writer there is.
pub struct Writer<const N: usize = DEFAULT_FIELD_COUNT> {
    record: Arc<VersionedRecord<N>>,
    // Send, !Sync: the handle may move to the writer thread but not be shared
    _not_sync: PhantomData<Cell<()>>,
}

impl<const N: usize> Writer<N> {
    /// publish `values`. see [`VersionedRecord::write`].
    #[inline]
    pub fn write(&self, values: [u64; N]) {
        self.record.write(values);
    }

    /// read-modify-write. see [`VersionedRecord::update`].
    #[inline]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut [u64; N]),
    {
        self.record.update(f);
    }

    /// replace one field. see [`VersionedRecord::write_field`].
    #[inline]
    pub fn write_field(&self, index: usize, value: u64) {
        self.record.write_field(index, value);
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.record.version()
    }

    /// a new reader on the same record.
    pub fn reader(&self) -> Reader<N> {
        Reader {
            record: Arc::clone(&self.record),
        }
    }
}

impl<const N: usize> fmt::Debug for Writer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Writer").field(&*self.record).finish()
    }
}

/// a read handle; clone one per reader thread.
#[derive(Clone)]
pub struct Reader<const N: usize = DEFAULT_FIELD_COUNT> {
    record: Arc<VersionedRecord<N>>,
}

impl<const N: usize> Reader<N> {
    /// see [`VersionedRecord::read`].
    #[inline]
    pub fn read(&self) -> [u64; N] {
        self.record.read()
    }

    /// see [`VersionedRecord::try_read`].
    #[inline]
    pub fn try_read(&self) -> Result<[u64; N], ReadError> {
        self.record.try_read()
    }

    /// see [`VersionedRecord::read_versioned`].
    #[inline]
    pub fn read_versioned(&self) -> Snapshot<N> {
        self.record.read_versioned()
    }

    /// see [`VersionedRecord::read_versioned_with`].
    #[inline]
    pub fn read_versioned_with<W: WaitStrategy>(&self, wait: &W) -> Snapshot<N> {
        self.record.read_versioned_with(wait)
    }

    /// see [`VersionedRecord::read_with`].
    #[inline]
    pub fn read_with<W: WaitStrategy>(&self, wait: &W) -> [u64; N] {
        self.record.read_with(wait)
    }

    /// see [`VersionedRecord::read_bounded`].
    #[inline]
    pub fn read_bounded(&self, max_attempts: u32) -> Result<[u64; N], ReadError> {
        self.record.read_bounded(max_attempts)
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.record.version()
    }
}

impl<const N: usize> fmt::Debug for Reader<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reader").field(&*self.record).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use vrec_cpu::YieldingWait;

    fn assert_send<T: Send>() {}
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_handle_bounds() {
        assert_send::<Writer<8>>();
        assert_send_sync::<Reader<8>>();
    }

    #[test]
    fn test_split_shares_record() {
        let (writer, reader) = VersionedRecord::<4>::with_values([1, 2, 3, 4]).split();
        assert_eq!(reader.read(), [1, 2, 3, 4]);

        writer.write([5, 6, 7, 8]);
        assert_eq!(reader.read(), [5, 6, 7, 8]);
        assert_eq!(writer.reader().read(), [5, 6, 7, 8]);
        assert_eq!(reader.version(), 2);
        assert_eq!(writer.version(), 2);
    }

    #[test]
    fn test_reader_forwards() {
        let (writer, reader) = VersionedRecord::<2>::new().split();
        writer.write_field(0, 3);
        assert_eq!(reader.try_read(), Ok([3, 0]));
        assert_eq!(reader.read_bounded(1), Ok([3, 0]));
        assert_eq!(reader.read_with(&YieldingWait::default()), [3, 0]);

        let snapshot = reader.read_versioned();
        assert_eq!(snapshot.write_count(), 1);
    }

    #[test]
    fn test_writer_on_its_own_thread() {
        let (writer, reader) = VersionedRecord::<8>::new().split();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reader = reader.clone();
                thread::spawn(move || {
                    for _ in 0..5_000 {
                        let fields = reader.read();
                        assert!(fields.iter().all(|&f| f == fields[0]), "torn: {:?}", fields);
                    }
                })
            })
            .collect();

        let writer = thread::spawn(move || {
            for _ in 0..5_000 {
                writer.update(|fields| fields.iter_mut().for_each(|f| *f += 1));
            }
            writer
        });

        let writer = writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(reader.read(), [5_000; 8]);
        assert_eq!(writer.version(), 10_000);
    }

    #[test]
    fn test_debug() {
        let (writer, reader) = VersionedRecord::<1>::with_values([6]).split();
        assert!(format!("{:?}", writer).starts_with("Writer(VersionedRecord"));
        assert!(format!("{:?}", reader).contains("[6]"));
    }
}
