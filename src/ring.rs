//! The single-producer/single-consumer byte ring sitting between the RT
//! Engine and the I/O Worker, plus the mutex/condvar pair used to wake the
//! worker when the ring gains space or data.
//!
//! The ring itself is a thin wrapper over `ringbuf`'s heap-allocated SPSC
//! queue; this module only narrows its API down to the four operations the
//! rest of the crate actually needs (`write_space`, `read_space`, `write`,
//! `read`), matching the opaque-queue contract the RT Engine and I/O Worker
//! are written against.

use parking_lot::{Condvar, Mutex};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Producer half of the byte ring. Every method here is lock-free and
/// completes in bounded time, so it is safe to call from the RT thread.
pub struct RingWriter {
    inner: HeapProd<u8>,
}

impl RingWriter {
    pub fn write_space(&self) -> usize {
        self.inner.vacant_len()
    }

    /// Write as many of `bytes` as fit; returns the number actually written.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        self.inner.push_slice(bytes)
    }
}

/// Consumer half of the byte ring.
pub struct RingReader {
    inner: HeapCons<u8>,
}

impl RingReader {
    pub fn read_space(&self) -> usize {
        self.inner.occupied_len()
    }

    /// Read into `bytes`, filling as much as is available; returns the
    /// number actually read.
    pub fn read(&mut self, bytes: &mut [u8]) -> usize {
        self.inner.pop_slice(bytes)
    }
}

/// Touch every byte of the ring once by writing zeros through its full
/// capacity and draining them straight back out, leaving it empty. Called
/// once at startup, before either thread is running, to pre-fault the
/// backing pages now that the process may be running under realtime
/// page-locking (mirrors the reference's `memset` over the raw ring buffer).
pub fn prefault(writer: &mut RingWriter, reader: &mut RingReader) {
    let capacity = writer.write_space();
    let zeros = vec![0u8; capacity];
    let written = writer.write(&zeros);
    let mut sink = vec![0u8; written];
    let drained = reader.read(&mut sink);
    debug_assert_eq!(written, drained);
}

/// Build a byte ring of `capacity_bytes` bytes, split into its producer and
/// consumer halves. One byte of capacity is reserved by `ringbuf` itself to
/// disambiguate full from empty, matching the Ring data model's invariant.
pub fn new(capacity_bytes: usize) -> (RingWriter, RingReader) {
    let rb = HeapRb::<u8>::new(capacity_bytes);
    let (producer, consumer) = rb.split();
    (RingWriter { inner: producer }, RingReader { inner: consumer })
}

/// The mutex + condvar pair the RT Engine signals and the I/O Worker waits
/// on. The RT side must only ever `try_lock`; the worker is the only side
/// that blocks in `wait`.
#[derive(Default)]
pub struct IoSignal {
    data_ready: Mutex<bool>,
    condvar: Condvar,
}

impl IoSignal {
    pub fn new() -> Self {
        Self { data_ready: Mutex::new(false), condvar: Condvar::new() }
    }

    /// Called from the RT thread. Never blocks: if the lock is contended the
    /// signal is simply dropped, since the worker polls ring state on every
    /// wake regardless of whether it was signaled (see the try-lock
    /// invariant in the design notes).
    pub fn try_notify(&self) {
        if let Some(mut guard) = self.data_ready.try_lock() {
            *guard = true;
            self.condvar.notify_one();
        }
    }

    /// Called from the I/O Worker. Blocks until notified, then clears the
    /// flag and returns.
    pub fn wait(&self) {
        let mut guard = self.data_ready.lock();
        if !*guard {
            self.condvar.wait(&mut guard);
        }
        *guard = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spsc_roundtrip_preserves_byte_stream() {
        let (mut writer, mut reader) = new(64);
        let payload: Vec<u8> = (0..40).collect();
        let written = writer.write(&payload);
        assert_eq!(written, payload.len());

        let mut out = vec![0u8; payload.len()];
        let read = reader.read(&mut out);
        assert_eq!(read, payload.len());
        assert_eq!(out, payload);
    }

    #[test]
    fn write_space_and_read_space_are_complementary() {
        let (mut writer, reader) = new(16);
        assert_eq!(writer.write_space(), 15); // one slot reserved
        assert_eq!(reader.read_space(), 0);
        writer.write(&[1, 2, 3]);
        assert_eq!(reader.read_space(), 3);
        assert_eq!(writer.write_space(), 12);
    }

    #[test]
    fn partial_write_reports_actual_bytes_written() {
        let (mut writer, _reader) = new(4); // 3 usable bytes
        let written = writer.write(&[1, 2, 3, 4, 5]);
        assert_eq!(written, 3);
    }

    #[test]
    fn frame_sized_chunks_stay_aligned_across_many_writes() {
        let bytes_per_frame = 4;
        let (mut writer, mut reader) = new(64);
        for frame in 0u8..10 {
            let chunk = [frame; 4];
            writer.write(&chunk);
        }
        assert_eq!(reader.read_space() % bytes_per_frame, 0);
        let mut scratch = [0u8; 4];
        while reader.read_space() >= bytes_per_frame {
            let n = reader.read(&mut scratch);
            assert_eq!(n, bytes_per_frame);
        }
    }
}
