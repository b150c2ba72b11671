//! The non-real-time thread that moves bytes between the ring and a file
//! descriptor, one frame at a time. Blocking here is expected and fine: the
//! fd's `read`/`write` latency, and the condvar wait, are exactly what this
//! thread exists to absorb so the RT Engine never has to.

use std::io::{Read, Write};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::WorkerError;
use crate::format::FrameLayout;
use crate::ring::{IoSignal, RingReader, RingWriter};
use crate::state::RunState;

const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs the `jack-stdin` I/O Worker: read from `source` into the ring, one
/// frame at a time, until the duration limit, EOF, or a read error, then
/// drain whatever the RT side hasn't consumed yet before returning.
pub fn run_stdin_worker(
    mut source: impl Read,
    mut ring: RingWriter,
    signal: Arc<IoSignal>,
    state: Arc<RunState>,
    layout: FrameLayout,
    period: usize,
) -> Result<u64, WorkerError> {
    let bytes_per_frame = layout.bytes_per_frame();
    let mut scratch = vec![0u8; bytes_per_frame];
    let mut partial_offset = 0usize;
    let mut total_captured_frames: u64 = 0;
    let mut read_error: Option<WorkerError> = None;

    'outer: while state.running() {
        while state.can_capture() && ring.write_space() >= bytes_per_frame {
            let duration_frames = state.duration_frames();
            if duration_frames > 0 && total_captured_frames >= duration_frames {
                break 'outer; // natural end: duration reached
            }

            let remaining = bytes_per_frame - partial_offset;
            let n = match source.read(&mut scratch[partial_offset..bytes_per_frame]) {
                Ok(n) => n,
                Err(e) => {
                    read_error = Some(WorkerError::Read(e));
                    break 'outer;
                }
            };

            if n == 0 {
                break 'outer; // natural end: EOF
            }
            if n < remaining {
                partial_offset += n;
                continue;
            }

            ring.write(&scratch);
            partial_offset = 0;
            total_captured_frames += 1;
        }

        if state.running() {
            signal.wait();
        }
    }

    // Flush: drain the ring before exiting, but only once the pre-buffer
    // gate has disarmed — otherwise we'd race a still-gated RT Engine.
    // Preserves the reference's "last sub-period may be dropped" behavior:
    // the loop below exits as soon as less than one period remains. `run`
    // must still be true here, or a signal-driven shutdown racing a natural
    // end would cut this short; the flush only ends itself via `state.stop()`
    // below, never via the outer capture loop's own exit.
    while state.running() && state.prebuffer_disarmed() && ring.read_space() > period * bytes_per_frame {
        thread::sleep(FLUSH_POLL_INTERVAL);
    }

    // Duration expiry, EOF, and read errors all end capture from inside this
    // thread, not from a signal — nothing else will clear `run`, so the main
    // thread's shutdown poll would otherwise spin forever.
    state.stop();
    signal.try_notify();

    match read_error {
        Some(e) => Err(e),
        None => Ok(total_captured_frames),
    }
}

/// Runs the `jack-stdout` I/O Worker: drain the ring into `sink`, one frame
/// at a time, retrying partial writes and abandoning a frame after 5
/// consecutive write failures.
pub fn run_stdout_worker(
    mut sink: impl Write,
    mut ring: RingReader,
    signal: Arc<IoSignal>,
    state: Arc<RunState>,
    layout: FrameLayout,
) -> Result<u64, WorkerError> {
    let bytes_per_frame = layout.bytes_per_frame();
    let mut scratch = vec![0u8; bytes_per_frame];
    let mut total_captured_frames: u64 = 0;

    'outer: while state.running() {
        while state.can_capture() && ring.read_space() >= bytes_per_frame {
            let duration_frames = state.duration_frames();
            if duration_frames > 0 && total_captured_frames >= duration_frames {
                break 'outer;
            }

            ring.read(&mut scratch);

            let mut offset = 0;
            let mut consecutive_errors = 0u32;
            while offset < bytes_per_frame {
                match sink.write(&scratch[offset..]) {
                    Ok(0) => {
                        consecutive_errors += 1;
                    }
                    Ok(n) => {
                        offset += n;
                        consecutive_errors = 0;
                    }
                    Err(_) => {
                        consecutive_errors += 1;
                    }
                }
                if consecutive_errors > 5 {
                    log::error!("FATAL: write error, abandoning frame");
                    break;
                }
            }

            total_captured_frames += 1;
        }

        if state.running() {
            signal.wait();
        }
    }

    let _ = sink.flush();

    // Duration expiry ends capture from inside this thread, not from a
    // signal — nothing else would clear `run`, so the main thread's
    // shutdown poll would otherwise spin forever.
    state.stop();
    signal.try_notify();

    Ok(total_captured_frames)
}

/// Background reporter that coalesces a burst of over/underrun events into
/// at most one stderr line every ~2 seconds, mirroring the reference's
/// periodic message thread.
pub fn spawn_rate_limited_reporter(state: Arc<RunState>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_underruns = 0u64;
        let mut last_overruns = 0u64;
        while state.running() {
            thread::sleep(Duration::from_secs(2));
            let underruns = state.underruns.load(Ordering::Relaxed);
            let overruns = state.overruns.load(Ordering::Relaxed);
            if underruns != last_underruns || overruns != last_overruns {
                log::warn!("{underruns} underruns, {overruns} overruns so far");
                last_underruns = underruns;
                last_overruns = overruns;
            }
        }
    })
}
