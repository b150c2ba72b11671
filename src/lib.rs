//! jack-stdio: bridge raw interleaved PCM between stdin/stdout/a file and a
//! running audio server's ports.
//!
//! ## Modules
//!
//! - [`format`] / [`codec`] — the Codec: sample format description and the
//!   pure PCM↔float conversion functions.
//! - [`ring`] — the SPSC byte ring and the signal used to wake the I/O
//!   Worker.
//! - [`state`] — lock-free state shared between the RT Engine and the I/O
//!   Worker.
//! - [`rt_engine`] — the real-time process callbacks for both directions.
//! - [`io_worker`] — the blocking worker threads and the diagnostic
//!   reporter.
//! - [`cli`] — the shared command-line surface.
//! - [`lifecycle`] — wiring a parsed command line into a running client.
//! - [`error`] — this crate's error types.

pub mod cli;
pub mod codec;
pub mod error;
pub mod format;
pub mod io_worker;
pub mod lifecycle;
pub mod ring;
pub mod rt_engine;
pub mod state;
