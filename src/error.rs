//! Error types for the two failure domains this crate has: things that can
//! go wrong before any thread starts, and things that can go wrong in the
//! I/O Worker's loop once everything is running. The two are kept separate
//! because their recovery stories are disjoint — one aborts startup with
//! exit code 1, the other ends a thread while the rest of the process keeps
//! reporting and shuts down cleanly.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that can occur while parsing options or wiring up the audio
/// client, all reported to stderr with exit code 1 before any thread starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {option}: {detail}")]
    InvalidOption { option: &'static str, detail: String },

    #[error("no ports given: at least one destination port is required")]
    NoPorts,

    #[error("ring buffer size {rb_size} samples is too small for server period {period}")]
    RingTooSmall { rb_size: u32, period: u32 },

    #[error(
        "ring buffer size {rb_size} samples leaves no room for the pre-buffer gate to \
         open at {prebuffer}% with server period {period}"
    )]
    PrebufferUnreachable { rb_size: u32, prebuffer: f64, period: u32 },

    #[error("cannot open audio server client: {0}")]
    ClientOpen(String),

    #[error("cannot register port {0}")]
    PortRegister(String),

    #[error("cannot open file {path}: {source}")]
    FileOpen { path: PathBuf, #[source] source: std::io::Error },
}

/// Failures that can occur inside the I/O Worker's loop once the tool is
/// running. These end the worker loop but never the process directly; the
/// caller decides whether that's a clean shutdown or a reportable error.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("read error on input: {0}")]
    Read(#[source] std::io::Error),

    #[error("write error on output: {0}")]
    Write(#[source] std::io::Error),
}
