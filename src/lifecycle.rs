//! Everything between a parsed command line and a running audio client:
//! validating the ring/pre-buffer geometry, opening the client, registering
//! and connecting ports, wiring the RT Engine to the I/O Worker, installing
//! signal handlers, and reporting the final tally on the way out.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jack::{AudioIn, AudioOut, Client, ClientOptions};

use crate::cli::{StdinArgs, StdoutArgs};
use crate::error::ConfigError;
use crate::format::FrameLayout;
use crate::io_worker::{self, run_stdin_worker, run_stdout_worker};
use crate::ring::{self, IoSignal};
use crate::rt_engine::{CaptureEngine, PlaybackEngine};
use crate::state::RunState;

/// Set by the signal handler, polled nowhere on the RT thread — only the
/// main thread checks it, to turn a SIGHUP/SIGINT into a cooperative
/// shutdown of `RunState::run`.
static SIGNAL_RAISED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_termination_signal(_signum: libc::c_int) {
    SIGNAL_RAISED.store(true, Ordering::Release);
}

fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGINT, handle_termination_signal as libc::sighandler_t);
        libc::signal(libc::SIGHUP, handle_termination_signal as libc::sighandler_t);
    }
}

/// Validate the ring size against the server's period and, for `jack-stdin`,
/// against the requested pre-buffer percentage, per the same rule the RT
/// Engine itself enforces at runtime.
fn validate_ring_geometry(
    rb_size_frames: u32,
    period: u32,
    prebuffer_percent: Option<f64>,
) -> Result<(), ConfigError> {
    if rb_size_frames / 2 < period {
        return Err(ConfigError::RingTooSmall { rb_size: rb_size_frames, period });
    }
    if let Some(prebuffer_percent) = prebuffer_percent {
        let threshold_frames = (rb_size_frames as f64 * prebuffer_percent / 100.0).ceil() as u32;
        if rb_size_frames.saturating_sub(threshold_frames) < period {
            return Err(ConfigError::PrebufferUnreachable {
                rb_size: rb_size_frames,
                prebuffer: prebuffer_percent,
                period,
            });
        }
    }
    Ok(())
}

fn open_client(name: &str) -> Result<Client, ConfigError> {
    let (client, _status) =
        Client::new(name, ClientOptions::NO_START_SERVER).map_err(|e| ConfigError::ClientOpen(e.to_string()))?;
    Ok(client)
}

fn connect_nonfatal(client: &Client, from: &str, to: &str) {
    if let Err(e) = client.connect_ports_by_name(from, to) {
        log::warn!("could not connect {from} to {to}: {e} (continuing)");
    }
}

fn report(state: &RunState, quiet: bool) {
    if quiet {
        return;
    }
    log::info!(
        "stopped: {} underruns, {} overruns",
        state.underruns(),
        state.overruns()
    );
}

/// Run `jack-stdin`: read PCM from `source` (stdin or a file) and play it
/// out through newly registered output ports connected to `args.ports`.
pub fn run_stdin(args: StdinArgs, source: Box<dyn Read + Send>) -> Result<(), ConfigError> {
    let common = &args.common;
    if !common.quiet {
        log::info!("jack-stdin starting");
    }

    let format = common.sample_format()?;
    let channels = common.channels()?;
    let prebuffer_percent = args.prebuffer_percent();

    let client = open_client("jack-stdin")?;
    let period = client.buffer_size();
    let sample_rate = client.sample_rate();

    validate_ring_geometry(common.bufsize, period, Some(prebuffer_percent))?;

    let layout = FrameLayout::new(&format, channels);
    let ring_capacity_bytes = common.bufsize as usize * layout.bytes_per_frame();
    let (mut ring_writer, mut ring_reader) = ring::new(ring_capacity_bytes);

    let mut ports = Vec::with_capacity(channels);
    for i in 0..channels {
        let port = client
            .register_port(&format!("input{}", i + 1), AudioOut::default())
            .map_err(|e| ConfigError::PortRegister(e.to_string()))?;
        ports.push(port);
    }
    for (i, port) in ports.iter().enumerate() {
        if let Ok(name) = port.name() {
            connect_nonfatal(&client, &name, &args.common.ports[i]);
        }
    }

    let duration_frames = if common.duration > 0.0 {
        (common.duration * sample_rate as f64).round() as u64
    } else {
        0
    };

    let state = Arc::new(RunState::new(prebuffer_percent, duration_frames));
    let signal = Arc::new(IoSignal::new());

    ring::prefault(&mut ring_writer, &mut ring_reader);

    let engine = PlaybackEngine::new(
        ports,
        ring_reader,
        Arc::clone(&signal),
        Arc::clone(&state),
        format,
        layout,
        ring_capacity_bytes,
    );

    state.set_can_process();
    let active_client = client
        .activate_async((), engine)
        .map_err(|e| ConfigError::ClientOpen(e.to_string()))?;

    install_signal_handlers();

    let reporter = io_worker::spawn_rate_limited_reporter(Arc::clone(&state));

    let worker_state = Arc::clone(&state);
    let worker_signal = Arc::clone(&signal);
    let worker = std::thread::spawn(move || {
        run_stdin_worker(source, ring_writer, worker_signal, worker_state, layout, period as usize)
    });

    state.set_can_capture();

    while state.running() {
        if SIGNAL_RAISED.load(Ordering::Acquire) {
            state.stop();
            signal.try_notify();
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    state.stop();
    signal.try_notify();

    let captured = worker.join().expect("I/O Worker panicked").unwrap_or(0);
    log::debug!("captured {captured} frames");
    let _ = reporter; // detached: exits on its own once state.running() is false

    active_client.deactivate().ok();
    report(&state, common.quiet);
    Ok(())
}

/// Run `jack-stdout`: register input ports connected to `args.ports`, and
/// write whatever arrives on them to `sink` (stdout).
pub fn run_stdout(args: StdoutArgs, sink: Box<dyn Write + Send>) -> Result<(), ConfigError> {
    let common = &args.common;
    if !common.quiet {
        log::info!("jack-stdout starting");
    }

    let format = common.sample_format()?;
    let channels = common.channels()?;

    let client = open_client("jack-stdout")?;
    let period = client.buffer_size();
    let sample_rate = client.sample_rate();

    validate_ring_geometry(common.bufsize, period, None)?;

    let layout = FrameLayout::new(&format, channels);
    let ring_capacity_bytes = common.bufsize as usize * layout.bytes_per_frame();
    let (mut ring_writer, mut ring_reader) = ring::new(ring_capacity_bytes);

    let mut ports = Vec::with_capacity(channels);
    for i in 0..channels {
        let port = client
            .register_port(&format!("input{}", i + 1), AudioIn::default())
            .map_err(|e| ConfigError::PortRegister(e.to_string()))?;
        ports.push(port);
    }
    for (i, port) in ports.iter().enumerate() {
        if let Ok(name) = port.name() {
            connect_nonfatal(&client, &args.common.ports[i], &name);
        }
    }

    let duration_frames = if common.duration > 0.0 {
        (common.duration * sample_rate as f64).round() as u64
    } else {
        0
    };

    let state = Arc::new(RunState::new(0.0, duration_frames));
    let signal = Arc::new(IoSignal::new());

    ring::prefault(&mut ring_writer, &mut ring_reader);

    let engine = CaptureEngine::new(ports, ring_writer, Arc::clone(&signal), Arc::clone(&state), format, layout);

    state.set_can_process();
    let active_client = client
        .activate_async((), engine)
        .map_err(|e| ConfigError::ClientOpen(e.to_string()))?;

    install_signal_handlers();

    let reporter = io_worker::spawn_rate_limited_reporter(Arc::clone(&state));

    let worker_state = Arc::clone(&state);
    let worker_signal = Arc::clone(&signal);
    let worker = std::thread::spawn(move || run_stdout_worker(sink, ring_reader, worker_signal, worker_state, layout));

    state.set_can_capture();

    while state.running() {
        if SIGNAL_RAISED.load(Ordering::Acquire) {
            state.stop();
            signal.try_notify();
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    state.stop();
    signal.try_notify();

    let captured = worker.join().expect("I/O Worker panicked").unwrap_or(0);
    log::debug!("captured {captured} frames");
    let _ = reporter;

    active_client.deactivate().ok();
    report(&state, common.quiet);
    Ok(())
}

/// Resolve the `jack-stdin`-only `-f/--file` option into a source, falling
/// back to stdin when absent.
pub fn open_source(args: &StdinArgs) -> Result<Box<dyn Read + Send>, ConfigError> {
    match &args.file {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|source| ConfigError::FileOpen { path: path.clone(), source })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}
