//! The real-time process callback: the one piece of this crate that runs on
//! the audio server's own thread. Every path through `process()` must
//! return quickly, never allocate, and never take a blocking lock — the
//! callback only ever touches pre-sized buffers, atomics, and a try-lock.

use jack::{AudioIn, AudioOut, Client, Control, Port, ProcessScope};

use crate::codec;
use crate::format::{FrameLayout, SampleFormat};
use crate::ring::{IoSignal, RingReader, RingWriter};
use crate::state::RunState;
use std::sync::Arc;

/// `jack-stdin`'s process callback: dequeues one period from the ring,
/// decodes it through the Codec, and writes it to the output ports.
pub struct PlaybackEngine {
    ports: Vec<Port<AudioOut>>,
    ring: RingReader,
    signal: Arc<IoSignal>,
    state: Arc<RunState>,
    format: SampleFormat,
    layout: FrameLayout,
    ring_capacity_bytes: usize,
    scratch: [u8; 4],
}

impl PlaybackEngine {
    pub fn new(
        ports: Vec<Port<AudioOut>>,
        ring: RingReader,
        signal: Arc<IoSignal>,
        state: Arc<RunState>,
        format: SampleFormat,
        layout: FrameLayout,
        ring_capacity_bytes: usize,
    ) -> Self {
        Self { ports, ring, signal, state, format, layout, ring_capacity_bytes, scratch: [0; 4] }
    }
}

impl jack::ProcessHandler for PlaybackEngine {
    fn process(&mut self, _client: &Client, ps: &ProcessScope) -> Control {
        if !self.state.can_process() {
            return Control::Continue;
        }

        let period = ps.n_frames() as usize;

        let threshold = self.state.prebuffer_threshold_bytes(self.ring_capacity_bytes);
        let avail = self.ring.read_space();
        if avail < threshold {
            return Control::Continue;
        }
        self.state.disarm_prebuffer();

        let bytes_needed = period * self.layout.bytes_per_frame();
        let short_of_data = !self.state.can_capture() || avail < bytes_needed;

        if short_of_data {
            for port in &mut self.ports {
                port.as_mut_slice(ps).iter_mut().for_each(|s| *s = 0.0);
            }
            if self.state.can_capture() {
                self.state.record_underrun();
                log::warn!("underrun: wanted {bytes_needed} bytes, ring had {avail}");
            }
            self.signal.try_notify();
            return Control::Continue;
        }

        let sample_bytes = self.format.sample_size_bytes();
        let channels = self.ports.len();

        // Ring bytes are frame-major (all channels of frame i before frame
        // i+1), so the read order below must stay frame-outer/channel-inner
        // to land each sample in the right port. `as_mut_slice` just
        // reinterprets the server's own per-cycle buffer for this port — no
        // allocation — so re-deriving it every inner iteration is fine.
        for i in 0..period {
            for c in 0..channels {
                let n = self.ring.read(&mut self.scratch[..sample_bytes]);
                debug_assert_eq!(n, sample_bytes);
                let value = codec::decode(&self.format, &self.scratch[..sample_bytes]);
                self.ports[c].as_mut_slice(ps)[i] = value;
            }
        }

        self.signal.try_notify();
        Control::Continue
    }
}

/// `jack-stdout`'s process callback: reads one period from the input ports,
/// encodes it through the Codec, and enqueues it onto the ring.
pub struct CaptureEngine {
    ports: Vec<Port<AudioIn>>,
    ring: RingWriter,
    signal: Arc<IoSignal>,
    state: Arc<RunState>,
    format: SampleFormat,
    layout: FrameLayout,
    scratch: [u8; 4],
}

impl CaptureEngine {
    pub fn new(
        ports: Vec<Port<AudioIn>>,
        ring: RingWriter,
        signal: Arc<IoSignal>,
        state: Arc<RunState>,
        format: SampleFormat,
        layout: FrameLayout,
    ) -> Self {
        Self { ports, ring, signal, state, format, layout, scratch: [0; 4] }
    }
}

impl jack::ProcessHandler for CaptureEngine {
    fn process(&mut self, _client: &Client, ps: &ProcessScope) -> Control {
        if !(self.state.can_process() && self.state.can_capture()) {
            return Control::Continue;
        }

        let period = ps.n_frames() as usize;
        let sample_bytes = self.format.sample_size_bytes();
        let bytes_per_frame = self.layout.bytes_per_frame();
        let channels = self.ports.len();

        'frames: for i in 0..period {
            if self.ring.write_space() < bytes_per_frame {
                self.state.record_overrun();
                break 'frames;
            }
            for c in 0..channels {
                let sample = self.ports[c].as_slice(ps)[i];
                codec::encode(&self.format, sample, &mut self.scratch[..sample_bytes]);
                self.ring.write(&self.scratch[..sample_bytes]);
            }
        }

        self.signal.try_notify();
        Control::Continue
    }
}
