//! Process-wide run state shared by reference between the RT Engine and the
//! I/O Worker. Every field is either read-mostly, single-writer, or a
//! counter whose exact interleaving across threads is non-critical, so
//! plain atomics suffice — no field here is ever protected by a lock.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Shared, lock-free state for one running instance of either tool.
///
/// Created once on the main thread before either the RT Engine or the I/O
/// Worker starts, and dropped only after both have joined.
pub struct RunState {
    /// Set once ports are registered and connected; gates the RT callback.
    pub can_process: AtomicBool,
    /// Set once the I/O Worker has been launched; gates RT data flow.
    pub can_capture: AtomicBool,
    /// Cleared by a signal handler, EOF, or duration expiry.
    pub run: AtomicBool,
    /// Pre-buffer threshold in tenths of a percent (0..=900 for 0.0..=90.0%).
    /// Set to 0 permanently once the gate has been passed once.
    pub prebuffer_tenths_percent: AtomicU32,
    /// 0 means unlimited.
    pub duration_frames: AtomicU64,
    pub underruns: AtomicU64,
    pub overruns: AtomicU64,
}

impl RunState {
    pub fn new(prebuffer_percent: f64, duration_frames: u64) -> Self {
        Self {
            can_process: AtomicBool::new(false),
            can_capture: AtomicBool::new(false),
            run: AtomicBool::new(true),
            prebuffer_tenths_percent: AtomicU32::new((prebuffer_percent * 10.0).round() as u32),
            duration_frames: AtomicU64::new(duration_frames),
            underruns: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
        }
    }

    pub fn can_process(&self) -> bool {
        self.can_process.load(Ordering::Acquire)
    }

    pub fn set_can_process(&self) {
        self.can_process.store(true, Ordering::Release);
    }

    pub fn can_capture(&self) -> bool {
        self.can_capture.load(Ordering::Acquire)
    }

    pub fn set_can_capture(&self) {
        self.can_capture.store(true, Ordering::Release);
    }

    pub fn running(&self) -> bool {
        self.run.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.run.store(false, Ordering::Release);
    }

    /// Required occupancy, in bytes, for the pre-buffer gate given the
    /// ring's total capacity. Returns 0 once the gate has disarmed.
    pub fn prebuffer_threshold_bytes(&self, ring_capacity_bytes: usize) -> usize {
        let tenths = self.prebuffer_tenths_percent.load(Ordering::Relaxed) as u64;
        // ceil(capacity * tenths / 1000)
        ((ring_capacity_bytes as u64 * tenths + 999) / 1000) as usize
    }

    /// Disarm the pre-buffer gate permanently; it must never re-engage.
    pub fn disarm_prebuffer(&self) {
        self.prebuffer_tenths_percent.store(0, Ordering::Relaxed);
    }

    /// True once the pre-buffer gate has disarmed (either it started at 0%,
    /// or the RT Engine has passed it once).
    pub fn prebuffer_disarmed(&self) -> bool {
        self.prebuffer_tenths_percent.load(Ordering::Relaxed) == 0
    }

    pub fn duration_frames(&self) -> u64 {
        self.duration_frames.load(Ordering::Relaxed)
    }

    pub fn record_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prebuffer_zero_is_satisfied_immediately() {
        let state = RunState::new(0.0, 0);
        assert_eq!(state.prebuffer_threshold_bytes(1024), 0);
    }

    #[test]
    fn prebuffer_disarms_permanently() {
        let state = RunState::new(50.0, 0);
        assert_eq!(state.prebuffer_threshold_bytes(1000), 500);
        assert!(!state.prebuffer_disarmed());
        state.disarm_prebuffer();
        assert_eq!(state.prebuffer_threshold_bytes(1000), 0);
        assert!(state.prebuffer_disarmed());
    }

    #[test]
    fn counters_accumulate_independently() {
        let state = RunState::new(25.0, 0);
        state.record_underrun();
        state.record_underrun();
        state.record_overrun();
        assert_eq!(state.underruns(), 2);
        assert_eq!(state.overruns(), 1);
    }
}
