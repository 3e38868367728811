//! Snapshot shared between the sampling task and its consumers.
//!
//! Single writer (the sampling task), two readers (render and telemetry).
//! The whole snapshot is guarded by one blocking mutex so a reader can never
//! observe fields from two different cycles.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::sample::EnvironmentSample;

/// Everything the render task needs from one sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// The latest complete sample.
    pub current: EnvironmentSample,
    /// Temperature from the previous cycle, for the climate trace segment.
    pub prev_temperature_c: f32,
    /// Humidity from the previous cycle.
    pub prev_humidity_pct: f32,
    /// Flips on every publish; the renderer appends one graph column per flip.
    pub cycle_toggle: bool,
}

impl Snapshot {
    pub const EMPTY: Self = Self {
        current: EnvironmentSample::ZERO,
        prev_temperature_c: 0.0,
        prev_humidity_pct: 0.0,
        cycle_toggle: false,
    };
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Shared measurement state, suitable for a `static`.
pub struct SharedEnvironmentState {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Snapshot>>,
}

impl SharedEnvironmentState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Snapshot::EMPTY)),
        }
    }

    /// Publish one completed cycle.
    ///
    /// Rotates the current temperature/humidity into the previous-cycle
    /// slots, installs the new sample, and flips the cycle toggle, all in a
    /// single critical section.
    pub fn publish(&self, sample: EnvironmentSample) {
        self.inner.lock(|cell| {
            let mut snap = cell.borrow_mut();
            snap.prev_temperature_c = snap.current.temperature_c;
            snap.prev_humidity_pct = snap.current.humidity_pct;
            snap.current = sample;
            snap.cycle_toggle = !snap.cycle_toggle;
        });
    }

    /// Seed the state before the tasks start so the first render never sees
    /// zeroed values. Does not flip the cycle toggle.
    pub fn prime(&self, sample: EnvironmentSample) {
        self.inner.lock(|cell| {
            let mut snap = cell.borrow_mut();
            snap.current = sample;
            snap.prev_temperature_c = sample.temperature_c;
            snap.prev_humidity_pct = sample.humidity_pct;
        });
    }

    /// Copy of the latest snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock(|cell| *cell.borrow())
    }
}

impl Default for SharedEnvironmentState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::vec::Vec;

    fn sample_with(value: f32) -> EnvironmentSample {
        EnvironmentSample {
            temperature_c: value,
            humidity_pct: value,
            pressure_hpa: value,
            eco2_ppm: value as u16,
            ..EnvironmentSample::ZERO
        }
    }

    #[test]
    fn publish_rotates_previous_cycle_slots() {
        let state = SharedEnvironmentState::new();
        state.publish(sample_with(1.0));
        state.publish(sample_with(2.0));

        let snap = state.snapshot();
        assert_eq!(snap.current.temperature_c, 2.0);
        assert_eq!(snap.prev_temperature_c, 1.0);
        assert_eq!(snap.prev_humidity_pct, 1.0);
    }

    #[test]
    fn toggle_flips_once_per_publish() {
        let state = SharedEnvironmentState::new();
        assert!(!state.snapshot().cycle_toggle);
        state.publish(sample_with(1.0));
        assert!(state.snapshot().cycle_toggle);
        state.publish(sample_with(2.0));
        assert!(!state.snapshot().cycle_toggle);
    }

    #[test]
    fn prime_seeds_both_current_and_previous_without_a_toggle() {
        let state = SharedEnvironmentState::new();
        state.prime(sample_with(5.0));

        let snap = state.snapshot();
        assert_eq!(snap.current.temperature_c, 5.0);
        assert_eq!(snap.prev_temperature_c, 5.0);
        assert!(!snap.cycle_toggle);
    }

    #[test]
    fn readers_never_observe_a_mixed_cycle() {
        // Every published sample has all fields derived from one counter, so
        // any torn read shows up as disagreeing fields.
        let state = Arc::new(SharedEnvironmentState::new());
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        let snap = state.snapshot();
                        let t = snap.current.temperature_c;
                        assert_eq!(snap.current.humidity_pct, t, "torn snapshot");
                        assert_eq!(snap.current.pressure_hpa, t, "torn snapshot");
                        assert_eq!(snap.current.eco2_ppm, t as u16, "torn snapshot");
                    }
                })
            })
            .collect();

        for i in 1..=10_000u32 {
            state.publish(sample_with(i as f32));
        }
        done.store(true, Ordering::Relaxed);

        for handle in readers {
            handle.join().unwrap();
        }

        // 10k publishes leave the toggle back where it started.
        assert!(!state.snapshot().cycle_toggle);
    }
}
