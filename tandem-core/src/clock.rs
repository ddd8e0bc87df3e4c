//! Pausable monotonic clock.
//!
//! One clock drives the animation parameter of every scene so producer and
//! consumer animate in lockstep even though they render on independent
//! devices. Time spent paused is excluded from [`Clock::now`].

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct ClockState {
    /// Origin of the running clock. `None` means stopped.
    start_time: Option<Instant>,
    /// Freeze point while paused.
    pause_time: Option<Instant>,
}

impl ClockState {
    fn elapsed_at(&self, now: Instant) -> Duration {
        match (self.start_time, self.pause_time) {
            (None, _) => Duration::ZERO,
            (Some(start), Some(paused)) => paused.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
        }
    }

    fn start_at(&mut self, now: Instant) {
        match (self.start_time, self.pause_time) {
            (Some(start), Some(paused)) => {
                self.start_time = Some(start + now.saturating_duration_since(paused));
            }
            _ => self.start_time = Some(now),
        }
        self.pause_time = None;
    }

    fn pause_at(&mut self, now: Instant) {
        if self.start_time.is_some() && self.pause_time.is_none() {
            self.pause_time = Some(now);
        }
    }
}

/// Thread-safe pausable clock.
///
/// All methods take `&self`; share it behind an `Arc` between the window
/// thread (which pauses/resumes) and the render thread (which reads it).
#[derive(Debug, Default)]
pub struct Clock {
    state: Mutex<ClockState>,
}

impl Clock {
    /// A stopped clock. `now()` reports zero until [`Clock::start`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or resume.
    ///
    /// When paused, the origin is shifted forward by the paused duration so
    /// the reported time continues from the freeze point. Otherwise the
    /// origin is reset to the current instant.
    pub fn start(&self) {
        self.lock().start_at(Instant::now());
    }

    /// Freeze the clock. No-op when stopped or already paused.
    pub fn pause(&self) {
        self.lock().pause_at(Instant::now());
    }

    /// Pause a running clock or resume a paused one, atomically. A stopped
    /// clock stays stopped. Returns `true` when the clock is now paused.
    pub fn toggle_pause(&self) -> bool {
        let now = Instant::now();
        let mut state = self.lock();
        if state.pause_time.is_some() {
            state.start_at(now);
        } else {
            state.pause_at(now);
        }
        state.pause_time.is_some()
    }

    /// Reset to the stopped state.
    pub fn stop(&self) {
        *self.lock() = ClockState::default();
    }

    /// Elapsed running time.
    pub fn now(&self) -> Duration {
        self.lock().elapsed_at(Instant::now())
    }

    /// Elapsed running time in seconds, as handed to `Scene::tick`.
    pub fn seconds(&self) -> f64 {
        self.now().as_secs_f64()
    }

    pub fn is_paused(&self) -> bool {
        self.lock().pause_time.is_some()
    }

    pub fn is_running(&self) -> bool {
        let state = self.lock();
        state.start_time.is_some() && state.pause_time.is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        // The state is plain-old-data, so a poisoned lock still holds a valid value.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
