//! Per-scene frame accounting.

/// Counts rendered frames and derives frames-per-second over a rolling
/// one-second window of clock time.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames: u64,
    window_start: Option<f64>,
    window_frames: u32,
    fps: f64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame at clock time `t` (seconds).
    pub fn frame(&mut self, t: f64) {
        self.frames += 1;

        // The opening sample only marks the window start; the rate counts
        // frame intervals.
        let Some(start) = self.window_start else {
            self.window_start = Some(t);
            return;
        };
        self.window_frames += 1;
        let span = t - start;
        if span >= 1.0 {
            self.fps = f64::from(self.window_frames) / span;
            self.window_start = Some(t);
            self.window_frames = 0;
        } else if span < 0.0 {
            // Clock was stopped and restarted.
            self.window_start = Some(t);
            self.window_frames = 0;
        }
    }

    /// Total frames recorded.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Rate measured over the last completed window; zero until one completes.
    pub fn fps(&self) -> f64 {
        self.fps
    }
}
