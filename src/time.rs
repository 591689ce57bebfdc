//! Frame timing.

use std::time::{Duration, Instant};

/// Gaps longer than this are treated as stalls rather than real frame times.
pub const MAX_FRAME_GAP: Duration = Duration::from_secs(1);

/// The delta reported in place of a stall, one frame at 60 Hz.
pub const FIXED_STEP: f32 = 1.0 / 60.0;

/// Tracks wall-clock time between frames.
///
/// A debugger pause or a long hitch would otherwise produce a huge delta, so any gap
/// longer than [`MAX_FRAME_GAP`] is reported as [`FIXED_STEP`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    previous: Option<Instant>,
    current: Option<Instant>,
    delta_time: f32,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of the first frame.
    pub fn init(&mut self) {
        self.init_at(Instant::now());
    }

    pub fn init_at(&mut self, now: Instant) {
        self.previous = None;
        self.current = Some(now);
        self.delta_time = 0.0;
    }

    /// Advances to the current instant.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Advances to `now`. Without a prior [`Time::init`] the delta is zero.
    pub fn update_at(&mut self, now: Instant) {
        self.previous = self.current;
        self.current = Some(now);
        self.delta_time = match self.previous {
            Some(previous) => {
                let gap = now.saturating_duration_since(previous);
                if gap > MAX_FRAME_GAP {
                    FIXED_STEP
                } else {
                    gap.as_secs_f32()
                }
            }
            None => 0.0,
        };
    }

    /// Seconds between the last two updates.
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }
}
