//! Frame timing.
//!
//! [`FrameClock`] is the single source of simulation time. Scheduled
//! transition events and sample timeouts are measured against
//! [`FrameClock::elapsed`], never against wall-clock timers directly.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! // once per redraw:
//! let now = clock.tick();
//! context.frame(now);
//! log::trace!("frame {} at {:.1} fps", clock.frame(), clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Tracks elapsed time, frame count and a periodically refreshed FPS estimate.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed: Duration,
    delta: Duration,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Advance to the current instant. Call once per frame.
    ///
    /// Returns the elapsed time since the clock was created.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Duration {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.elapsed = now.saturating_duration_since(self.start);
        self.frame_count += 1;

        let since_fps = now.saturating_duration_since(self.fps_update_time);
        if since_fps >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since_fps.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.elapsed
    }

    /// Elapsed time at the last tick.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time between the last two ticks.
    #[inline]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
