use std::time::{Duration, Instant};

/// Per-frame delta time source.
///
/// Delta time is clamped so a stalled or minimized window does not make the
/// demo scene jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(100))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            dt_min,
            dt_max,
        }
    }

    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock, returning the clamped delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;
        dt.as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts presented frames and reports the rate once per interval.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    interval: Duration,
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: Instant::now(),
            frames: 0,
        }
    }

    /// Records one frame. Returns the frame rate when an interval has elapsed.
    pub fn frame(&mut self) -> Option<f32> {
        self.frame_at(Instant::now())
    }

    fn frame_at(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }
}
