//! Frame timing, decoupled from the display.
//!
//! The run loop asks a [`FrameClock`] for a [`FrameTick`] once per frame;
//! tests construct ticks directly with synthetic times.

use std::time::{Duration, Instant};

/// Time of one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Milliseconds since the clock started.
    pub time_ms: f64,
    /// Seconds since the previous tick, clamped to the clock's maximum step.
    pub dt:      f32,
}

impl FrameTick {
    pub fn new(time_ms: f64, dt: f32) -> Self {
        FrameTick { time_ms, dt }
    }
}

pub struct FrameClock {
    start:    Instant,
    last_ms:  Option<f64>,
    max_step: f32,
}

impl FrameClock {
    pub fn new(max_step: f32) -> Self {
        FrameClock { start: Instant::now(), last_ms: None, max_step }
    }

    /// Tick at the current wall-clock time.
    pub fn tick(&mut self) -> FrameTick {
        let elapsed = self.start.elapsed();
        self.tick_at(elapsed)
    }

    /// Tick at `elapsed` since the clock started.  The first tick has
    /// `dt = 0`; time never runs backwards.
    pub fn tick_at(&mut self, elapsed: Duration) -> FrameTick {
        let now = elapsed.as_secs_f64() * 1000.0;
        let dt = match self.last_ms {
            Some(last) => (((now - last) / 1000.0) as f32).clamp(0.0, self.max_step),
            None       => 0.0,
        };
        let now = self.last_ms.map_or(now, |last| now.max(last));
        self.last_ms = Some(now);
        FrameTick { time_ms: now, dt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_tick_has_no_step() {
        let mut clock = FrameClock::new(0.05);
        let t = clock.tick_at(Duration::from_millis(500));
        assert_eq!(t.dt, 0.0);
        assert_relative_eq!(t.time_ms, 500.0);
    }

    #[test]
    fn steps_are_measured_and_clamped() {
        let mut clock = FrameClock::new(0.05);
        clock.tick_at(Duration::from_millis(0));
        let t = clock.tick_at(Duration::from_millis(16));
        assert_relative_eq!(t.dt, 0.016, epsilon = 1e-6);
        let t = clock.tick_at(Duration::from_millis(1016));
        assert_relative_eq!(t.dt, 0.05);
    }

    #[test]
    fn time_is_monotonic() {
        let mut clock = FrameClock::new(0.05);
        clock.tick_at(Duration::from_millis(100));
        let t = clock.tick_at(Duration::from_millis(50));
        assert_eq!(t.dt, 0.0);
        assert_relative_eq!(t.time_ms, 100.0);
    }

    #[test]
    fn wall_clock_ticks_advance() {
        let mut clock = FrameClock::new(0.05);
        let a = clock.tick();
        let b = clock.tick();
        assert!(b.time_ms >= a.time_ms);
    }
}
