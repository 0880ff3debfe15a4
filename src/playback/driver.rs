use crate::foundation::error::{PlayerError, PlayerResult};
use std::time::{Duration, Instant};

/// Wall-clock source for the frame loop.
pub trait TimeSource {
    /// Seconds since this source's origin.
    fn now(&self) -> f64;

    /// Let `dt` pass before the next frame.
    fn wait(&mut self, dt: Duration);
}

/// Real time: `Instant`-based, `wait` sleeps.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn wait(&mut self, dt: Duration) {
        std::thread::sleep(dt);
    }
}

/// Virtual time: `wait` advances instantly. Deterministic for tests and offline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualTime {
    now: f64,
}

impl ManualTime {
    pub fn at(now: f64) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, secs: f64) {
        self.now += secs;
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> f64 {
        self.now
    }

    fn wait(&mut self, dt: Duration) {
        self.advance(dt.as_secs_f64());
    }
}

/// Host frame loop standing in for an animation-frame callback.
///
/// Each iteration reads the time source, calls the frame closure, and waits one frame period.
/// The loop ends when the closure returns `false` or after `max_frames`.
#[derive(Clone, Copy, Debug)]
pub struct FrameLoop {
    period: Duration,
    max_frames: Option<u64>,
}

impl FrameLoop {
    pub fn new(fps: u32) -> PlayerResult<Self> {
        if fps == 0 {
            return Err(PlayerError::config("fps must be > 0"));
        }
        Ok(Self {
            period: Duration::from_secs_f64(1.0 / f64::from(fps)),
            max_frames: None,
        })
    }

    pub fn max_frames(mut self, n: u64) -> Self {
        self.max_frames = Some(n);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the number of frames run.
    pub fn run<T, F>(&self, time: &mut T, mut frame: F) -> u64
    where
        T: TimeSource + ?Sized,
        F: FnMut(f64) -> bool,
    {
        let mut frames = 0u64;
        loop {
            frames += 1;
            if !frame(time.now()) {
                break;
            }
            if self.max_frames.is_some_and(|max| frames >= max) {
                tracing::warn!(frames, "frame loop hit its frame limit");
                break;
            }
            time.wait(self.period);
        }
        frames
    }
}
