use crate::foundation::error::{PlayerError, PlayerResult};
use crate::playback::ledger::FlagLedger;
use crate::playback::observer::PlaybackObserver;
use crate::scene::model::Scene;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playback speed multiplier, one of `0.5`, `1`, `2`, `4`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Speed(f64);

impl Speed {
    pub const STEPS: [f64; 4] = [0.5, 1.0, 2.0, 4.0];
    pub const MIN: Self = Self(0.5);
    pub const NORMAL: Self = Self(1.0);
    pub const MAX: Self = Self(4.0);

    pub fn new(value: f64) -> PlayerResult<Self> {
        if Self::STEPS.contains(&value) {
            Ok(Self(value))
        } else {
            Err(PlayerError::config(format!(
                "speed must be one of 0.5, 1, 2, 4 (got {value})"
            )))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Next step up, clamped at 4x.
    pub fn doubled(self) -> Self {
        Self((self.0 * 2.0).min(Self::MAX.0))
    }

    /// Next step down, clamped at 0.5x.
    pub fn halved(self) -> Self {
        Self((self.0 / 2.0).max(Self::MIN.0))
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f64> for Speed {
    type Error = PlayerError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Speed> for f64 {
    fn from(s: Speed) -> Self {
        s.0
    }
}

impl FromStr for Speed {
    type Err = PlayerError;

    /// Accepts `2`, `2.0` or `2x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_suffix(['x', 'X']).unwrap_or(trimmed);
        let value: f64 = digits
            .parse()
            .map_err(|_| PlayerError::config(format!("invalid speed '{s}'")))?;
        Self::new(value)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// The mutable "now" of a player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub scene_index: usize,
    /// Seconds into the current scene.
    pub current_time: f64,
    pub playing: bool,
    pub speed: Speed,
}

/// One running per-scene loop: simulated time is `anchor_time + (now - anchor_wall) * speed`.
#[derive(Clone, Debug)]
struct TickLoop {
    scene: usize,
    anchor_wall: f64,
    anchor_time: f64,
    current_time: f64,
    last_wall: f64,
    /// Continue into the next scene when this one ends.
    chain: bool,
}

impl TickLoop {
    fn start(scene: usize, time: f64, now: f64, chain: bool) -> Self {
        Self {
            scene,
            anchor_wall: now,
            anchor_time: time,
            current_time: time,
            last_wall: now,
            chain,
        }
    }

    fn reanchor(&mut self) {
        self.anchor_time = self.current_time;
        self.anchor_wall = self.last_wall;
    }
}

enum Step {
    Continue,
    Finished,
    Stale,
}

/// Frame-driven playback clock.
///
/// Wall time is passed in by the host on every [`tick`](Self::tick) (seconds from any monotonic
/// origin), so the clock never blocks and never reads a clock itself. Each tick advances every
/// live loop, evaluates the reveal/active/bubble transitions of its scene and publishes them to
/// the observer. Pausing stops rescheduling: the next tick drops all loops.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    state: PlaybackState,
    loops: Vec<TickLoop>,
    ledger: FlagLedger,
    finished: bool,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(Speed::default())
    }
}

impl PlaybackClock {
    pub fn new(speed: Speed) -> Self {
        Self {
            state: PlaybackState {
                scene_index: 0,
                current_time: 0.0,
                playing: false,
                speed,
            },
            loops: Vec::new(),
            ledger: FlagLedger::default(),
            finished: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn ledger(&self) -> &FlagLedger {
        &self.ledger
    }

    /// Playing with at least one live loop.
    pub fn is_running(&self) -> bool {
        self.state.playing && !self.loops.is_empty()
    }

    /// The last scene completed since the most recent start.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn live_loops(&self) -> usize {
        self.loops.len()
    }

    /// Back to scene 0, time 0, stopped, with no flags. Speed is kept.
    pub fn reset(&mut self) {
        self.state.scene_index = 0;
        self.state.current_time = 0.0;
        self.state.playing = false;
        self.loops.clear();
        self.ledger.clear();
        self.finished = false;
    }

    /// Start (or resume) the current scene from the current time.
    ///
    /// Starting from time 0 is a full scene restart and clears that scene's flags.
    pub fn play(&mut self, scenes: &[Scene], now: f64) -> PlayerResult<()> {
        let index = self.state.scene_index;
        check_index(index, scenes)?;
        if self.state.current_time == 0.0 {
            self.ledger.reset_scene(index);
        }
        self.state.playing = true;
        self.finished = false;
        self.loops = vec![TickLoop::start(index, self.state.current_time, now, true)];
        tracing::debug!(scene = index, time = self.state.current_time, "playback started");
        Ok(())
    }

    pub fn pause(&mut self) {
        self.state.playing = false;
    }

    /// Returns the new `playing` value.
    pub fn toggle(&mut self, scenes: &[Scene], now: f64) -> PlayerResult<bool> {
        if self.state.playing {
            self.pause();
        } else {
            self.play(scenes, now)?;
        }
        Ok(self.state.playing)
    }

    /// Select a scene: time 0, stopped.
    pub fn navigate(&mut self, index: usize, scenes: &[Scene]) -> PlayerResult<()> {
        check_index(index, scenes)?;
        self.state.scene_index = index;
        self.state.current_time = 0.0;
        self.state.playing = false;
        self.loops.clear();
        self.finished = false;
        Ok(())
    }

    /// Restart a scene from time 0 and play it.
    pub fn restart_scene(&mut self, index: usize, scenes: &[Scene], now: f64) -> PlayerResult<()> {
        self.navigate(index, scenes)?;
        self.play(scenes, now)
    }

    /// Start an independent, non-chaining loop for every scene at once.
    pub fn play_all(&mut self, scenes: &[Scene], now: f64) -> PlayerResult<()> {
        if scenes.is_empty() {
            return Err(PlayerError::playback("no scenes loaded"));
        }
        self.state.scene_index = 0;
        self.state.current_time = 0.0;
        self.state.playing = true;
        self.finished = false;
        self.loops = (0..scenes.len())
            .map(|i| {
                self.ledger.reset_scene(i);
                TickLoop::start(i, 0.0, now, false)
            })
            .collect();
        tracing::debug!(loops = self.loops.len(), "playing all scenes");
        Ok(())
    }

    /// Set the time within the current scene, clamped to `[0, duration]`.
    ///
    /// Nothing fires here; the next tick's sweep reveals whatever the new time has passed.
    /// Events revealed past the new time stay revealed.
    pub fn seek(&mut self, time: f64, scenes: &[Scene]) -> PlayerResult<()> {
        let index = self.state.scene_index;
        check_index(index, scenes)?;
        let t = if time.is_finite() { time } else { 0.0 };
        let t = t.clamp(0.0, scenes[index].duration.max(0.0));
        self.state.current_time = t;
        if let Some(lp) = self.loops.iter_mut().find(|l| l.scene == index) {
            lp.current_time = t;
            lp.reanchor();
        }
        Ok(())
    }

    /// Seek to the start of an event of the current scene.
    pub fn jump_to_event(&mut self, event: usize, scenes: &[Scene]) -> PlayerResult<()> {
        let index = self.state.scene_index;
        check_index(index, scenes)?;
        let delay = scenes[index]
            .timeline
            .get(event)
            .map(|e| e.delay_seconds)
            .ok_or_else(|| PlayerError::playback(format!("no event {event} in scene {index}")))?;
        self.seek(delay, scenes)
    }

    /// Takes effect from the last tick onward; `current_time` is kept.
    pub fn set_speed(&mut self, speed: Speed) {
        for lp in &mut self.loops {
            lp.reanchor();
        }
        self.state.speed = speed;
    }

    /// Seconds of all scenes before the current one plus the current time.
    pub fn global_elapsed(&self, scenes: &[Scene]) -> f64 {
        scene_start(scenes, self.state.scene_index) + self.state.current_time
    }

    /// Advance every live loop to wall time `now` and publish transitions.
    pub fn tick(&mut self, now: f64, scenes: &[Scene], observer: &mut dyn PlaybackObserver) {
        if !self.state.playing {
            if !self.loops.is_empty() {
                tracing::debug!(loops = self.loops.len(), "paused, dropping tick loops");
                self.loops.clear();
            }
            return;
        }

        let mut i = 0;
        while i < self.loops.len() {
            match self.step(i, now, scenes, observer) {
                Step::Continue => i += 1,
                Step::Finished => {
                    let scene = self.loops.remove(i).scene;
                    if self.loops.is_empty() {
                        self.state.playing = false;
                        self.state.current_time = 0.0;
                        self.finished = true;
                        tracing::info!(scene, "all scenes completed");
                        observer.on_all_scenes_complete();
                    } else {
                        tracing::debug!(scene, "scene loop finished");
                    }
                }
                Step::Stale => {
                    self.loops.remove(i);
                    if self.loops.is_empty() {
                        self.state.playing = false;
                    }
                }
            }
        }
    }

    fn step(
        &mut self,
        i: usize,
        now: f64,
        scenes: &[Scene],
        observer: &mut dyn PlaybackObserver,
    ) -> Step {
        let speed = self.state.speed.get();
        let primary = i == 0;
        let lp = &mut self.loops[i];
        let Some(scene) = scenes.get(lp.scene) else {
            tracing::warn!(
                scene = lp.scene,
                scenes = scenes.len(),
                "dropping tick loop for a scene that no longer exists"
            );
            return Step::Stale;
        };

        lp.last_wall = now;
        lp.current_time = lp.anchor_time + (now - lp.anchor_wall).max(0.0) * speed;

        if lp.current_time >= scene.duration {
            let from = lp.scene;
            let next = from + 1;
            if !lp.chain || next >= scenes.len() {
                return Step::Finished;
            }
            *lp = TickLoop::start(next, 0.0, now, true);
            self.ledger.reset_scene(next);
            if primary {
                self.state.scene_index = next;
                self.state.current_time = 0.0;
            }
            tracing::debug!(from, to = next, "scene advanced");
            observer.on_scene_advanced(from, next);
        }

        let (index, t) = (lp.scene, lp.current_time);
        if primary {
            self.state.scene_index = index;
            self.state.current_time = t;
        }
        evaluate_events(&mut self.ledger, index, t, &scenes[index], observer);
        observer.on_time_updated(scene_start(scenes, index) + t);
        Step::Continue
    }
}

/// Apply the per-event transition rules of one scene at scene time `t`, in timeline order.
fn evaluate_events(
    ledger: &mut FlagLedger,
    scene_index: usize,
    t: f64,
    scene: &Scene,
    observer: &mut dyn PlaybackObserver,
) {
    for (idx, event) in scene.timeline.iter().enumerate() {
        if t >= event.start() && ledger.mark_revealed(scene_index, idx) {
            observer.on_event_revealed(scene_index, idx);
        }
        if event.is_active_at(t) {
            observer.on_event_active(scene_index, idx, t);
            if event.text().is_some() && ledger.mark_shown(scene_index, idx) {
                observer.on_bubble_shown(scene_index, idx, event);
            }
        } else {
            ledger.clear_shown(scene_index, idx);
        }
    }
}

fn scene_start(scenes: &[Scene], index: usize) -> f64 {
    scenes.iter().take(index).map(|s| s.duration).sum()
}

fn check_index(index: usize, scenes: &[Scene]) -> PlayerResult<()> {
    if index < scenes.len() {
        Ok(())
    } else {
        Err(PlayerError::playback(format!(
            "scene {index} out of range ({} loaded)",
            scenes.len()
        )))
    }
}
