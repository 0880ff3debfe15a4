use crate::foundation::error::PlayerResult;
use crate::playback::clock::PlaybackClock;
use crate::scene::model::Scene;

/// Seconds between auto-play supervisor polls.
pub const AUTO_PLAY_POLL_SECS: f64 = 0.5;

/// Supervisory auto-play mode layered above the clock's tick loops.
///
/// On a coarse poll it checks whether the current scene has run out and, if so, restarts the
/// clock on the next scene; it switches itself off once the last scene is done.
#[derive(Clone, Debug, Default)]
pub struct AutoPlay {
    enabled: bool,
    next_poll: f64,
}

impl AutoPlay {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable and start playing from the first scene.
    pub fn start(&mut self, clock: &mut PlaybackClock, scenes: &[Scene], now: f64) -> PlayerResult<()> {
        clock.restart_scene(0, scenes, now)?;
        self.enabled = true;
        self.next_poll = now + AUTO_PLAY_POLL_SECS;
        tracing::debug!("auto-play enabled");
        Ok(())
    }

    /// Disable and pause the clock.
    pub fn stop(&mut self, clock: &mut PlaybackClock) {
        if self.enabled {
            tracing::debug!("auto-play disabled");
        }
        self.enabled = false;
        clock.pause();
    }

    /// Run one supervisor check if the poll period has elapsed.
    ///
    /// Returns whether auto-play is still enabled.
    pub fn poll(&mut self, now: f64, clock: &mut PlaybackClock, scenes: &[Scene]) -> bool {
        if !self.enabled {
            return false;
        }
        if now < self.next_poll {
            return true;
        }
        self.next_poll = now + AUTO_PLAY_POLL_SECS;

        if clock.is_finished() {
            self.stop(clock);
            return false;
        }
        let state = clock.state();
        let index = state.scene_index;
        let Some(scene) = scenes.get(index) else {
            self.stop(clock);
            return false;
        };
        if state.current_time >= scene.duration {
            if index + 1 < scenes.len() {
                if let Err(e) = clock.restart_scene(index + 1, scenes, now) {
                    tracing::warn!("auto-play could not advance: {e}");
                    self.stop(clock);
                }
            } else {
                self.stop(clock);
            }
        }
        self.enabled
    }
}
