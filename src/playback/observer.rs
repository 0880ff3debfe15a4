use crate::scene::model::Event;

/// Collaborator notified of clock transitions.
///
/// All methods default to no-ops, so a presentation layer implements only the signals it
/// renders. Calls happen synchronously inside [`PlaybackClock::tick`](super::clock::PlaybackClock::tick).
pub trait PlaybackObserver {
    /// Hidden -> Revealed, once per scene run.
    fn on_event_revealed(&mut self, _scene: usize, _event: usize) {}

    /// Every tick while `start <= t < end`; `scene_time` is `t`.
    fn on_event_active(&mut self, _scene: usize, _event: usize, _scene_time: f64) {}

    /// One-shot bubble/speech effect on entering the active window with text.
    fn on_bubble_shown(&mut self, _scene: usize, _index: usize, _event: &Event) {}

    fn on_scene_advanced(&mut self, _from: usize, _to: usize) {}

    fn on_all_scenes_complete(&mut self) {}

    /// Global elapsed seconds (previous scene durations plus the current time).
    fn on_time_updated(&mut self, _global_elapsed: f64) {}
}

/// Observer that ignores every signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl PlaybackObserver for NullObserver {}

impl<T: PlaybackObserver + ?Sized> PlaybackObserver for &mut T {
    fn on_event_revealed(&mut self, scene: usize, event: usize) {
        (**self).on_event_revealed(scene, event)
    }
    fn on_event_active(&mut self, scene: usize, event: usize, scene_time: f64) {
        (**self).on_event_active(scene, event, scene_time)
    }
    fn on_bubble_shown(&mut self, scene: usize, index: usize, event: &Event) {
        (**self).on_bubble_shown(scene, index, event)
    }
    fn on_scene_advanced(&mut self, from: usize, to: usize) {
        (**self).on_scene_advanced(from, to)
    }
    fn on_all_scenes_complete(&mut self) {
        (**self).on_all_scenes_complete()
    }
    fn on_time_updated(&mut self, global_elapsed: f64) {
        (**self).on_time_updated(global_elapsed)
    }
}

/// A recorded clock transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    Revealed { scene: usize, event: usize },
    Active { scene: usize, event: usize },
    Bubble { scene: usize, event: usize },
    SceneAdvanced { from: usize, to: usize },
    AllComplete,
    TimeUpdated(f64),
}

/// Observer that appends every signal to a list. Used by tests and the CLI.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    pub signals: Vec<Signal>,
    /// Level-triggered signals (`Active`, `TimeUpdated`) are dropped unless set.
    pub record_level: bool,
}

impl RecordingObserver {
    pub fn with_level_signals() -> Self {
        Self {
            signals: Vec::new(),
            record_level: true,
        }
    }

    pub fn take(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    pub fn count(&self, pred: impl Fn(&Signal) -> bool) -> usize {
        self.signals.iter().filter(|s| pred(s)).count()
    }
}

impl PlaybackObserver for RecordingObserver {
    fn on_event_revealed(&mut self, scene: usize, event: usize) {
        self.signals.push(Signal::Revealed { scene, event });
    }

    fn on_event_active(&mut self, scene: usize, event: usize, _scene_time: f64) {
        if self.record_level {
            self.signals.push(Signal::Active { scene, event });
        }
    }

    fn on_bubble_shown(&mut self, scene: usize, index: usize, _event: &Event) {
        self.signals.push(Signal::Bubble {
            scene,
            event: index,
        });
    }

    fn on_scene_advanced(&mut self, from: usize, to: usize) {
        self.signals.push(Signal::SceneAdvanced { from, to });
    }

    fn on_all_scenes_complete(&mut self) {
        self.signals.push(Signal::AllComplete);
    }

    fn on_time_updated(&mut self, global_elapsed: f64) {
        if self.record_level {
            self.signals.push(Signal::TimeUpdated(global_elapsed));
        }
    }
}
