use std::collections::BTreeMap;

/// Transient per-event playback flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventFlags {
    /// The event's start time has been reached in the current scene run.
    pub revealed: bool,
    /// The one-shot bubble/speech effect fired during the current active window.
    pub shown: bool,
}

/// Revealed/shown flags keyed by `(scene index, event index)`.
///
/// Owned by the clock; the normalized scenes are never mutated during playback. Absent keys read
/// as all-false.
#[derive(Clone, Debug, Default)]
pub struct FlagLedger {
    flags: BTreeMap<(usize, usize), EventFlags>,
}

impl FlagLedger {
    pub fn get(&self, scene: usize, event: usize) -> EventFlags {
        self.flags.get(&(scene, event)).copied().unwrap_or_default()
    }

    /// Set `revealed`; returns `true` on the Hidden -> Revealed edge.
    pub fn mark_revealed(&mut self, scene: usize, event: usize) -> bool {
        let f = self.flags.entry((scene, event)).or_default();
        !std::mem::replace(&mut f.revealed, true)
    }

    /// Set `shown`; returns `true` when it was previously unset.
    pub fn mark_shown(&mut self, scene: usize, event: usize) -> bool {
        let f = self.flags.entry((scene, event)).or_default();
        !std::mem::replace(&mut f.shown, true)
    }

    /// Re-arm the one-shot effect after leaving the active window.
    pub fn clear_shown(&mut self, scene: usize, event: usize) {
        if let Some(f) = self.flags.get_mut(&(scene, event)) {
            f.shown = false;
        }
    }

    /// Forget every flag of one scene (full restart from time 0).
    pub fn reset_scene(&mut self, scene: usize) {
        self.flags.retain(|&(s, _), _| s != scene);
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }

    pub fn revealed_count(&self, scene: usize) -> usize {
        self.flags
            .range((scene, 0)..=(scene, usize::MAX))
            .filter(|(_, f)| f.revealed)
            .count()
    }
}
