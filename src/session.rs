use crate::config::{DisplayMode, Preferences};
use crate::foundation::error::{LoadError, PlayerError, PlayerResult};
use crate::normalize::diag::Diagnostic;
use crate::normalize::{self, load_document};
use crate::playback::autoplay::AutoPlay;
use crate::playback::clock::{PlaybackClock, PlaybackState, Speed};
use crate::playback::observer::PlaybackObserver;
use crate::present::narration::{Narrator, Utterance};
use crate::scene::model::{DocumentKind, Event, ParsedDocument, Scene};
use serde_json::Value;

/// Result of a load that did not hard-fail.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// The new document replaced the previous one.
    Loaded {
        kind: DocumentKind,
        title: String,
        scenes: usize,
        diagnostics: Vec<Diagnostic>,
    },
    /// Valid input without scenes; the previous document was kept.
    Empty {
        kind: DocumentKind,
        diagnostics: Vec<Diagnostic>,
    },
}

impl LoadOutcome {
    /// The user-facing warning for an empty result.
    pub fn warning(&self) -> Option<PlayerError> {
        match self {
            Self::Loaded { .. } => None,
            Self::Empty { .. } => Some(PlayerError::EmptyResult),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Loaded { diagnostics, .. } | Self::Empty { diagnostics, .. } => diagnostics,
        }
    }
}

/// Abstract keyboard input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Space,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Digit(u8),
    Char(char),
}

/// What a key press did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyAction {
    Playing(bool),
    Navigated(usize),
    SpeedChanged(Speed),
    Narration(bool),
    PanelDismissed,
    Ignored,
}

/// One player: the loaded document, the clock, and the user-facing toggles.
///
/// A successful load replaces the document wholesale and resets the clock; a failed or empty load
/// leaves everything as it was.
pub struct PlayerSession {
    document: Option<ParsedDocument>,
    clock: PlaybackClock,
    autoplay: AutoPlay,
    narration: bool,
    display_mode: DisplayMode,
    panel_open: bool,
    narrator: Option<Box<dyn Narrator>>,
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self::new(&Preferences::default())
    }
}

impl std::fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("scenes", &self.scenes().len())
            .field("state", self.clock.state())
            .field("narration", &self.narration)
            .field("display_mode", &self.display_mode)
            .finish_non_exhaustive()
    }
}

impl PlayerSession {
    pub fn new(prefs: &Preferences) -> Self {
        Self {
            document: None,
            clock: PlaybackClock::new(prefs.speed),
            autoplay: AutoPlay::default(),
            narration: prefs.narration,
            display_mode: prefs.display_mode,
            panel_open: false,
            narrator: None,
        }
    }

    pub fn with_narrator(mut self, narrator: Box<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn document(&self) -> Option<&ParsedDocument> {
        self.document.as_ref()
    }

    pub fn scenes(&self) -> &[Scene] {
        scenes_of(&self.document)
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.scenes().get(self.clock.state().scene_index)
    }

    pub fn state(&self) -> &PlaybackState {
        self.clock.state()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Parse JSON text and replace the current document.
    pub fn load(&mut self, text: &str) -> Result<LoadOutcome, LoadError> {
        let doc = load_document(text).inspect_err(|e| tracing::error!("load failed: {e}"))?;
        Ok(self.replace(doc))
    }

    pub fn load_value(&mut self, value: &Value) -> Result<LoadOutcome, LoadError> {
        let doc = normalize::normalize(value).inspect_err(|e| tracing::error!("load failed: {e}"))?;
        Ok(self.replace(doc))
    }

    /// Install a normalized document unless it has no scenes.
    pub fn replace(&mut self, doc: ParsedDocument) -> LoadOutcome {
        if doc.scenes.is_empty() {
            tracing::warn!(kind = %doc.kind, "no scenes found in data, keeping previous document");
            return LoadOutcome::Empty {
                kind: doc.kind,
                diagnostics: doc.diagnostics,
            };
        }
        self.autoplay.stop(&mut self.clock);
        self.clock.reset();
        let outcome = LoadOutcome::Loaded {
            kind: doc.kind,
            title: doc.title.clone(),
            scenes: doc.scenes.len(),
            diagnostics: doc.diagnostics.clone(),
        };
        tracing::info!(kind = %doc.kind, scenes = doc.scenes.len(), "loaded {}", doc.title);
        self.document = Some(doc);
        outcome
    }

    /// Select a scene: time 0, stopped. Closes the auxiliary panel.
    pub fn navigate(&mut self, index: usize) -> PlayerResult<()> {
        let scenes = scenes_of(&self.document);
        self.clock.navigate(index, scenes)?;
        self.panel_open = false;
        Ok(())
    }

    pub fn toggle_play(&mut self, now: f64) -> PlayerResult<bool> {
        let scenes = scenes_of(&self.document);
        self.clock.toggle(scenes, now)
    }

    /// Play every scene at once, each on its own loop.
    pub fn play_all(&mut self, now: f64) -> PlayerResult<()> {
        let scenes = scenes_of(&self.document);
        self.clock.play_all(scenes, now)
    }

    pub fn start_auto_play(&mut self, now: f64) -> PlayerResult<()> {
        let scenes = scenes_of(&self.document);
        self.autoplay.start(&mut self.clock, scenes, now)
    }

    pub fn stop_auto_play(&mut self) {
        self.autoplay.stop(&mut self.clock);
    }

    pub fn auto_play_enabled(&self) -> bool {
        self.autoplay.is_enabled()
    }

    pub fn seek(&mut self, time: f64) -> PlayerResult<()> {
        let scenes = scenes_of(&self.document);
        self.clock.seek(time, scenes)
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.clock.set_speed(speed);
    }

    pub fn narration(&self) -> bool {
        self.narration
    }

    /// Returns the new setting. Turning narration off silences the narrator.
    pub fn toggle_narration(&mut self) -> bool {
        self.narration = !self.narration;
        if !self.narration
            && let Some(n) = self.narrator.as_deref_mut()
        {
            n.cancel();
        }
        self.narration
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn toggle_display_mode(&mut self) -> DisplayMode {
        self.display_mode = self.display_mode.toggled();
        self.display_mode
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            speed: self.clock.state().speed,
            narration: self.narration,
            display_mode: self.display_mode,
        }
    }

    /// Apply one key press. Keys are ignored while nothing is loaded.
    pub fn handle_key(&mut self, key: Key, now: f64) -> PlayerResult<KeyAction> {
        let count = self.scenes().len();
        if count == 0 {
            return Ok(KeyAction::Ignored);
        }
        let index = self.clock.state().scene_index;
        let action = match key {
            Key::Space => KeyAction::Playing(self.toggle_play(now)?),
            Key::Left if index > 0 => {
                self.navigate(index - 1)?;
                KeyAction::Navigated(index - 1)
            }
            Key::Right if index + 1 < count => {
                self.navigate(index + 1)?;
                KeyAction::Navigated(index + 1)
            }
            Key::Up => {
                let speed = self.clock.state().speed.doubled();
                self.set_speed(speed);
                KeyAction::SpeedChanged(speed)
            }
            Key::Down => {
                let speed = self.clock.state().speed.halved();
                self.set_speed(speed);
                KeyAction::SpeedChanged(speed)
            }
            Key::Char('t' | 'T') => KeyAction::Narration(self.toggle_narration()),
            Key::Digit(n) if usize::from(n) < count => {
                self.navigate(usize::from(n))?;
                KeyAction::Navigated(usize::from(n))
            }
            Key::Escape => {
                self.panel_open = false;
                KeyAction::PanelDismissed
            }
            _ => KeyAction::Ignored,
        };
        tracing::debug!(?key, ?action, "key");
        Ok(action)
    }

    /// Advance one host frame. Returns whether anything is still running.
    pub fn frame(&mut self, now: f64, observer: &mut dyn PlaybackObserver) -> bool {
        let Some(doc) = &self.document else {
            return false;
        };
        let mut sink = NarratingObserver {
            inner: observer,
            narrator: if self.narration {
                self.narrator.as_deref_mut()
            } else {
                None
            },
            speed: self.clock.state().speed,
        };
        self.clock.tick(now, &doc.scenes, &mut sink);
        let auto = self.autoplay.poll(now, &mut self.clock, &doc.scenes);
        self.clock.is_running() || auto
    }

    pub fn global_elapsed(&self) -> f64 {
        self.clock.global_elapsed(self.scenes())
    }

    pub fn total_duration(&self) -> f64 {
        self.document.as_ref().map_or(0.0, ParsedDocument::total_duration)
    }

    /// Global progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let total = self.total_duration();
        if total > 0.0 {
            (self.global_elapsed() / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn scenes_of(doc: &Option<ParsedDocument>) -> &[Scene] {
    doc.as_ref().map_or(&[][..], |d| d.scenes.as_slice())
}

/// Forwards every signal and speaks bubbles when a narrator is attached.
struct NarratingObserver<'a> {
    inner: &'a mut dyn PlaybackObserver,
    narrator: Option<&'a mut (dyn Narrator + 'static)>,
    speed: Speed,
}

impl PlaybackObserver for NarratingObserver<'_> {
    fn on_event_revealed(&mut self, scene: usize, event: usize) {
        self.inner.on_event_revealed(scene, event);
    }

    fn on_event_active(&mut self, scene: usize, event: usize, scene_time: f64) {
        self.inner.on_event_active(scene, event, scene_time);
    }

    fn on_bubble_shown(&mut self, scene: usize, index: usize, event: &Event) {
        self.inner.on_bubble_shown(scene, index, event);
        if let Some(narrator) = self.narrator.as_deref_mut()
            && let Some(u) = Utterance::for_event(event, self.speed)
        {
            narrator.cancel();
            narrator.speak(&u);
        }
    }

    fn on_scene_advanced(&mut self, from: usize, to: usize) {
        self.inner.on_scene_advanced(from, to);
    }

    fn on_all_scenes_complete(&mut self) {
        self.inner.on_all_scenes_complete();
    }

    fn on_time_updated(&mut self, global_elapsed: f64) {
        self.inner.on_time_updated(global_elapsed);
    }
}
