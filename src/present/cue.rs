use serde::Serialize;

/// A short sine tone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Tone {
    pub frequency_hz: f64,
    pub duration_ms: u32,
    /// Peak gain, decaying exponentially to 0.01.
    pub volume: f64,
}

/// Audio cues played on clock transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// An event was revealed.
    Reveal,
    /// An active event's target cell flashed.
    GridFlash,
    /// Playback chained into the next scene.
    SceneChange,
}

impl Cue {
    pub fn tone(self) -> Tone {
        let (frequency_hz, duration_ms, volume) = match self {
            Self::Reveal => (523.0, 80, 0.04),
            Self::GridFlash => (440.0, 60, 0.03),
            Self::SceneChange => (659.0, 150, 0.06),
        };
        Tone {
            frequency_hz,
            duration_ms,
            volume,
        }
    }
}

impl std::fmt::Display for Cue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = self.tone();
        write!(f, "{}Hz/{}ms", t.frequency_hz, t.duration_ms)
    }
}
