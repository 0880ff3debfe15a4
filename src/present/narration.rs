use crate::playback::clock::Speed;
use crate::scene::model::Event;
use serde::Serialize;

/// Average speaking pace at rate 1.0, in words per second.
const WORDS_PER_SEC: f64 = 2.5;
const MIN_SPEECH_SECS: f64 = 2.0;

/// Parameters for one spoken line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
}

impl Utterance {
    /// `thinking` is pitched lower than everything else; rate follows playback speed,
    /// slightly slowed.
    pub fn new(text: impl Into<String>, display_type: &str, speed: Speed) -> Self {
        let pitch = if display_type == "thinking" { 0.9 } else { 1.1 };
        Self {
            text: text.into(),
            rate: speed.get() * 0.9,
            pitch,
            volume: 1.0,
        }
    }

    /// `None` for events without text.
    pub fn for_event(event: &Event, speed: Speed) -> Option<Self> {
        event
            .text()
            .map(|text| Self::new(text, &event.display_type, speed))
    }

    pub fn estimated_secs(&self) -> f64 {
        speech_duration_secs(&self.text, self.rate)
    }
}

/// Estimated seconds to speak `text` at `rate`: words / (2.5 * rate), plus a pause buffer of
/// up to 2 s and one extra second, never below 2 s.
pub fn speech_duration_secs(text: &str, rate: f64) -> f64 {
    if text.is_empty() || rate.is_nan() || rate <= 0.0 {
        return MIN_SPEECH_SECS;
    }
    let words = text.split_whitespace().count() as f64;
    let base = words / (WORDS_PER_SEC * rate);
    let buffer = (words * 0.1).min(2.0);
    (base + buffer + 1.0).max(MIN_SPEECH_SECS)
}

/// Speech output. Implementations should interrupt any line still being spoken.
pub trait Narrator {
    fn speak(&mut self, utterance: &Utterance);
    fn cancel(&mut self);
}

/// Narrator that keeps a transcript instead of producing audio.
#[derive(Clone, Debug, Default)]
pub struct TranscriptNarrator {
    pub spoken: Vec<Utterance>,
    pub cancels: usize,
}

impl Narrator for TranscriptNarrator {
    fn speak(&mut self, utterance: &Utterance) {
        tracing::debug!(
            secs = utterance.estimated_secs(),
            rate = utterance.rate,
            "speak: {}",
            utterance.text
        );
        self.spoken.push(utterance.clone());
    }

    fn cancel(&mut self) {
        self.cancels += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_has_floor() {
        assert_eq!(speech_duration_secs("", 1.0), 2.0);
        assert_eq!(speech_duration_secs("hi", 1.0), 2.0);
        assert_eq!(speech_duration_secs("hi", 0.0), 2.0);
    }

    #[test]
    fn duration_grows_with_words_and_shrinks_with_rate() {
        let ten = "one two three four five six seven eight nine ten";
        // 10 / 2.5 + 1 + 1
        assert!((speech_duration_secs(ten, 1.0) - 6.0).abs() < 1e-9);
        // 10 / 5 + 1 + 1
        assert!((speech_duration_secs(ten, 2.0) - 4.0).abs() < 1e-9);
        let long = vec!["w"; 50].join(" ");
        // buffer capped at 2: 50 / 2.5 + 2 + 1
        assert!((speech_duration_secs(&long, 1.0) - 23.0).abs() < 1e-9);
    }

    #[test]
    fn utterance_follows_speed_and_type() {
        let fast = Speed::new(2.0).unwrap();
        let u = Utterance::new("x", "thinking", fast);
        assert!((u.rate - 1.8).abs() < 1e-9);
        assert_eq!(u.pitch, 0.9);
        assert_eq!(Utterance::new("x", "speech", Speed::NORMAL).pitch, 1.1);
        // Ring entries are tagged `thought` and speak at the normal pitch.
        assert_eq!(Utterance::new("x", "thought", Speed::NORMAL).pitch, 1.1);
        assert_eq!(u.volume, 1.0);
    }

    #[test]
    fn textless_events_are_not_spoken() {
        let e = Event::new("move_element", "officer", 0.0, 1.0);
        assert!(Utterance::for_event(&e, Speed::NORMAL).is_none());
        let said = e.with_text("go");
        assert_eq!(
            Utterance::for_event(&said, Speed::NORMAL).map(|u| u.text),
            Some("go".to_owned())
        );
    }
}
