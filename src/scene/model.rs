use crate::foundation::core::{GRID_SIZE, GridPos, Lerp};
use crate::foundation::lenient;
use crate::normalize::diag::Diagnostic;
use crate::playback::matching::target_matches;
use crate::scene::grid::Grid;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which source shape a document was normalized from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "disc-data")]
    DiscData,
    #[serde(rename = "legos-multi-channel")]
    MultiChannel,
    #[serde(rename = "conversation")]
    Conversation,
    #[serde(rename = "legos-ring-memory")]
    RingMemory,
    /// Detection failed; the scene list is empty.
    #[serde(rename = "error")]
    Error,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DiscData => "disc-data",
            Self::MultiChannel => "legos-multi-channel",
            Self::Conversation => "conversation",
            Self::RingMemory => "legos-ring-memory",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported grid dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            rows: GRID_SIZE as u32,
            cols: GRID_SIZE as u32,
        }
    }
}

/// Output of format detection and normalization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub title: String,
    #[serde(rename = "gridSize", default)]
    pub grid_size: GridSize,
    pub scenes: Vec<Scene>,
    /// Recovered problems (skipped units, substituted grids).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedDocument {
    /// The structurally valid result returned when detection fails.
    pub fn error() -> Self {
        Self {
            kind: DocumentKind::Error,
            title: "Parse Error".to_owned(),
            grid_size: GridSize::default(),
            scenes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Sum of all scene durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration).sum()
    }

    /// Scene start offsets on the global timeline.
    pub fn scene_offsets(&self) -> Vec<f64> {
        let mut acc = 0.0;
        self.scenes
            .iter()
            .map(|s| {
                let start = acc;
                acc += s.duration;
                start
            })
            .collect()
    }
}

/// One frame of the narrative: grid, elements, power and a timeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    /// 1-based display order.
    pub number: u32,
    pub title: String,
    pub subtitle: String,
    pub grid: Grid,
    pub elements: Vec<Element>,
    pub power: BTreeMap<String, PowerScore>,
    /// Insertion order is chronological; not guaranteed sorted by delay.
    pub timeline: Vec<Event>,
    /// Playable length in seconds.
    pub duration: f64,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerScore {
    pub score: f64,
}

impl PowerScore {
    pub fn new(score: f64) -> Self {
        Self {
            score: if score.is_finite() {
                score.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

/// An entity placed on the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(alias = "element_id")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub grid_symbol: Option<String>,
    /// 1-based position.
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_grid_position: Option<GridPos>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A timestamped occurrence within a scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub display_type: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub target_element_id: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub delay_seconds: f64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_position: Option<GridPos>,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_position: Option<GridPos>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Event {
    /// A bare event with the given kind, target and timing.
    pub fn new(kind: impl Into<String>, target: impl Into<String>, delay: f64, dur: f64) -> Self {
        Self {
            event_id: None,
            kind: kind.into(),
            display_type: String::new(),
            target_element_id: target.into(),
            text: None,
            delay_seconds: delay,
            duration_seconds: dur,
            timestamp: None,
            start_position: None,
            end_position: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn start(&self) -> f64 {
        self.delay_seconds
    }

    pub fn end(&self) -> f64 {
        self.delay_seconds + self.duration_seconds
    }

    /// `start <= t < end`.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start() <= t && t < self.end()
    }

    /// Non-empty text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Seconds the transient message entity stays on the grid.
    pub fn bubble_lifetime_secs(&self) -> f64 {
        self.duration_seconds.max(5.0)
    }

    /// Interpolated position of a `move_element` event at scene time `t`.
    pub fn position_at(&self, t: f64) -> Option<GridPos> {
        let (from, to) = (self.start_position?, self.end_position?);
        let dur = if self.duration_seconds > 0.0 {
            self.duration_seconds
        } else {
            1.0
        };
        let progress = (t - self.delay_seconds) / dur;
        if !(0.0..=1.0).contains(&progress) {
            return None;
        }
        Some(GridPos::lerp(&from, &to, progress))
    }
}

/// Header information for a scene.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneSummary {
    pub number: u32,
    pub title: String,
    pub duration: f64,
    pub events: usize,
    pub elements: usize,
}

impl Scene {
    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            number: self.number,
            title: self.title.clone(),
            duration: self.duration,
            events: self.timeline.len(),
            elements: self.elements.len(),
        }
    }

    /// Timeline indices of events whose target loosely matches `entity`.
    pub fn related_events(&self, entity: &str) -> Vec<usize> {
        self.timeline
            .iter()
            .enumerate()
            .filter(|(_, e)| target_matches(&e.target_element_id, entity))
            .map(|(i, _)| i)
            .collect()
    }

    /// Element occupying a 0-based cell.
    pub fn element_at(&self, row: usize, col: usize) -> Option<&Element> {
        let pos = GridPos::from_cell(row, col);
        self.elements
            .iter()
            .find(|e| e.initial_grid_position == Some(pos))
    }

    /// Latest event end in seconds; 0 for an empty timeline.
    pub fn latest_event_end(&self) -> f64 {
        self.timeline.iter().map(Event::end).fold(0.0, f64::max)
    }
}
