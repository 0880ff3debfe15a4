#![forbid(unsafe_code)]

pub mod config;
mod foundation;
pub mod normalize;
pub mod playback;
pub mod present;
pub mod scene;
pub mod session;

pub use config::{DisplayMode, Preferences};
pub use foundation::core::{GRID_SIZE, GridPos, Lerp, format_time};
pub use foundation::error::{LoadError, PlayerError, PlayerResult};
pub use normalize::diag::{Diagnostic, DiagnosticKind};
pub use normalize::{SourceFormat, detect, detect_and_parse, load_document, normalize};
pub use playback::autoplay::AutoPlay;
pub use playback::clock::{PlaybackClock, PlaybackState, Speed};
pub use playback::driver::{FrameLoop, ManualTime, MonotonicTime, TimeSource};
pub use playback::observer::{NullObserver, PlaybackObserver, RecordingObserver, Signal};
pub use scene::board::{Board, CellView};
pub use scene::grid::Grid;
pub use scene::model::{DocumentKind, Element, Event, ParsedDocument, PowerScore, Scene};
pub use session::{Key, KeyAction, LoadOutcome, PlayerSession};
