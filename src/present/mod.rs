//! Presentation descriptions: entity styles, audio cues and narration parameters.
//!
//! Nothing here draws or plays audio; a host renders these values.

pub mod cue;
pub mod narration;
pub mod style;
