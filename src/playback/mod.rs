//! Playback clock and its collaborators.
//!
//! [`clock::PlaybackClock`] owns the time cursor and the revealed/shown ledger and is advanced by
//! a host frame loop ([`driver`]). Transitions are published through
//! [`observer::PlaybackObserver`]; [`autoplay::AutoPlay`] supervises scene-to-scene progress on
//! a coarse poll.

pub mod autoplay;
pub mod clock;
pub mod driver;
pub mod ledger;
pub mod matching;
pub mod observer;
