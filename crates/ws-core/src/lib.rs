//! Core types for the woodshed practice toolkit.
//!
//! This crate defines the pure, clock-agnostic logic shared by the four
//! practice widgets: the pausable session clock, tempo ramps, playback-speed
//! resolution, playlist bookkeeping, gain conversion, and note shuffling.
//! The scheduling engine consumes these types; nothing in here performs I/O
//! or reads a real clock.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod asset;
mod clock;
mod gain;
mod notes;
mod playlist;
mod speed;
mod store;
mod tempo;
mod timefmt;

pub use asset::ClickSound;
#[cfg(feature = "std")]
pub use clock::SystemClock;
pub use clock::{MonotonicClock, SessionClock};
pub use gain::{db_to_linear, linear_to_db, step_db, MAX_DB, MIN_DB};
pub use notes::{shuffled_notes, NOTE_NAMES};
pub use playlist::{EndAction, LoopMode, Playlist, RemoveOutcome, Track, TrackKey};
pub use speed::{
    clamp_speed, effective_rate, parse_bpm_from_name, resolve_initial_speed, SpeedMode,
    BPM_SPEED_MAX, BPM_SPEED_MIN, MULTIPLIER_MAX, MULTIPLIER_MIN,
};
pub use store::{MemoryStore, SettingsStore};
pub use tempo::{clamp_bpm, period_secs, Progression, TempoRamp, MAX_BPM, MIN_BPM};
pub use timefmt::{format_elapsed, format_track_time};
