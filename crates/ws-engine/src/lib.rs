//! Scheduling engine for the woodshed practice toolkit.
//!
//! Owns the two precision schedulers — the metronome's look-ahead pump and
//! the stopwatch's chime single-shot — and the widget state machines built
//! on them. Everything is cooperatively driven: the host calls `pump`/`poll`
//! with explicit clock readings and acts on the events and commands returned.
//! No timers, threads, or audio devices live in this crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chime;
mod clock;
mod lookahead;
mod metronome;
mod notegen;
mod player;
mod stopwatch;

pub use chime::{ChimeArm, ChimeConfig, ChimeScheduler};
pub use clock::AudioClock;
pub use lookahead::{LookaheadScheduler, SchedulerConfig, Tick};
pub use metronome::Metronome;
pub use notegen::NoteGenerator;
pub use player::{Player, TransportCmd};
pub use stopwatch::{Lap, Stopwatch, StopwatchEvent};
