//! Click output trait and error types.

use ws_core::ClickSound;
use ws_engine::AudioClock;

/// Error type for audio operations.
#[derive(Debug)]
pub enum AudioError {
    /// Failed to initialize audio device
    DeviceInit(String),
    /// Failed to create audio stream
    StreamCreate(String),
    /// Playback error
    Playback(String),
    /// No audio device available
    NoDevice,
    /// Sound id was never registered
    UnknownSound,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::DeviceInit(msg) => write!(f, "Device init error: {}", msg),
            AudioError::StreamCreate(msg) => write!(f, "Stream create error: {}", msg),
            AudioError::Playback(msg) => write!(f, "Playback error: {}", msg),
            AudioError::NoDevice => write!(f, "No audio device available"),
            AudioError::UnknownSound => write!(f, "Sound id was never registered"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Handle to a registered one-shot sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoundId(pub usize);

/// A one-shot click sink with its own clock.
///
/// Scheduling is fire-and-forget: a shot placed at an output-clock time in
/// the past or too far beyond the queue's capacity is dropped, never an
/// error surfaced mid-tick.
pub trait ClickOutput: AudioClock {
    /// Make sure the output is producing (streams may start suspended).
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Register a decoded sound for later scheduling.
    fn register(&mut self, sound: ClickSound) -> SoundId;

    /// Start the sound exactly at `at_secs` on this output's clock.
    fn schedule(&mut self, sound: SoundId, at_secs: f64) -> Result<(), AudioError>;
}
