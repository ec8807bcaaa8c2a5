//! Format parsers for the woodshed practice toolkit.
//!
//! Decodes user-supplied WAV click/chime assets into [`ws_core::ClickSound`]
//! and reads/writes the flat key=value settings text.

mod settings_format;
mod wav_format;

pub use settings_format::{load_settings, save_settings};
pub use wav_format::load_wav;

/// Error type for format parsing.
#[derive(Debug)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    InvalidHeader,
    /// Unexpected end of file
    UnexpectedEof,
    /// Unsupported encoding (bit depth, channel count, or codec)
    UnsupportedEncoding,
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::InvalidHeader => write!(f, "invalid file header"),
            FormatError::UnexpectedEof => write!(f, "unexpected end of file"),
            FormatError::UnsupportedEncoding => write!(f, "unsupported encoding"),
        }
    }
}

impl std::error::Error for FormatError {}
