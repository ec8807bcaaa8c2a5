//! Audio click output backend for the woodshed practice toolkit.

mod cpal_backend;
mod traits;

pub use cpal_backend::CpalClick;
pub use traits::{AudioError, ClickOutput, SoundId};
