//! Decoded one-shot click/chime sounds.

use alloc::sync::Arc;
use alloc::vec::Vec;
use arrayvec::ArrayString;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A decoded one-shot sample: mono f32 in [-1, 1] at its source rate.
///
/// The payload is shared so the realtime audio callback can hold a clone
/// without copying sample data.
#[derive(Clone, Debug)]
pub struct ClickSound {
    pub name: ArrayString<32>,
    pub sample_rate: u32,
    pub data: Arc<[f32]>,
}

impl ClickSound {
    pub fn new(name: &str, sample_rate: u32, data: Vec<f32>) -> Self {
        let mut stored = ArrayString::new();
        let _ = stored.try_push_str(name);
        Self { name: stored, sample_rate, data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.data.len() as f64 / self.sample_rate as f64
        }
    }

    /// Default metronome tick: a 20 ms white-noise burst with a linear
    /// fade-out, generated from a fixed seed so output is identical across
    /// runs.
    pub fn tick(sample_rate: u32) -> Self {
        let len = (sample_rate as f32 * 0.02) as usize;
        let mut rng = SmallRng::seed_from_u64(42);
        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            let fade = 1.0 - i as f32 / len as f32;
            data.push(rng.gen_range(-1.0f32..1.0) * fade * 0.5);
        }
        Self::new("tick", sample_rate, data)
    }

    /// Default stopwatch chime: a 300 ms decaying sine at 880 Hz.
    pub fn chime(sample_rate: u32) -> Self {
        let len = (sample_rate as f32 * 0.3) as usize;
        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            let t = i as f32 / sample_rate as f32;
            let envelope = libm::expf(-t * 10.0);
            data.push(libm::sinf(2.0 * core::f32::consts::PI * 880.0 * t) * envelope * 0.6);
        }
        Self::new("chime", sample_rate, data)
    }
}
