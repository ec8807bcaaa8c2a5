//! CPAL-based click output backend.
//!
//! The control side registers decoded sounds and pushes scheduled shots
//! through a lock-free ring; the stream callback mixes them from a
//! fixed-capacity voice table. The output clock is the number of frames
//! delivered to the device, so "schedule at T" is sample-accurate no matter
//! how coarse the caller's own timer is.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use ws_core::ClickSound;
use ws_engine::AudioClock;

use crate::traits::{AudioError, ClickOutput, SoundId};

/// Concurrently sounding shots; later shots steal the oldest slot when full.
const MAX_VOICES: usize = 16;

/// Scheduled-shot capacity. Far more than one look-ahead horizon can hold.
const CMD_QUEUE_LEN: usize = 64;

/// A scheduled one-shot crossing into the stream callback.
struct Shot {
    start_frame: u64,
    data: Arc<[f32]>,
    /// 16.16 fixed-point position increment (source rate / output rate).
    step: u64,
}

/// A sounding voice inside the callback.
struct Voice {
    shot: Shot,
    /// 16.16 fixed-point read position.
    pos: u64,
}

/// CPAL-based click output.
pub struct CpalClick {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    producer: HeapProd<Shot>,
    /// Consumer parked here until the stream is built on first resume.
    consumer: Option<HeapCons<Shot>>,
    frames_played: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    sounds: Vec<ClickSound>,
}

impl CpalClick {
    /// Create a click output on the default device. The stream itself is
    /// built lazily on the first [`ClickOutput::resume`].
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // Force stereo output — the callback writes 2-channel pairs
        config.channels = 2;

        let rb = HeapRb::<Shot>::new(CMD_QUEUE_LEN);
        let (producer, consumer) = rb.split();

        Ok(Self {
            device,
            config,
            stream: None,
            producer,
            consumer: Some(consumer),
            frames_played: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            sounds: Vec::new(),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn build_stream(&mut self) -> Result<(), AudioError> {
        let Some(mut consumer) = self.consumer.take() else {
            return Ok(());
        };

        let frames_played = self.frames_played.clone();
        let running = self.running.clone();
        let channels = self.config.channels as usize;
        let mut voices: heapless::Vec<Voice, MAX_VOICES> = heapless::Vec::new();

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut render = |data: &mut [f32]| {
                        let base = frames_played.load(Ordering::Relaxed);
                        if !running.load(Ordering::Relaxed) {
                            for sample in data.iter_mut() {
                                *sample = 0.0;
                            }
                            // The clock only advances while running.
                            return;
                        }

                        // Accept newly scheduled shots, stealing the oldest
                        // slot if the table is full.
                        while let Some(shot) = consumer.try_pop() {
                            if voices.is_full() {
                                voices.remove(0);
                            }
                            let _ = voices.push(Voice { shot, pos: 0 });
                        }

                        for (i, chunk) in data.chunks_mut(channels).enumerate() {
                            let frame = base + i as u64;
                            let mut mixed = 0.0f32;
                            for voice in voices.iter_mut() {
                                if frame < voice.shot.start_frame {
                                    continue;
                                }
                                let index = (voice.pos >> 16) as usize;
                                if let Some(sample) = voice.shot.data.get(index) {
                                    mixed += sample;
                                    voice.pos += voice.shot.step;
                                }
                            }
                            voices.retain(|v| ((v.pos >> 16) as usize) < v.shot.data.len());

                            let sample = mixed.clamp(-1.0, 1.0);
                            for out in chunk.iter_mut() {
                                *out = sample;
                            }
                        }

                        frames_played
                            .fetch_add((data.len() / channels) as u64, Ordering::Relaxed);
                    };

                    #[cfg(feature = "alloc_check")]
                    assert_no_alloc::assert_no_alloc(|| render(data));
                    #[cfg(not(feature = "alloc_check"))]
                    render(data);
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }
}

impl AudioClock for CpalClick {
    fn now_secs(&self) -> f64 {
        self.frames_played.load(Ordering::Relaxed) as f64 / self.config.sample_rate.0 as f64
    }
}

impl ClickOutput for CpalClick {
    fn resume(&mut self) -> Result<(), AudioError> {
        if self.stream.is_none() {
            self.build_stream()?;
        }
        self.running.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn register(&mut self, sound: ClickSound) -> SoundId {
        self.sounds.push(sound);
        SoundId(self.sounds.len() - 1)
    }

    fn schedule(&mut self, sound: SoundId, at_secs: f64) -> Result<(), AudioError> {
        let sound = self.sounds.get(sound.0).ok_or(AudioError::UnknownSound)?;
        let out_rate = self.config.sample_rate.0 as u64;
        let shot = Shot {
            start_frame: (at_secs.max(0.0) * out_rate as f64) as u64,
            data: sound.data.clone(),
            step: (sound.sample_rate as u64 * 65_536) / out_rate,
        };
        // Non-blocking push; a full queue drops the shot rather than stall
        let _ = self.producer.try_push(shot);
        Ok(())
    }
}
