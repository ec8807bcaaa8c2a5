//! Stopwatch widget: pausable elapsed clock, laps, and the interval chime.
//!
//! The chime rides on elapsed time, so pausing stretches the wall gap
//! between chimes without moving a boundary, and a boundary can never fire
//! twice or be skipped across a pause/resume cycle. The armed single-shot is
//! modelled as a wall-clock deadline the host polls.

use alloc::vec::Vec;

use ws_core::SessionClock;

use crate::chime::{ChimeArm, ChimeConfig, ChimeScheduler};

/// A captured lap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lap {
    pub number: u32,
    /// Elapsed time since the previous lap mark.
    pub lap_ms: f64,
    /// Total elapsed time at capture.
    pub total_ms: f64,
}

/// Readiness of the chime sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChimeAsset {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Host-visible effect of a stopwatch transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopwatchEvent {
    /// Sound the chime now.
    Chime,
    /// The chime sound is needed but not decoded; start loading it and
    /// report back through [`Stopwatch::chime_loaded`].
    LoadChime,
}

pub struct Stopwatch {
    clock: SessionClock,
    laps: Vec<Lap>,
    /// Elapsed reading at the last lap mark.
    lap_anchor_ms: f64,
    chime: ChimeScheduler,
    /// Wall-clock deadline of the armed chime shot.
    deadline_ms: Option<f64>,
    asset: ChimeAsset,
}

impl Stopwatch {
    pub fn new(config: ChimeConfig) -> Self {
        Self {
            clock: SessionClock::new(),
            laps: Vec::new(),
            lap_anchor_ms: 0.0,
            chime: ChimeScheduler::new(config),
            deadline_ms: None,
            asset: ChimeAsset::Unloaded,
        }
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        self.clock.elapsed(now_ms)
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn chime_interval_ms(&self) -> f64 {
        self.chime.interval_ms()
    }

    /// Wall deadline the host should next poll at, if any.
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.deadline_ms
    }

    /// Start or pause. Starting with a chime configured may ask the host to
    /// load the chime sound first.
    pub fn toggle(&mut self, now_ms: f64) -> Option<StopwatchEvent> {
        if self.clock.is_running() {
            self.pause(now_ms);
            None
        } else {
            self.start(now_ms)
        }
    }

    pub fn start(&mut self, now_ms: f64) -> Option<StopwatchEvent> {
        if self.clock.is_running() {
            return None;
        }
        self.clock.start(now_ms);
        self.rearm(now_ms)
    }

    pub fn pause(&mut self, now_ms: f64) {
        self.clock.pause(now_ms);
        // The target survives the pause untouched — it lives on elapsed
        // time — but the wall deadline is void.
        self.deadline_ms = None;
    }

    /// Zero the clock and clear laps. A running stopwatch keeps running
    /// from zero; the chime grid restarts with it.
    pub fn reset(&mut self, now_ms: f64) -> Option<StopwatchEvent> {
        self.clock.reset(now_ms);
        self.laps.clear();
        self.lap_anchor_ms = 0.0;
        self.chime.invalidate();
        self.deadline_ms = None;
        if self.clock.is_running() {
            self.rearm(now_ms)
        } else {
            None
        }
    }

    /// Capture a lap. Only meaningful while running.
    pub fn lap(&mut self, now_ms: f64) -> Option<Lap> {
        if !self.clock.is_running() {
            return None;
        }
        let total = self.clock.elapsed(now_ms);
        let lap = Lap {
            number: self.laps.len() as u32 + 1,
            lap_ms: total - self.lap_anchor_ms,
            total_ms: total,
        };
        self.lap_anchor_ms = total;
        self.laps.push(lap);
        Some(lap)
    }

    /// Change (or disable, with `None` or a non-positive value) the chime
    /// interval, given in seconds. Takes effect immediately.
    pub fn set_chime_interval(&mut self, secs: Option<f64>, now_ms: f64) -> Option<StopwatchEvent> {
        let elapsed = self.clock.elapsed(now_ms);
        self.chime.set_interval(secs, elapsed);
        self.deadline_ms = None;
        if self.clock.is_running() {
            self.rearm(now_ms)
        } else {
            None
        }
    }

    /// Host callback: the chime sound finished loading (or failed). A
    /// successful load re-arms the pending boundary instead of dropping it;
    /// a failure leaves the grid advancing silently.
    pub fn chime_loaded(&mut self, ok: bool, now_ms: f64) -> Option<StopwatchEvent> {
        self.asset = if ok { ChimeAsset::Ready } else { ChimeAsset::Failed };
        if self.clock.is_running() {
            self.rearm(now_ms)
        } else {
            None
        }
    }

    /// Drive the armed deadline. Call on every host wake.
    pub fn poll(&mut self, now_ms: f64) -> Option<StopwatchEvent> {
        // Running check first: a deadline that raced a pause must not fire.
        if !self.clock.is_running() {
            return None;
        }
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                self.rearm(now_ms)
            }
            _ => None,
        }
    }

    /// Recompute the chime target from current elapsed time and arm the
    /// next shot, firing first if a boundary is due.
    fn rearm(&mut self, now_ms: f64) -> Option<StopwatchEvent> {
        self.deadline_ms = None;
        if !self.chime.is_enabled() {
            return None;
        }
        if self.asset == ChimeAsset::Unloaded {
            self.asset = ChimeAsset::Loading;
            return Some(StopwatchEvent::LoadChime);
        }
        if self.asset == ChimeAsset::Loading {
            // Arming resumes from chime_loaded.
            return None;
        }

        let elapsed = self.clock.elapsed(now_ms);
        let mut fired = false;
        loop {
            match self.chime.arm(elapsed) {
                ChimeArm::Disabled => break,
                ChimeArm::After(delay) => {
                    self.deadline_ms = Some(now_ms + delay);
                    break;
                }
                ChimeArm::FireNow => {
                    self.chime.fired(elapsed);
                    fired = true;
                }
                ChimeArm::Stale => {}
            }
        }
        (fired && self.asset == ChimeAsset::Ready).then_some(StopwatchEvent::Chime)
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new(ChimeConfig::default())
    }
}
