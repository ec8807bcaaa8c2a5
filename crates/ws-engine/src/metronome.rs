//! Metronome widget: steady or ramped tick scheduling.
//!
//! In plain mode the tempo is whatever the user last set. In advanced mode a
//! practice ramp drives the tempo from a start to a finish value over a set
//! duration; the ramp is re-evaluated per emitted tick, so tempo moves
//! tick-by-tick, and manual tempo edits are locked out while it runs.

use ws_core::{clamp_bpm, period_secs, MonotonicClock, Progression, TempoRamp};

use crate::clock::AudioClock;
use crate::lookahead::{LookaheadScheduler, SchedulerConfig, Tick};

/// Practice-ramp (advanced mode) state.
#[derive(Clone, Copy, Debug)]
struct AdvancedMode {
    active: bool,
    stop_at_finish: bool,
    progression: Progression,
    /// Wall reading the session elapsed time is measured against while
    /// running: `anchor = start_wall - elapsed_so_far`.
    session_anchor_ms: f64,
}

impl AdvancedMode {
    fn new() -> Self {
        Self {
            active: false,
            stop_at_finish: true,
            progression: Progression::new(TempoRamp::new(60, 120, 5.0 * 60_000.0)),
            session_anchor_ms: 0.0,
        }
    }
}

pub struct Metronome {
    bpm: u16,
    sched: LookaheadScheduler,
    advanced: AdvancedMode,
}

impl Metronome {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            bpm: 120,
            sched: LookaheadScheduler::new(config),
            advanced: AdvancedMode::new(),
        }
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    pub fn is_running(&self) -> bool {
        self.sched.is_running()
    }

    pub fn wake_ms(&self) -> f64 {
        self.sched.config().wake_ms
    }

    /// Set the tempo directly. Rejected while an active ramp is running so
    /// manual edits cannot fight the progression.
    pub fn set_bpm(&mut self, bpm: i32) -> bool {
        if self.advanced.active && self.is_running() {
            return false;
        }
        self.bpm = clamp_bpm(bpm);
        true
    }

    /// Nudge the tempo by a signed amount, under the same lockout.
    pub fn adjust_bpm(&mut self, delta: i32) -> bool {
        self.set_bpm(self.bpm as i32 + delta)
    }

    // --- Advanced mode ---

    pub fn advanced_active(&self) -> bool {
        self.advanced.active
    }

    pub fn stop_at_finish(&self) -> bool {
        self.advanced.stop_at_finish
    }

    pub fn ramp(&self) -> TempoRamp {
        self.advanced.progression.ramp
    }

    pub fn is_progressing(&self) -> bool {
        self.advanced.progression.is_progressing()
    }

    /// Session position in the ramp, 0..=1.
    pub fn progress_fraction(&self) -> f64 {
        let duration = self.advanced.progression.ramp.duration_ms;
        (self.advanced.progression.elapsed_ms() / duration).clamp(0.0, 1.0)
    }

    pub fn session_elapsed_ms(&self) -> f64 {
        self.advanced.progression.elapsed_ms()
    }

    /// Toggle advanced mode. Rejected while running; switching modes mid-run
    /// would tear the tick grid out from under the scheduler. Enabling
    /// rewinds the session and snaps the tempo to the ramp start.
    pub fn set_advanced_active(&mut self, active: bool) -> bool {
        if self.is_running() {
            return false;
        }
        self.advanced.active = active;
        if active {
            self.advanced.progression.rewind();
            self.bpm = self.advanced.progression.ramp.start_bpm;
        }
        true
    }

    pub fn set_stop_at_finish(&mut self, stop: bool) {
        self.advanced.stop_at_finish = stop;
    }

    /// Reconfigure the ramp. Rejected while running; while stopped the
    /// session restarts from zero under the new parameters.
    pub fn configure_ramp(&mut self, start_bpm: i32, finish_bpm: i32, practice_minutes: f64) -> bool {
        if self.is_running() {
            return false;
        }
        let minutes = if practice_minutes.is_finite() { practice_minutes.max(0.1) } else { 5.0 };
        self.advanced.progression =
            Progression::new(TempoRamp::new(start_bpm, finish_bpm, minutes * 60_000.0));
        if self.advanced.active {
            self.bpm = self.advanced.progression.ramp.start_bpm;
        }
        true
    }

    /// Jump the running ramp to a fraction of its duration (progress seek).
    pub fn seek_progress<W: MonotonicClock>(&mut self, fraction: f64, wall: &W) -> bool {
        if !self.advanced.active || !self.advanced.progression.is_progressing() {
            return false;
        }
        self.advanced.progression.seek(fraction);
        self.advanced.session_anchor_ms = wall.now_ms() - self.advanced.progression.elapsed_ms();
        self.bpm = self.advanced.progression.current_bpm();
        true
    }

    /// Begin ticking. In advanced mode the ramp resumes from wherever the
    /// previous session left it. Returns false if already running.
    pub fn start<C: AudioClock, W: MonotonicClock>(&mut self, audio: &C, wall: &W) -> bool {
        if self.is_running() {
            return false;
        }
        if self.advanced.active {
            self.advanced.session_anchor_ms =
                wall.now_ms() - self.advanced.progression.elapsed_ms();
            self.advanced.progression.begin();
            self.bpm = self.advanced.progression.current_bpm();
        }
        self.sched.start(audio);
        true
    }

    /// Stop ticking. Advanced-mode session position is retained so a later
    /// start resumes the ramp.
    pub fn stop(&mut self) {
        self.sched.stop();
    }

    /// One coarse wake: emit every due tick. Returns the delay until the
    /// next wake in milliseconds, or `None` once stopped (including the
    /// ramp completing with stop-at-finish set).
    pub fn pump<C, W, E>(&mut self, audio: &C, wall: &W, emit: E) -> Option<f64>
    where
        C: AudioClock,
        W: MonotonicClock,
        E: FnMut(Tick),
    {
        let advanced = &mut self.advanced;
        let bpm = &mut self.bpm;
        self.sched.pump(
            audio,
            || {
                if advanced.active && advanced.progression.is_progressing() {
                    let elapsed = wall.now_ms() - advanced.session_anchor_ms;
                    let (new_bpm, completed) = advanced.progression.advance(elapsed);
                    *bpm = new_bpm;
                    if completed && advanced.stop_at_finish {
                        return None;
                    }
                }
                Some(period_secs(*bpm))
            },
            emit,
        )
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::Cell;

    struct TestClocks {
        audio_secs: Cell<f64>,
        wall_ms: Cell<f64>,
    }

    impl TestClocks {
        fn new() -> Self {
            Self { audio_secs: Cell::new(0.0), wall_ms: Cell::new(0.0) }
        }

        /// Advance both clocks in lockstep.
        fn advance_secs(&self, secs: f64) {
            self.audio_secs.set(self.audio_secs.get() + secs);
            self.wall_ms.set(self.wall_ms.get() + secs * 1000.0);
        }
    }

    impl AudioClock for TestClocks {
        fn now_secs(&self) -> f64 {
            self.audio_secs.get()
        }
    }

    impl MonotonicClock for TestClocks {
        fn now_ms(&self) -> f64 {
            self.wall_ms.get()
        }
    }

    fn pump_for(m: &mut Metronome, clocks: &TestClocks, secs: f64) -> Vec<Tick> {
        let mut ticks = Vec::new();
        let end = clocks.now_secs() + secs;
        while clocks.now_secs() < end {
            if m.pump(clocks, clocks, |t| ticks.push(t)).is_none() {
                break;
            }
            clocks.advance_secs(0.025);
        }
        ticks
    }

    #[test]
    fn steady_tempo_spacing() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.set_bpm(120);
        assert!(m.start(&clocks, &clocks));

        let ticks = pump_for(&mut m, &clocks, 3.0);
        assert!(ticks.len() >= 5);
        for pair in ticks.windows(2) {
            assert!((pair[1].at - pair[0].at - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn set_bpm_clamps() {
        let mut m = Metronome::default();
        m.set_bpm(9999);
        assert_eq!(m.bpm(), 240);
        m.set_bpm(1);
        assert_eq!(m.bpm(), 40);
    }

    #[test]
    fn manual_tempo_locked_during_ramp() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        assert!(m.set_advanced_active(true));
        m.start(&clocks, &clocks);

        assert!(!m.set_bpm(200));
        assert!(!m.adjust_bpm(10));
        assert_eq!(m.bpm(), 60); // ramp start

        m.stop();
        assert!(m.set_bpm(200));
    }

    #[test]
    fn advanced_toggle_rejected_while_running() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.start(&clocks, &clocks);
        assert!(!m.set_advanced_active(true));
        assert!(!m.configure_ramp(80, 160, 2.0));
    }

    #[test]
    fn enabling_advanced_snaps_to_start_bpm() {
        let mut m = Metronome::default();
        m.configure_ramp(80, 160, 2.0);
        m.set_advanced_active(true);
        assert_eq!(m.bpm(), 80);
        assert!(!m.is_progressing());
    }

    #[test]
    fn ramp_reaches_finish_and_stops_when_asked() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        // 60 -> 120 over the minimum practice duration (6 s).
        m.configure_ramp(60, 120, 0.1);
        m.set_advanced_active(true);
        m.set_stop_at_finish(true);
        m.start(&clocks, &clocks);

        let ticks = pump_for(&mut m, &clocks, 20.0);
        assert!(!m.is_running());
        assert_eq!(m.bpm(), 120);
        assert!(!m.is_progressing());
        // The ramp session completed, so ticking stopped long before 20 s.
        assert!(ticks.last().unwrap().at < 8.0);
    }

    #[test]
    fn ramp_continues_at_finish_without_stop() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.configure_ramp(60, 120, 0.1);
        m.set_advanced_active(true);
        m.set_stop_at_finish(false);
        m.start(&clocks, &clocks);

        pump_for(&mut m, &clocks, 10.0);
        assert!(m.is_running());
        assert_eq!(m.bpm(), 120);
        assert!(!m.is_progressing());

        // Pinned: further pumping keeps ticking at the finish tempo.
        let more = pump_for(&mut m, &clocks, 2.0);
        assert!(!more.is_empty());
        for pair in more.windows(2) {
            assert!((pair[1].at - pair[0].at - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn ramp_tempo_is_monotonic_across_ticks() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.configure_ramp(60, 180, 0.1);
        m.set_advanced_active(true);
        m.set_stop_at_finish(false);
        m.start(&clocks, &clocks);

        let ticks = pump_for(&mut m, &clocks, 8.0);
        // Inter-tick gaps must shrink (or hold) as the tempo rises.
        let gaps: Vec<f64> = ticks.windows(2).map(|p| p[1].at - p[0].at).collect();
        for pair in gaps.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9, "gap grew during an upward ramp");
        }
    }

    #[test]
    fn stop_and_resume_continues_ramp_position() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.configure_ramp(60, 120, 0.1);
        m.set_advanced_active(true);
        m.set_stop_at_finish(false);
        m.start(&clocks, &clocks);

        pump_for(&mut m, &clocks, 3.0);
        m.stop();
        let elapsed_at_stop = m.session_elapsed_ms();
        assert!(elapsed_at_stop > 0.0);

        // Time passes while stopped; the session position must not move.
        clocks.advance_secs(60.0);
        m.start(&clocks, &clocks);
        let drift = (m.session_elapsed_ms() - elapsed_at_stop).abs();
        assert!(drift < 1.0, "session elapsed jumped by {} ms across stop", drift);
    }

    #[test]
    fn ramp_edit_while_stopped_rewinds_session() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.configure_ramp(60, 120, 0.1);
        m.set_advanced_active(true);
        m.start(&clocks, &clocks);
        pump_for(&mut m, &clocks, 3.0);
        m.stop();

        assert!(m.configure_ramp(70, 140, 0.2));
        assert_eq!(m.session_elapsed_ms(), 0.0);
        assert_eq!(m.bpm(), 70);
    }

    #[test]
    fn seek_moves_ramp_and_tempo() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.configure_ramp(60, 120, 0.1);
        m.set_advanced_active(true);

        // Seek only applies to a running progression.
        assert!(!m.seek_progress(0.5, &clocks));

        m.start(&clocks, &clocks);
        assert!(m.seek_progress(0.5, &clocks));
        assert_eq!(m.bpm(), 90);
        assert_eq!(m.session_elapsed_ms(), 3_000.0);
    }

    #[test]
    fn no_ticks_after_stop() {
        let clocks = TestClocks::new();
        let mut m = Metronome::default();
        m.start(&clocks, &clocks);
        m.stop();
        assert_eq!(m.pump(&clocks, &clocks, |_| panic!("tick after stop")), None);
    }
}
