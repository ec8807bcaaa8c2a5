//! Headless controller for the woodshed practice toolkit.
//!
//! Owns the four widgets, the optional click output, and the settings
//! store, and drives them cooperatively: the host calls [`Toolkit::pump`]
//! on every wake and acts on the returned events. Both the CLI and tests
//! share this layer.

mod settings;
mod store_file;

use ws_core::{db_to_linear, ClickSound, LoopMode, MonotonicClock, SettingsStore, Track};
use ws_engine::{
    Metronome, NoteGenerator, Player, SchedulerConfig, Stopwatch, StopwatchEvent, Tick,
    TransportCmd,
};

pub use store_file::FileStore;
// Re-export common types so hosts don't need every crate directly.
pub use ws_audio::{AudioError, ClickOutput, SoundId};
pub use ws_core::MemoryStore;
pub use ws_engine::Lap;

/// Default player volume when nothing is persisted: -6 dB.
const DEFAULT_VOLUME_DB: f64 = -6.0;

/// Host-visible event produced by a toolkit pump or transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToolkitEvent {
    /// Flash the metronome's beat indicator after this many milliseconds.
    Flash { delay_ms: f64 },
    /// The stopwatch chime sounded.
    Chime,
    /// Player command for the host's actual track transport.
    Transport(TransportCmd),
}

/// Wall-clock view of an audio timeline, used when no audio output is
/// available so the metronome keeps flashing on schedule.
struct WallTimeline<'a, W: MonotonicClock>(&'a W);

impl<W: MonotonicClock> ws_engine::AudioClock for WallTimeline<'_, W> {
    fn now_secs(&self) -> f64 {
        self.0.now_ms() / 1000.0
    }
}

pub struct Toolkit<S: SettingsStore, O: ClickOutput> {
    pub metronome: Metronome,
    pub stopwatch: Stopwatch,
    pub player: Player,
    pub notes: NoteGenerator,
    store: S,
    audio: Option<O>,
    /// False after a failed resume: scheduling degrades to visual-only.
    audio_ok: bool,
    tick_sound: Option<SoundId>,
    chime_sound: Option<SoundId>,
    /// Wall deadline of the next metronome wake while running.
    metronome_wake_ms: Option<f64>,
    advanced_panel_visible: bool,
}

impl<S: SettingsStore, O: ClickOutput> Toolkit<S, O> {
    /// Build the toolkit and restore every persisted setting.
    pub fn new(store: S, note_seed: u64) -> Self {
        let mut toolkit = Self {
            metronome: Metronome::new(SchedulerConfig::default()),
            stopwatch: Stopwatch::default(),
            player: Player::new(),
            notes: NoteGenerator::new(note_seed),
            store,
            audio: None,
            audio_ok: false,
            tick_sound: None,
            chime_sound: None,
            metronome_wake_ms: None,
            advanced_panel_visible: false,
        };
        toolkit.restore();
        toolkit
    }

    /// Wire up a click output and pre-register the default tick sound.
    pub fn attach_audio(&mut self, mut output: O) {
        self.tick_sound = Some(output.register(ClickSound::tick(44_100)));
        self.audio = Some(output);
        self.audio_ok = true;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write buffered settings through to their backing medium.
    pub fn save(&mut self) {
        self.store.flush();
    }

    fn restore(&mut self) {
        // Metronome: ramp parameters first, then the mode flag, then the
        // plain tempo — enabling advanced mode snaps the tempo to the ramp
        // start, which must win over the saved plain tempo.
        let start = self.store.get_u16(settings::ADVANCED_START_BPM).unwrap_or(60);
        let finish = self.store.get_u16(settings::ADVANCED_FINISH_BPM).unwrap_or(120);
        let minutes = self.store.get_f64(settings::ADVANCED_PRACTICE_TIME).unwrap_or(5.0);
        self.metronome.configure_ramp(start as i32, finish as i32, minutes);
        self.metronome
            .set_stop_at_finish(self.store.get_bool(settings::ADVANCED_STOP_AT_FINISH).unwrap_or(true));
        let advanced_active = self.store.get_bool(settings::ADVANCED_ACTIVE).unwrap_or(false);
        self.metronome.set_advanced_active(advanced_active);
        if !advanced_active {
            if let Some(bpm) = self.store.get_u16(settings::METRONOME_BPM) {
                self.metronome.set_bpm(bpm as i32);
            }
        }
        self.advanced_panel_visible =
            self.store.get_bool(settings::ADVANCED_VISIBLE).unwrap_or(false);

        // Stopwatch chime.
        let interval = self.store.get_f64(settings::CHIME_INTERVAL);
        self.stopwatch.set_chime_interval(interval, 0.0);

        // Player.
        let volume = self
            .store
            .get_f64(settings::PLAYER_VOLUME)
            .unwrap_or_else(|| db_to_linear(DEFAULT_VOLUME_DB));
        self.player.set_volume(volume);
        let loop_track = self.store.get_bool(settings::PLAYER_LOOP_TRACK).unwrap_or(false);
        let loop_playlist = self.store.get_bool(settings::PLAYER_LOOP_PLAYLIST).unwrap_or(false);
        self.player.set_loop_mode(if loop_track {
            LoopMode::Track
        } else if loop_playlist {
            LoopMode::Playlist
        } else {
            LoopMode::Off
        });
        if let Some(gap) = self.store.get_f64(settings::PLAYER_SILENCE_INTERVAL) {
            self.player.set_gap_secs(gap);
        }
    }

    // --- Cooperative pump ---

    /// Drive every due widget timer once. Call on each host wake.
    pub fn pump<W: MonotonicClock>(&mut self, wall: &W) -> Vec<ToolkitEvent> {
        let now = wall.now_ms();
        let mut events = Vec::new();

        if self.metronome.is_running() && self.metronome_wake_ms.map_or(true, |wake| now >= wake) {
            self.pump_metronome(wall, &mut events);
        }

        let stopwatch_event = self.stopwatch.poll(now);
        self.service_stopwatch(stopwatch_event, now, &mut events);

        for cmd in self.player.poll(now) {
            events.push(ToolkitEvent::Transport(cmd));
        }
        events
    }

    /// Earliest wall deadline any widget needs servicing at.
    pub fn next_deadline_ms(&self) -> Option<f64> {
        [
            self.metronome_wake_ms,
            self.stopwatch.next_deadline_ms(),
            self.player.next_deadline_ms(),
        ]
        .into_iter()
        .flatten()
        .min_by(f64::total_cmp)
    }

    fn pump_metronome<W: MonotonicClock>(&mut self, wall: &W, events: &mut Vec<ToolkitEvent>) {
        let mut ticks: Vec<Tick> = Vec::new();
        let wake = match self.audio.as_ref().filter(|_| self.audio_ok) {
            Some(audio) => self.metronome.pump(audio, wall, |t| ticks.push(t)),
            None => self.metronome.pump(&WallTimeline(wall), wall, |t| ticks.push(t)),
        };
        self.metronome_wake_ms = wake.map(|delay| wall.now_ms() + delay);

        if self.audio_ok {
            if let (Some(audio), Some(sound)) = (self.audio.as_mut(), self.tick_sound) {
                for tick in &ticks {
                    let _ = audio.schedule(sound, tick.at);
                }
            }
        }
        events.extend(ticks.iter().map(|t| ToolkitEvent::Flash { delay_ms: t.visual_delay_ms }));
    }

    fn service_stopwatch(
        &mut self,
        mut event: Option<StopwatchEvent>,
        now_ms: f64,
        events: &mut Vec<ToolkitEvent>,
    ) {
        // A load request resolves synchronously here, which can surface one
        // follow-up event; loop rather than recurse.
        loop {
            match event {
                Some(StopwatchEvent::Chime) => {
                    self.play_chime();
                    events.push(ToolkitEvent::Chime);
                    return;
                }
                Some(StopwatchEvent::LoadChime) => {
                    let ok = self.ensure_chime_sound();
                    event = self.stopwatch.chime_loaded(ok, now_ms);
                }
                None => return,
            }
        }
    }

    fn ensure_chime_sound(&mut self) -> bool {
        if self.chime_sound.is_some() {
            return true;
        }
        if !self.audio_ok {
            return false;
        }
        if let Some(audio) = self.audio.as_mut() {
            self.chime_sound = Some(audio.register(ClickSound::chime(44_100)));
            return true;
        }
        false
    }

    fn play_chime(&mut self) {
        if let (Some(audio), Some(sound)) = (self.audio.as_mut(), self.chime_sound) {
            let at = audio.now_secs();
            let _ = audio.schedule(sound, at);
        }
    }

    // --- Metronome ---

    /// Start the metronome, resuming the audio output first. A dead output
    /// degrades to visual-only ticking.
    pub fn start_metronome<W: MonotonicClock>(&mut self, wall: &W) -> Vec<ToolkitEvent> {
        if self.metronome.is_running() {
            return Vec::new();
        }
        if let Some(audio) = self.audio.as_mut() {
            self.audio_ok = audio.resume().is_ok();
        }
        let started = match self.audio.as_ref().filter(|_| self.audio_ok) {
            Some(audio) => self.metronome.start(audio, wall),
            None => self.metronome.start(&WallTimeline(wall), wall),
        };
        let mut events = Vec::new();
        if started {
            // First wake immediately, like any freshly armed timer.
            self.pump_metronome(wall, &mut events);
        }
        events
    }

    pub fn stop_metronome(&mut self) {
        self.metronome.stop();
        self.metronome_wake_ms = None;
    }

    /// Set the plain tempo; persisted unless the practice ramp owns it.
    pub fn set_metronome_bpm(&mut self, bpm: i32) -> bool {
        if !self.metronome.set_bpm(bpm) {
            return false;
        }
        self.store
            .set(settings::METRONOME_BPM, &self.metronome.bpm().to_string());
        true
    }

    pub fn adjust_metronome_bpm(&mut self, delta: i32) -> bool {
        self.set_metronome_bpm(self.metronome.bpm() as i32 + delta)
    }

    pub fn set_advanced_active(&mut self, active: bool) -> bool {
        if !self.metronome.set_advanced_active(active) {
            return false;
        }
        self.store.set(settings::ADVANCED_ACTIVE, bool_str(active));
        true
    }

    pub fn set_stop_at_finish(&mut self, stop: bool) {
        self.metronome.set_stop_at_finish(stop);
        self.store.set(settings::ADVANCED_STOP_AT_FINISH, bool_str(stop));
    }

    pub fn configure_ramp(&mut self, start_bpm: i32, finish_bpm: i32, minutes: f64) -> bool {
        if !self.metronome.configure_ramp(start_bpm, finish_bpm, minutes) {
            return false;
        }
        let ramp = self.metronome.ramp();
        self.store
            .set(settings::ADVANCED_START_BPM, &ramp.start_bpm.to_string());
        self.store
            .set(settings::ADVANCED_FINISH_BPM, &ramp.finish_bpm.to_string());
        self.store.set(
            settings::ADVANCED_PRACTICE_TIME,
            &(ramp.duration_ms / 60_000.0).to_string(),
        );
        true
    }

    pub fn advanced_panel_visible(&self) -> bool {
        self.advanced_panel_visible
    }

    pub fn set_advanced_panel_visible(&mut self, visible: bool) {
        self.advanced_panel_visible = visible;
        self.store.set(settings::ADVANCED_VISIBLE, bool_str(visible));
    }

    /// Replace the metronome tick with a custom decoded sound.
    pub fn set_tick_sound(&mut self, sound: ClickSound) {
        if let Some(audio) = self.audio.as_mut() {
            self.tick_sound = Some(audio.register(sound));
        }
    }

    // --- Stopwatch ---

    pub fn toggle_stopwatch<W: MonotonicClock>(&mut self, wall: &W) -> Vec<ToolkitEvent> {
        let now = wall.now_ms();
        let event = self.stopwatch.toggle(now);
        let mut events = Vec::new();
        self.service_stopwatch(event, now, &mut events);
        events
    }

    pub fn reset_stopwatch<W: MonotonicClock>(&mut self, wall: &W) -> Vec<ToolkitEvent> {
        let now = wall.now_ms();
        let event = self.stopwatch.reset(now);
        let mut events = Vec::new();
        self.service_stopwatch(event, now, &mut events);
        events
    }

    pub fn set_chime_interval<W: MonotonicClock>(
        &mut self,
        secs: Option<f64>,
        wall: &W,
    ) -> Vec<ToolkitEvent> {
        let now = wall.now_ms();
        let event = self.stopwatch.set_chime_interval(secs, now);
        match secs {
            Some(value) if value > 0.0 => {
                self.store.set(settings::CHIME_INTERVAL, &value.to_string())
            }
            _ => self.store.remove(settings::CHIME_INTERVAL),
        }
        let mut events = Vec::new();
        self.service_stopwatch(event, now, &mut events);
        events
    }

    /// Replace the stopwatch chime with a custom decoded sound.
    pub fn set_chime_sound(&mut self, sound: ClickSound) {
        if let Some(audio) = self.audio.as_mut() {
            self.chime_sound = Some(audio.register(sound));
        }
    }

    // --- Player ---

    /// Import a track by filename, restoring its persisted speed.
    pub fn import_track(&mut self, name: &str) -> Vec<ToolkitEvent> {
        let saved = self.store.get_f64(&settings::track_speed_key(name));
        self.player
            .add_track(Track::from_name(name, saved))
            .into_iter()
            .map(ToolkitEvent::Transport)
            .collect()
    }

    /// Apply a speed to the active track and persist it under the track's
    /// name. Idle (no-track) adjustments are deliberately not persisted.
    pub fn set_track_speed(&mut self, value: f64) -> Vec<ToolkitEvent> {
        let cmds = self.player.set_speed(value);
        if let Some(track) = self.player.current_track() {
            let speed = track.user_speed;
            let key = settings::track_speed_key(&track.name);
            self.store.set(&key, &speed.to_string());
            if track.original_bpm.is_none() {
                self.store
                    .set(settings::PLAYER_SPEED_MULTIPLIER, &speed.to_string());
            }
        }
        cmds.into_iter().map(ToolkitEvent::Transport).collect()
    }

    pub fn set_volume(&mut self, linear: f64) -> Vec<ToolkitEvent> {
        let cmds = self.player.set_volume(linear);
        self.store
            .set(settings::PLAYER_VOLUME, &self.player.volume().to_string());
        cmds.into_iter().map(ToolkitEvent::Transport).collect()
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.player.set_loop_mode(mode);
        self.store
            .set(settings::PLAYER_LOOP_TRACK, bool_str(mode == LoopMode::Track));
        self.store
            .set(settings::PLAYER_LOOP_PLAYLIST, bool_str(mode == LoopMode::Playlist));
    }

    pub fn set_silence_gap(&mut self, secs: f64) {
        self.player.set_gap_secs(secs);
        self.store
            .set(settings::PLAYER_SILENCE_INTERVAL, &self.player.gap_secs().to_string());
    }

    // --- UI-only state passthrough ---

    pub fn section_hidden(&self, section_id: &str) -> bool {
        self.store.get(&settings::section_key(section_id)) == Some("hidden")
    }

    pub fn set_section_hidden(&mut self, section_id: &str, hidden: bool) {
        self.store.set(
            &settings::section_key(section_id),
            if hidden { "hidden" } else { "shown" },
        );
    }

    pub fn theme(&self) -> Option<&str> {
        self.store.get(settings::THEME)
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.store.set(settings::THEME, theme);
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use ws_engine::AudioClock;

    #[derive(Default)]
    struct TestWall(Cell<f64>);

    impl TestWall {
        fn advance(&self, ms: f64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl MonotonicClock for TestWall {
        fn now_ms(&self) -> f64 {
            self.0.get()
        }
    }

    /// Click output that records scheduling instead of producing sound. Its
    /// clock is driven externally, independent of the wall clock.
    #[derive(Default)]
    struct FakeOutput {
        now_secs: Cell<f64>,
        registered: Cell<usize>,
        scheduled: RefCell<Vec<(SoundId, f64)>>,
        fail_resume: bool,
    }

    impl AudioClock for FakeOutput {
        fn now_secs(&self) -> f64 {
            self.now_secs.get()
        }
    }

    impl ClickOutput for FakeOutput {
        fn resume(&mut self) -> Result<(), AudioError> {
            if self.fail_resume {
                Err(AudioError::NoDevice)
            } else {
                Ok(())
            }
        }

        fn register(&mut self, _sound: ClickSound) -> SoundId {
            let id = SoundId(self.registered.get());
            self.registered.set(id.0 + 1);
            id
        }

        fn schedule(&mut self, sound: SoundId, at_secs: f64) -> Result<(), AudioError> {
            self.scheduled.borrow_mut().push((sound, at_secs));
            Ok(())
        }
    }

    fn toolkit(store: MemoryStore) -> Toolkit<MemoryStore, FakeOutput> {
        Toolkit::new(store, 7)
    }

    #[test]
    fn restores_persisted_state() {
        let mut store = MemoryStore::new();
        store.set(settings::METRONOME_BPM, "96");
        store.set(settings::CHIME_INTERVAL, "30");
        store.set(settings::PLAYER_VOLUME, "0.25");
        store.set(settings::PLAYER_LOOP_PLAYLIST, "true");
        store.set(settings::PLAYER_SILENCE_INTERVAL, "2.5");

        let toolkit = toolkit(store);
        assert_eq!(toolkit.metronome.bpm(), 96);
        assert_eq!(toolkit.stopwatch.chime_interval_ms(), 30_000.0);
        assert_eq!(toolkit.player.volume(), 0.25);
        assert_eq!(toolkit.player.loop_mode(), LoopMode::Playlist);
        assert_eq!(toolkit.player.gap_secs(), 2.5);
    }

    #[test]
    fn advanced_mode_restore_overrides_plain_tempo() {
        let mut store = MemoryStore::new();
        store.set(settings::METRONOME_BPM, "200");
        store.set(settings::ADVANCED_ACTIVE, "true");
        store.set(settings::ADVANCED_START_BPM, "70");
        store.set(settings::ADVANCED_FINISH_BPM, "140");
        store.set(settings::ADVANCED_PRACTICE_TIME, "3");

        let toolkit = toolkit(store);
        assert!(toolkit.metronome.advanced_active());
        assert_eq!(toolkit.metronome.bpm(), 70);
        assert_eq!(toolkit.metronome.ramp().duration_ms, 180_000.0);
    }

    #[test]
    fn default_volume_is_minus_six_db() {
        let toolkit = toolkit(MemoryStore::new());
        assert!((toolkit.player.volume() - db_to_linear(-6.0)).abs() < 1e-9);
    }

    #[test]
    fn metronome_ticks_schedule_on_audio_and_flash() {
        let wall = TestWall::default();
        let mut toolkit = toolkit(MemoryStore::new());
        toolkit.attach_audio(FakeOutput::default());

        let events = toolkit.start_metronome(&wall);
        assert!(events.iter().any(|e| matches!(e, ToolkitEvent::Flash { .. })));
        let audio = toolkit.audio.as_ref().unwrap();
        let scheduled = audio.scheduled.borrow();
        assert!(!scheduled.is_empty());
        // First tick lands at the start offset on the audio clock.
        assert_eq!(scheduled[0].1, 0.05);
    }

    #[test]
    fn failed_resume_degrades_to_visual_only() {
        let wall = TestWall::default();
        let mut toolkit = toolkit(MemoryStore::new());
        toolkit.attach_audio(FakeOutput { fail_resume: true, ..FakeOutput::default() });

        let events = toolkit.start_metronome(&wall);
        assert!(toolkit.metronome.is_running());
        assert!(events.iter().any(|e| matches!(e, ToolkitEvent::Flash { .. })));
        assert!(toolkit.audio.as_ref().unwrap().scheduled.borrow().is_empty());

        // Pumping keeps flashing without sound.
        wall.advance(600.0);
        let events = toolkit.pump(&wall);
        assert!(events.iter().any(|e| matches!(e, ToolkitEvent::Flash { .. })));
    }

    #[test]
    fn no_audio_at_all_still_runs() {
        let wall = TestWall::default();
        let mut toolkit = toolkit(MemoryStore::new());
        let events = toolkit.start_metronome(&wall);
        assert!(toolkit.metronome.is_running());
        assert!(!events.is_empty());
    }

    #[test]
    fn bpm_persists_on_change() {
        let mut toolkit = toolkit(MemoryStore::new());
        toolkit.set_metronome_bpm(104);
        assert_eq!(toolkit.store().get(settings::METRONOME_BPM), Some("104"));
    }

    #[test]
    fn chime_fires_through_pump() {
        let wall = TestWall::default();
        let mut toolkit = toolkit(MemoryStore::new());
        toolkit.attach_audio(FakeOutput::default());
        toolkit.set_chime_interval(Some(1.0), &wall);
        toolkit.toggle_stopwatch(&wall);

        wall.advance(1_000.0);
        let events = toolkit.pump(&wall);
        assert!(events.contains(&ToolkitEvent::Chime));

        // The chime sound was lazily registered and scheduled immediately.
        let audio = toolkit.audio.as_ref().unwrap();
        assert_eq!(audio.registered.get(), 2); // tick + chime
        assert!(!audio.scheduled.borrow().is_empty());
    }

    #[test]
    fn chime_without_audio_is_silent_but_counted() {
        let wall = TestWall::default();
        let mut toolkit = toolkit(MemoryStore::new());
        toolkit.set_chime_interval(Some(1.0), &wall);
        toolkit.toggle_stopwatch(&wall);

        wall.advance(2_500.0);
        let events = toolkit.pump(&wall);
        // No audio: boundaries pass without Chime events or panics.
        assert!(!events.contains(&ToolkitEvent::Chime));
        assert!(toolkit.stopwatch.is_running());
    }

    #[test]
    fn track_speed_persists_per_name() {
        let mut toolkit = toolkit(MemoryStore::new());
        toolkit.import_track("Song_120BPM.mp3");
        toolkit.set_track_speed(150.0);
        assert_eq!(
            toolkit.store().get("audioPlayerTrackSpeed_Song_120BPM.mp3"),
            Some("150")
        );

        // Same-named re-import restores the saved speed.
        let mut toolkit2 = Toolkit::<_, FakeOutput>::new(
            {
                let mut s = MemoryStore::new();
                s.set("audioPlayerTrackSpeed_Song_120BPM.mp3", "150");
                s
            },
            1,
        );
        toolkit2.import_track("Song_120BPM.mp3");
        assert_eq!(toolkit2.player.current_track().unwrap().user_speed, 150.0);
    }

    #[test]
    fn loop_mode_persists_both_flags() {
        let mut toolkit = toolkit(MemoryStore::new());
        toolkit.set_loop_mode(LoopMode::Track);
        assert_eq!(toolkit.store().get(settings::PLAYER_LOOP_TRACK), Some("true"));
        assert_eq!(toolkit.store().get(settings::PLAYER_LOOP_PLAYLIST), Some("false"));

        toolkit.set_loop_mode(LoopMode::Playlist);
        assert_eq!(toolkit.store().get(settings::PLAYER_LOOP_TRACK), Some("false"));
        assert_eq!(toolkit.store().get(settings::PLAYER_LOOP_PLAYLIST), Some("true"));
    }

    #[test]
    fn section_state_round_trips() {
        let mut toolkit = toolkit(MemoryStore::new());
        assert!(!toolkit.section_hidden("metronome"));
        toolkit.set_section_hidden("metronome", true);
        assert!(toolkit.section_hidden("metronome"));
        assert_eq!(toolkit.store().get("sectionToggle_metronome"), Some("hidden"));
    }

    #[test]
    fn next_deadline_reflects_widgets() {
        let wall = TestWall::default();
        let mut toolkit = toolkit(MemoryStore::new());
        assert_eq!(toolkit.next_deadline_ms(), None);

        toolkit.set_chime_interval(Some(1.0), &wall);
        toolkit.toggle_stopwatch(&wall);
        // Both the silent chime grid and the metronome wake arm deadlines.
        toolkit.start_metronome(&wall);
        assert!(toolkit.next_deadline_ms().is_some());
    }
}
