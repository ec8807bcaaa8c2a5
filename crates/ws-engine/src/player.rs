//! Audio-player coordination: transport state machine, per-track speed
//! control, loop and silence-gap sequencing.
//!
//! The player never touches audio bytes. It owns the playlist, decides what
//! should happen, and emits [`TransportCmd`]s for the host's actual track
//! transport to carry out; the host reports position and duration back.

use alloc::vec::Vec;

use ws_core::{
    clamp_speed, effective_rate, step_db, EndAction, LoopMode, Playlist, RemoveOutcome,
    SpeedMode, Track,
};

/// Command for the host's track transport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransportCmd {
    /// Load the track at this playlist index at the given playback rate.
    Load { index: usize, rate: f64, play: bool },
    Play,
    Pause,
    /// Stop and rewind to the top of the loaded track.
    Halt,
    /// Seek the loaded track to this position, seconds.
    Seek(f64),
    /// Re-apply the playback rate to the loaded track.
    SetRate(f64),
    /// Apply a linear output gain.
    SetVolume(f64),
}

/// Pending silence gap between a natural end and its follow-up action.
#[derive(Clone, Copy, Debug)]
struct SilenceGap {
    deadline_ms: f64,
    action: EndAction,
}

/// Once a track is more than this far in, "previous" restarts it instead of
/// stepping back.
const RESTART_THRESHOLD_SECS: f64 = 3.0;

pub struct Player {
    playlist: Playlist,
    loop_mode: LoopMode,
    gap_secs: f64,
    gap: Option<SilenceGap>,
    volume: f64,
    playing: bool,
    /// Host-reported position of the loaded track, seconds.
    position_secs: f64,
}

impl Player {
    pub fn new() -> Self {
        Self {
            playlist: Playlist::new(),
            loop_mode: LoopMode::Off,
            gap_secs: 0.0,
            gap: None,
            volume: 1.0,
            playing: false,
            position_secs: 0.0,
        }
    }

    // --- Accessors ---

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn gap_secs(&self) -> f64 {
        self.gap_secs
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.current_track()
    }

    /// Speed mode of the active track; multiplier when nothing is loaded.
    pub fn speed_mode(&self) -> SpeedMode {
        SpeedMode::for_track(self.current_track().and_then(|t| t.original_bpm))
    }

    /// Speed value to display: the active track's, or the idle default 1.0x.
    pub fn display_speed(&self) -> f64 {
        self.current_track().map_or(1.0, |t| t.user_speed)
    }

    /// Remaining silence-gap time, if a countdown is active.
    pub fn gap_remaining_ms(&self, now_ms: f64) -> Option<f64> {
        self.gap.map(|g| (g.deadline_ms - now_ms).max(0.0))
    }

    /// Wall deadline the host should next poll at, if any.
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.gap.map(|g| g.deadline_ms)
    }

    // --- Host feedback ---

    pub fn report_position(&mut self, secs: f64) {
        self.position_secs = secs;
    }

    pub fn report_duration(&mut self, secs: f64) {
        if let Some(track) = self.playlist.current_track_mut() {
            track.duration_secs = secs;
        }
    }

    /// Host confirmation of the transport's actual play/pause state.
    pub fn report_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    // --- Playlist management ---

    /// Append an imported track. The first import auto-loads (paused) so the
    /// transport has something ready.
    pub fn add_track(&mut self, track: Track) -> Vec<TransportCmd> {
        self.playlist.push(track);
        if self.playlist.current_index().is_none() {
            self.load(self.playlist.len() - 1, false)
        } else {
            Vec::new()
        }
    }

    pub fn remove_track(&mut self, index: usize) -> Vec<TransportCmd> {
        let was_playing = self.playing;
        match self.playlist.remove(index) {
            RemoveOutcome::Emptied => self.stop(true),
            RemoveOutcome::CurrentReplaced(new_index) => self.load(new_index, was_playing),
            RemoveOutcome::Removed | RemoveOutcome::OutOfRange => Vec::new(),
        }
    }

    pub fn shift_track(&mut self, index: usize, direction: i32) -> bool {
        self.playlist.shift(index, direction)
    }

    pub fn clear(&mut self) -> Vec<TransportCmd> {
        let cmds = self.stop(true);
        self.playlist.clear();
        cmds
    }

    // --- Transport ---

    /// Load `index` and optionally start it. Any pending silence gap is a
    /// user-visible wait; explicit loading cancels it.
    pub fn load(&mut self, index: usize, play: bool) -> Vec<TransportCmd> {
        self.gap = None;
        if self.playlist.is_empty() || !self.playlist.select(index) {
            return self.stop(true);
        }
        self.position_secs = 0.0;
        self.playing = play;
        let rate = match self.playlist.current_track() {
            Some(track) => effective_rate(track.original_bpm, track.user_speed),
            None => 1.0,
        };
        let mut cmds = Vec::new();
        cmds.push(TransportCmd::Load { index, rate, play });
        cmds
    }

    pub fn play_pause(&mut self) -> Vec<TransportCmd> {
        self.gap = None;
        match self.playlist.current_index() {
            None if !self.playlist.is_empty() => self.load(0, true),
            None => Vec::new(),
            Some(_) => {
                self.playing = !self.playing;
                let mut cmds = Vec::new();
                cmds.push(if self.playing { TransportCmd::Play } else { TransportCmd::Pause });
                cmds
            }
        }
    }

    /// Stop playback and rewind. With `clear_selection` the player also
    /// forgets the active track and reverts the speed UI to the idle
    /// multiplier default — without touching any track's stored speed.
    pub fn stop(&mut self, clear_selection: bool) -> Vec<TransportCmd> {
        self.gap = None;
        self.playing = false;
        self.position_secs = 0.0;
        if clear_selection {
            self.playlist.clear_selection();
        }
        let mut cmds = Vec::new();
        cmds.push(TransportCmd::Halt);
        cmds
    }

    pub fn next(&mut self) -> Vec<TransportCmd> {
        self.gap = None;
        if self.playlist.is_empty() {
            return Vec::new();
        }
        match self.playlist.next_index(self.loop_mode) {
            Some(index) => self.load(index, true),
            None => self.stop(false),
        }
    }

    /// Previous track, with the restart rule: a track more than a few
    /// seconds in restarts instead of stepping back.
    pub fn previous(&mut self) -> Vec<TransportCmd> {
        self.gap = None;
        if self.playlist.is_empty() {
            return Vec::new();
        }
        if self.position_secs > RESTART_THRESHOLD_SECS && self.playlist.current_index().is_some() {
            self.position_secs = 0.0;
            let mut cmds = Vec::new();
            cmds.push(TransportCmd::Seek(0.0));
            if !self.playing {
                self.playing = true;
                cmds.push(TransportCmd::Play);
            }
            return cmds;
        }
        match self.playlist.prev_index(self.loop_mode) {
            Some(index) => self.load(index, true),
            None => Vec::new(),
        }
    }

    // --- Speed ---

    /// Apply a requested speed to the active track: clamp into the track's
    /// mode range, store it, and emit the resulting playback rate. With no
    /// active track the value only adjusts the idle rate and is not stored.
    pub fn set_speed(&mut self, value: f64) -> Vec<TransportCmd> {
        let mut cmds = Vec::new();
        match self.playlist.current_track_mut() {
            Some(track) => {
                let mode = SpeedMode::for_track(track.original_bpm);
                track.user_speed = clamp_speed(mode, value);
                cmds.push(TransportCmd::SetRate(effective_rate(
                    track.original_bpm,
                    track.user_speed,
                )));
            }
            None => {
                cmds.push(TransportCmd::SetRate(clamp_speed(SpeedMode::Multiplier, value)));
            }
        }
        cmds
    }

    /// Step the active track's speed: ±5 BPM / ±0.05x, or ±1 BPM / ±0.01x
    /// with `fine`.
    pub fn nudge_speed(&mut self, up: bool, fine: bool) -> Vec<TransportCmd> {
        let Some(track) = self.playlist.current_track() else {
            return Vec::new();
        };
        let step = match (SpeedMode::for_track(track.original_bpm), fine) {
            (SpeedMode::Bpm, false) => 5.0,
            (SpeedMode::Bpm, true) => 1.0,
            (SpeedMode::Multiplier, false) => 0.05,
            (SpeedMode::Multiplier, true) => 0.01,
        };
        let target = track.user_speed + if up { step } else { -step };
        self.set_speed(target)
    }

    // --- Volume ---

    pub fn set_volume(&mut self, linear: f64) -> Vec<TransportCmd> {
        self.volume = linear.clamp(0.0, 1.0);
        let mut cmds = Vec::new();
        cmds.push(TransportCmd::SetVolume(self.volume));
        cmds
    }

    pub fn step_volume(&mut self, delta_db: f64) -> Vec<TransportCmd> {
        self.set_volume(step_db(self.volume, delta_db))
    }

    // --- Sequencing ---

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    /// Configure the silence gap, seconds. Invalid or negative input means
    /// no gap.
    pub fn set_gap_secs(&mut self, secs: f64) {
        self.gap_secs = if secs.is_finite() && secs >= 0.0 { secs } else { 0.0 };
    }

    /// The loaded track ran out. The loop decision is made immediately; a
    /// configured gap only delays its execution.
    pub fn natural_end(&mut self, now_ms: f64) -> Vec<TransportCmd> {
        self.playing = false;
        let action = self.playlist.end_action(self.loop_mode);
        if self.gap_secs > 0.0 && action != EndAction::Stop {
            self.gap = Some(SilenceGap {
                deadline_ms: now_ms + self.gap_secs * 1000.0,
                action,
            });
            Vec::new()
        } else {
            self.perform(action)
        }
    }

    /// Drive the pending silence gap. Call on every host wake.
    pub fn poll(&mut self, now_ms: f64) -> Vec<TransportCmd> {
        match self.gap {
            Some(gap) if now_ms >= gap.deadline_ms => {
                self.gap = None;
                self.perform(gap.action)
            }
            _ => Vec::new(),
        }
    }

    fn perform(&mut self, action: EndAction) -> Vec<TransportCmd> {
        match action {
            EndAction::Replay => {
                self.position_secs = 0.0;
                self.playing = true;
                let mut cmds = Vec::new();
                cmds.push(TransportCmd::Seek(0.0));
                cmds.push(TransportCmd::Play);
                cmds
            }
            EndAction::Advance(index) => self.load(index, true),
            EndAction::Stop => self.stop(false),
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
