//! Playlist bookkeeping and the end-of-track sequencing policy.

use alloc::string::String;

use slotmap::SlotMap;

use crate::speed::{parse_bpm_from_name, resolve_initial_speed};

slotmap::new_key_type! {
    /// Stable identity for a playlist track across reorders and removals.
    pub struct TrackKey;
}

/// An imported track. The audio bytes themselves live with the host; the
/// playlist keeps only what sequencing and speed control need.
#[derive(Clone, Debug)]
pub struct Track {
    pub name: String,
    /// Tempo parsed from the filename, if any. Fixes the speed mode.
    pub original_bpm: Option<u16>,
    /// Target BPM when `original_bpm` is set, playback multiplier otherwise.
    pub user_speed: f64,
    /// Known duration in seconds, 0 until reported by the host.
    pub duration_secs: f64,
}

impl Track {
    /// Build a track from its filename, restoring a previously saved speed
    /// when one is supplied and usable.
    pub fn from_name(name: &str, saved_speed: Option<f64>) -> Self {
        let original_bpm = parse_bpm_from_name(name);
        Self {
            name: String::from(name),
            original_bpm,
            user_speed: resolve_initial_speed(saved_speed, original_bpm),
            duration_secs: 0.0,
        }
    }
}

/// What happens when a track reaches its natural end.
///
/// `Track` and `Playlist` are mutually exclusive by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    #[default]
    Off,
    Track,
    Playlist,
}

/// Decision taken at a track's natural end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndAction {
    /// Replay the current index from the top.
    Replay,
    /// Load and play the given index.
    Advance(usize),
    /// Nothing left to play.
    Stop,
}

/// Result of removing a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// A non-current track was removed; the selection was preserved.
    Removed,
    /// The current track was removed; the new index should be (re)loaded.
    CurrentReplaced(usize),
    /// The playlist is now empty.
    Emptied,
    /// Index was invalid; nothing changed.
    OutOfRange,
}

/// Ordered track sequence with an optional current selection.
#[derive(Clone, Debug, Default)]
pub struct Playlist {
    tracks: SlotMap<TrackKey, Track>,
    order: alloc::vec::Vec<TrackKey>,
    current: Option<usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(*self.order.get(index)?)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(*self.order.get(index)?)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.get(self.current?)
    }

    pub fn current_track_mut(&mut self) -> Option<&mut Track> {
        self.get_mut(self.current?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.order.iter().filter_map(|&key| self.tracks.get(key))
    }

    /// Append a track and return its stable key.
    pub fn push(&mut self, track: Track) -> TrackKey {
        let key = self.tracks.insert(track);
        self.order.push(key);
        key
    }

    /// Make `index` the current selection. Invalid indices are rejected.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.order.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
    }

    /// Remove the track at `index`, keeping the selection pointed at the
    /// same track where possible.
    pub fn remove(&mut self, index: usize) -> RemoveOutcome {
        if index >= self.order.len() {
            return RemoveOutcome::OutOfRange;
        }
        let key = self.order.remove(index);
        self.tracks.remove(key);

        if self.order.is_empty() {
            self.current = None;
            return RemoveOutcome::Emptied;
        }
        match self.current {
            Some(cur) if index == cur => {
                // The removed track was playing; fall to the next one, or
                // the new last track if the end was removed.
                let replacement = cur.min(self.order.len() - 1);
                self.current = Some(replacement);
                RemoveOutcome::CurrentReplaced(replacement)
            }
            Some(cur) if index < cur => {
                self.current = Some(cur - 1);
                RemoveOutcome::Removed
            }
            _ => RemoveOutcome::Removed,
        }
    }

    /// Swap a track one step up (`-1`) or down (`+1`), following the
    /// selection if either endpoint is current.
    pub fn shift(&mut self, index: usize, direction: i32) -> bool {
        let Some(target) = index.checked_add_signed(direction as isize) else {
            return false;
        };
        if index >= self.order.len() || target >= self.order.len() {
            return false;
        }
        self.order.swap(index, target);
        if self.current == Some(index) {
            self.current = Some(target);
        } else if self.current == Some(target) {
            self.current = Some(index);
        }
        true
    }

    /// Drop every track and the selection.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.order.clear();
        self.current = None;
    }

    /// Index the explicit "next" action lands on. Track-looping is ignored
    /// here: skipping forward always moves forward.
    pub fn next_index(&self, loop_mode: LoopMode) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let next = self.current.map_or(0, |cur| cur + 1);
        if next < self.order.len() {
            Some(next)
        } else if loop_mode == LoopMode::Playlist {
            Some(0)
        } else {
            None
        }
    }

    /// Index the explicit "previous" action lands on (the restart-current
    /// rule is the player's concern, not the playlist's).
    pub fn prev_index(&self, loop_mode: LoopMode) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        match self.current {
            Some(cur) if cur > 0 => Some(cur - 1),
            _ if loop_mode == LoopMode::Playlist => Some(self.order.len() - 1),
            // Not looping: land on the first track rather than stopping.
            _ => Some(0),
        }
    }

    /// Decide what a natural track end leads to.
    pub fn end_action(&self, loop_mode: LoopMode) -> EndAction {
        let Some(cur) = self.current else {
            return EndAction::Stop;
        };
        match loop_mode {
            LoopMode::Track => EndAction::Replay,
            _ => match self.next_index(loop_mode) {
                Some(next) => EndAction::Advance(next),
                None => EndAction::Stop,
            },
        }
        .normalize(cur, self.order.len())
    }
}

impl EndAction {
    /// Guard against a stale selection index.
    fn normalize(self, current: usize, len: usize) -> EndAction {
        match self {
            EndAction::Replay if current >= len => EndAction::Stop,
            EndAction::Advance(i) if i >= len => EndAction::Stop,
            other => other,
        }
    }
}
