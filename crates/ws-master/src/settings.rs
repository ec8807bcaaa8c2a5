//! Persisted settings keys.
//!
//! The key names are the toolkit's stable external contract: a settings file
//! written by one version restores in another, and per-track speeds survive
//! re-import of a same-named file.

pub const METRONOME_BPM: &str = "metronomeBpm";
pub const ADVANCED_ACTIVE: &str = "metronomeAdvanced_active";
pub const ADVANCED_STOP_AT_FINISH: &str = "metronomeAdvanced_stopAtFinish";
pub const ADVANCED_START_BPM: &str = "metronomeAdvanced_startBpm";
pub const ADVANCED_FINISH_BPM: &str = "metronomeAdvanced_finishBpm";
pub const ADVANCED_PRACTICE_TIME: &str = "metronomeAdvanced_practiceTime";
pub const ADVANCED_VISIBLE: &str = "metronomeAdvanced_visible";
pub const CHIME_INTERVAL: &str = "stopwatchChimeInterval";
pub const PLAYER_VOLUME: &str = "audioPlayerVolume";
pub const PLAYER_SPEED_MULTIPLIER: &str = "audioPlayerSpeedMultiplier";
pub const PLAYER_LOOP_TRACK: &str = "audioPlayerLoopTrack";
pub const PLAYER_LOOP_PLAYLIST: &str = "audioPlayerLoopPlaylist";
pub const PLAYER_SILENCE_INTERVAL: &str = "audioPlayerSilenceInterval";
pub const THEME: &str = "theme";

const TRACK_SPEED_PREFIX: &str = "audioPlayerTrackSpeed_";
const SECTION_PREFIX: &str = "sectionToggle_";

pub fn track_speed_key(track_name: &str) -> String {
    format!("{}{}", TRACK_SPEED_PREFIX, track_name)
}

pub fn section_key(section_id: &str) -> String {
    format!("{}{}", SECTION_PREFIX, section_id)
}
