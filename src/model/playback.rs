//! Playback state published to screens

use super::queue::PlayQueue;
use super::track::Track;
use super::types::{RepeatMode, SessionPhase};

/// Snapshot of everything a screen needs to render the player.
///
/// `current_index` is `None` when the selected track is not in the queue (or
/// nothing is selected).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub current_index: Option<usize>,
    pub queue: Vec<Track>,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_shuffling: bool,
    pub repeat_mode: RepeatMode,
    pub phase: SessionPhase,
    pub last_error: Option<String>,
}

impl PlaybackState {
    /// Copy queue contents and cursor into the snapshot
    pub fn sync_queue(&mut self, queue: &PlayQueue) {
        self.queue = queue.tracks().to_vec();
        self.current_index = queue.current_index();
    }

    /// Drop everything tied to a session or selection; shuffle and repeat stay.
    pub fn reset(&mut self) {
        *self = Self {
            is_shuffling: self.is_shuffling,
            repeat_mode: self.repeat_mode,
            ..Self::default()
        };
    }

    /// Zero progress and mark the session gone
    pub fn release_session(&mut self) {
        self.phase = SessionPhase::Unloaded;
        self.is_playing = false;
        self.position_ms = 0;
        self.duration_ms = 0;
    }
}
