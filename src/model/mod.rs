//! Model module - Playback data types and state
//!
//! - `types`: Repeat mode and session phase enums
//! - `track`: Track value type and track-list loading
//! - `queue`: Play queue with shuffle/repeat index policy
//! - `playback`: Snapshot published to subscribers

mod types;
mod track;
mod queue;
mod playback;

pub use types::{RepeatMode, SessionPhase};

pub use track::{load_tracks, Track};

pub use queue::{PlayQueue, Step};

pub use playback::PlaybackState;
