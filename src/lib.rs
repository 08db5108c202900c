//! Playback core of the Rhevo music client
//!
//! A single [`PlaybackCoordinator`] owns the one live audio session and the
//! play queue. Screens hold clones of it, call its operations and watch its
//! [`PlaybackState`].

pub mod audio;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod logging;
pub mod model;

pub use audio::{AudioBackend, AudioSession, RodioBackend, SessionStatus, StatusFeed};
pub use config::PlayerConfig;
pub use controller::PlaybackCoordinator;
pub use error::{ConfigError, PlayerError};
pub use model::{PlaybackState, RepeatMode, SessionPhase, Track};
