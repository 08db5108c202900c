//! Core type definitions for playback state

/// Repeat mode state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    /// Next mode in the fixed Off -> All -> One -> Off cycle
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Repeat: Off",
            RepeatMode::All => "Repeat: All",
            RepeatMode::One => "Repeat: One",
        }
    }
}

/// Lifecycle of the single audio session.
///
/// `Unloaded -> Loading -> Playing | Paused -> Unloaded`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Unloaded,
    Loading,
    Playing,
    Paused,
}

impl SessionPhase {
    /// A session exists and can take transport commands
    pub fn is_ready(self) -> bool {
        matches!(self, SessionPhase::Playing | SessionPhase::Paused)
    }
}
