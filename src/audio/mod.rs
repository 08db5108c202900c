//! Audio backend boundary
//!
//! The coordinator only talks to these traits. A backend turns a URI into a
//! loaded session; a session takes transport commands and reports progress
//! through a [`StatusFeed`].

mod rodio_backend;

use std::future::Future;

use futures::stream::BoxStream;

use crate::error::PlayerError;

pub use rodio_backend::RodioBackend;

/// One progress report from a live session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
    /// Set once, on the report that follows the end of the resource
    pub did_just_finish: bool,
}

/// Stream of status reports. Ends when the session is released.
pub type StatusFeed = BoxStream<'static, SessionStatus>;

/// Factory for audio sessions.
pub trait AudioBackend: Send + Sync + 'static {
    type Session: AudioSession;

    /// Load `uri` and return a ready session, already playing if `autoplay`.
    fn create_session(
        &self,
        uri: &str,
        autoplay: bool,
    ) -> impl Future<Output = Result<Self::Session, PlayerError>> + Send;
}

/// Handle to one loaded audio resource.
pub trait AudioSession: Send + 'static {
    fn play(&mut self) -> impl Future<Output = Result<(), PlayerError>> + Send;

    fn pause(&mut self) -> impl Future<Output = Result<(), PlayerError>> + Send;

    fn stop(&mut self) -> impl Future<Output = Result<(), PlayerError>> + Send;

    /// Release the resource. The session is consumed.
    fn unload(self) -> impl Future<Output = Result<(), PlayerError>> + Send;

    /// Duration known at load time, if the format reports one
    fn duration_ms(&self) -> Option<u64>;

    /// Take the status feed. A second call yields an empty stream.
    fn subscribe_status(&mut self) -> StatusFeed;
}
