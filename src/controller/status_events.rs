//! Session status listener

use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::audio::{AudioBackend, SessionStatus, StatusFeed};
use crate::model::SessionPhase;

use super::{Command, Worker};

impl<B: AudioBackend> Worker<B> {
    /// Forward a session's status feed into the command queue, tagged with
    /// the session generation. Aborted when the session is released.
    pub(super) fn spawn_status_listener(&self, generation: u64, mut feed: StatusFeed) -> JoinHandle<()> {
        let commands = self.commands.clone();
        tracing::debug!(generation, "Starting status listener");

        tokio::spawn(async move {
            while let Some(status) = feed.next().await {
                let Some(commands) = commands.upgrade() else {
                    break;
                };
                if commands.send(Command::Status { generation, status }).is_err() {
                    break;
                }
            }
            tracing::trace!(generation, "Status feed ended");
        })
    }

    pub(super) async fn on_status(&mut self, generation: u64, status: SessionStatus) {
        let current = self.session.as_ref().map(|active| active.generation);
        if current != Some(generation) {
            tracing::trace!(generation, ?current, "Dropping status from released session");
            return;
        }

        if status.did_just_finish {
            tracing::info!(generation, "Track finished, advancing");
            self.state.is_playing = false;
            self.state.position_ms = 0;
            self.play_next().await;
            return;
        }

        tracing::trace!(
            position_ms = status.position_ms,
            duration_ms = status.duration_ms,
            is_playing = status.is_playing,
            "Session status"
        );
        self.state.position_ms = status.position_ms;
        if status.duration_ms > 0 {
            self.state.duration_ms = status.duration_ms;
        }
        // A report can predate the last pause or resume; it never contradicts the phase.
        match (status.is_playing, self.state.phase) {
            (true, SessionPhase::Playing) => self.state.is_playing = true,
            (false, SessionPhase::Playing) => {}
            _ => self.state.is_playing = false,
        }
    }
}
