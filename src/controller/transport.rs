//! Track transitions and transport controls

use crate::audio::{AudioBackend, AudioSession};
use crate::model::{SessionPhase, Step, Track};

use super::{ActiveSession, Worker};

impl<B: AudioBackend> Worker<B> {
    pub(super) async fn play_track(&mut self, track: Track, context: Option<Vec<Track>>) {
        let index = match context {
            Some(context) => {
                let shuffle = self.state.is_shuffling;
                tracing::debug!(context_len = context.len(), shuffle, "Replacing queue");
                self.queue.replace(context, &track, shuffle, &mut self.rng)
            }
            None => self.queue.select(&track),
        };
        tracing::debug!(track_id = %track.id, index, queue_len = self.queue.len(), "Queue position resolved");

        self.load(track).await;
    }

    pub(super) async fn play_next(&mut self) {
        let step = self
            .queue
            .next_step(self.state.repeat_mode, self.state.is_shuffling, &mut self.rng);

        match step {
            None => tracing::debug!("Next requested on empty queue"),
            Some(Step::Stop) => {
                tracing::info!("Reached end of queue, stopping playback");
                self.release_session().await;
            }
            Some(Step::Play(index)) => self.load_index(index).await,
        }
    }

    pub(super) async fn play_previous(&mut self) {
        match self.queue.previous_index(self.state.is_shuffling, &mut self.rng) {
            None => tracing::debug!("Previous requested on empty queue"),
            Some(index) => self.load_index(index).await,
        }
    }

    pub(super) async fn toggle_play_pause(&mut self) {
        let ready = self.state.phase.is_ready();
        let Some(active) = self.session.as_mut().filter(|_| ready) else {
            tracing::debug!(phase = ?self.state.phase, "Toggle requested with no ready session");
            return;
        };

        let is_playing = self.state.phase == SessionPhase::Playing;
        tracing::debug!(is_playing, "Toggling playback");

        let result = if is_playing {
            active.session.pause().await
        } else {
            active.session.play().await
        };

        match result {
            Ok(()) => {
                let phase = if is_playing { SessionPhase::Paused } else { SessionPhase::Playing };
                self.state.phase = phase;
                self.state.is_playing = phase == SessionPhase::Playing;
                tracing::info!(action = if is_playing { "paused" } else { "resumed" }, "Playback toggled");
            }
            Err(e) => tracing::error!(error = %e, "Toggle playback failed"),
        }
    }

    pub(super) async fn pause(&mut self) {
        if self.state.phase != SessionPhase::Playing {
            return;
        }
        let Some(active) = self.session.as_mut() else {
            return;
        };

        match active.session.pause().await {
            Ok(()) => {
                self.state.phase = SessionPhase::Paused;
                self.state.is_playing = false;
                tracing::info!("Playback paused");
            }
            Err(e) => tracing::error!(error = %e, "Pause failed"),
        }
    }

    pub(super) fn toggle_shuffle(&mut self) {
        self.state.is_shuffling = !self.state.is_shuffling;
        tracing::info!(shuffle = self.state.is_shuffling, "Shuffle toggled");
    }

    pub(super) fn toggle_repeat(&mut self) {
        self.state.repeat_mode = self.state.repeat_mode.next();
        tracing::info!(repeat = ?self.state.repeat_mode, "Repeat mode cycled");
    }

    pub(super) async fn clear_player(&mut self) {
        self.release_session().await;
        self.queue.clear();
        self.state.reset();
        tracing::info!("Player cleared");
    }

    pub(super) fn set_current_track(&mut self, track: Track) {
        let index = self.queue.point_at(&track.id);
        tracing::debug!(track_id = %track.id, ?index, "Current track set without playback");
        self.state.current_track = Some(track);
        self.state.sync_queue(&self.queue);
    }

    async fn load_index(&mut self, index: usize) {
        let Some(track) = self.queue.get(index).cloned() else {
            return;
        };
        self.queue.set_index(index);
        self.load(track).await;
    }

    /// Swap the session for one playing `track`. The queue cursor must
    /// already point at it.
    async fn load(&mut self, track: Track) {
        self.release_session().await;

        tracing::info!(track_id = %track.id, title = %track.title, artist = %track.artist, "Track selected");
        let uri = track.playable_url().map(str::to_owned);
        self.state.current_track = Some(track);
        self.state.sync_queue(&self.queue);

        let Some(uri) = uri else {
            tracing::debug!("Track has no audio URL, nothing to load");
            return;
        };

        self.state.phase = SessionPhase::Loading;
        self.publish();

        match self.backend.create_session(&uri, true).await {
            Ok(mut session) => {
                self.generation += 1;
                let generation = self.generation;
                let feed = session.subscribe_status();
                let listener = self.spawn_status_listener(generation, feed);

                self.state.phase = SessionPhase::Playing;
                self.state.is_playing = true;
                self.state.position_ms = 0;
                self.state.duration_ms = session.duration_ms().unwrap_or(0);
                self.state.last_error = None;
                self.session = Some(ActiveSession {
                    session,
                    generation,
                    listener,
                });
                tracing::info!(generation, uri = %uri, "Session started");
            }
            Err(e) => {
                tracing::error!(error = %e, uri = %uri, "Failed to load track");
                self.state.release_session();
                self.state.last_error = Some(e.to_string());
            }
        }
    }

    /// Stop and unload the current session. Failures are logged and ignored.
    pub(super) async fn release_session(&mut self) {
        if let Some(active) = self.session.take() {
            let ActiveSession {
                mut session,
                generation,
                listener,
            } = active;
            listener.abort();

            tracing::debug!(generation, "Releasing session");
            crate::log_backend_result!("stop", session.stop().await);
            crate::log_backend_result!("unload", session.unload().await);
        }
        self.state.release_session();
    }
}
