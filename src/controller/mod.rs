//! Controller module - Playback coordination
//!
//! `PlaybackCoordinator` is the handle screens hold. Every call becomes a
//! [`Command`] on one queue consumed by a single worker task, so transitions
//! never overlap. Submodules:
//!
//! - `transport`: track transitions and transport controls
//! - `status_events`: session status feed listener and auto-advance

mod transport;
mod status_events;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::audio::{AudioBackend, SessionStatus};
use crate::error::PlayerError;
use crate::model::{PlayQueue, PlaybackState, Track};

type Ack = oneshot::Sender<()>;

pub(crate) enum Command {
    PlayTrack {
        track: Track,
        context: Option<Vec<Track>>,
        done: Ack,
    },
    PlayNext { done: Ack },
    PlayPrevious { done: Ack },
    TogglePlayPause { done: Ack },
    Pause { done: Ack },
    ToggleShuffle { done: Ack },
    ToggleRepeat { done: Ack },
    ClearPlayer { done: Ack },
    SetCurrentTrack { track: Track, done: Ack },
    Status { generation: u64, status: SessionStatus },
    Shutdown { done: Ack },
}

/// Cheap-to-clone handle to the playback worker.
///
/// Construct once at startup (inside a tokio runtime) and hand clones to
/// every screen. The worker stops when `shutdown` is called or the last
/// handle is dropped.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PlaybackState>,
}

impl PlaybackCoordinator {
    pub fn new<B: AudioBackend>(backend: B) -> Self {
        Self::spawn(backend, StdRng::from_entropy())
    }

    /// Same as `new` with a deterministic shuffle sequence
    pub fn with_seed<B: AudioBackend>(backend: B, seed: u64) -> Self {
        Self::spawn(backend, StdRng::seed_from_u64(seed))
    }

    fn spawn<B: AudioBackend>(backend: B, rng: StdRng) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (publisher, state) = watch::channel(PlaybackState::default());

        let worker = Worker {
            backend,
            queue: PlayQueue::new(),
            session: None,
            state: PlaybackState::default(),
            publisher,
            commands: commands.downgrade(),
            rng,
            generation: 0,
        };
        tokio::spawn(worker.run(command_rx));

        tracing::info!("Playback coordinator started");
        Self { commands, state }
    }

    /// Play `track`, replacing the queue with `context` when given.
    pub async fn play_track(&self, track: Track, context: Option<Vec<Track>>) -> Result<(), PlayerError> {
        self.request(|done| Command::PlayTrack { track, context, done }).await
    }

    pub async fn play_next(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::PlayNext { done }).await
    }

    pub async fn play_previous(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::PlayPrevious { done }).await
    }

    pub async fn toggle_play_pause(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::TogglePlayPause { done }).await
    }

    /// Pause if something is playing; otherwise nothing happens.
    pub async fn pause(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::Pause { done }).await
    }

    pub async fn toggle_shuffle(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::ToggleShuffle { done }).await
    }

    pub async fn toggle_repeat(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::ToggleRepeat { done }).await
    }

    /// Release audio and forget the queue and selection (logout).
    pub async fn clear_player(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::ClearPlayer { done }).await
    }

    /// Mark `track` as selected without loading audio.
    pub async fn set_current_track(&self, track: Track) -> Result<(), PlayerError> {
        self.request(|done| Command::SetCurrentTrack { track, done }).await
    }

    /// Release audio and stop the worker.
    pub async fn shutdown(&self) -> Result<(), PlayerError> {
        self.request(|done| Command::Shutdown { done }).await
    }

    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    async fn request(&self, build: impl FnOnce(Ack) -> Command) -> Result<(), PlayerError> {
        let (done, settled) = oneshot::channel();
        self.commands
            .send(build(done))
            .map_err(|_| PlayerError::CoordinatorClosed)?;
        settled.await.map_err(|_| PlayerError::CoordinatorClosed)
    }
}

struct ActiveSession<S> {
    session: S,
    generation: u64,
    listener: JoinHandle<()>,
}

/// Sole owner of the queue, the session and the state.
pub(crate) struct Worker<B: AudioBackend> {
    backend: B,
    queue: PlayQueue,
    session: Option<ActiveSession<B::Session>>,
    state: PlaybackState,
    publisher: watch::Sender<PlaybackState>,
    commands: mpsc::WeakUnboundedSender<Command>,
    rng: StdRng,
    generation: u64,
}

impl<B: AudioBackend> Worker<B> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::PlayTrack { track, context, done } => {
                    self.play_track(track, context).await;
                    self.settle(done);
                }
                Command::PlayNext { done } => {
                    self.play_next().await;
                    self.settle(done);
                }
                Command::PlayPrevious { done } => {
                    self.play_previous().await;
                    self.settle(done);
                }
                Command::TogglePlayPause { done } => {
                    self.toggle_play_pause().await;
                    self.settle(done);
                }
                Command::Pause { done } => {
                    self.pause().await;
                    self.settle(done);
                }
                Command::ToggleShuffle { done } => {
                    self.toggle_shuffle();
                    self.settle(done);
                }
                Command::ToggleRepeat { done } => {
                    self.toggle_repeat();
                    self.settle(done);
                }
                Command::ClearPlayer { done } => {
                    self.clear_player().await;
                    self.settle(done);
                }
                Command::SetCurrentTrack { track, done } => {
                    self.set_current_track(track);
                    self.settle(done);
                }
                Command::Status { generation, status } => {
                    self.on_status(generation, status).await;
                    self.publish();
                }
                Command::Shutdown { done } => {
                    self.release_session().await;
                    self.settle(done);
                    break;
                }
            }
        }

        self.release_session().await;
        self.publish();
        tracing::info!("Playback coordinator stopped");
    }

    fn settle(&self, done: Ack) {
        self.publish();
        let _ = done.send(());
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}
