//! Rodio-based backend
//!
//! rodio's `OutputStream` is not `Send`, so a dedicated thread owns it along
//! with every live `Sink`. Sessions talk to that thread over a channel and get
//! their replies on oneshots. The same thread polls sinks and feeds each
//! session's status stream.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use futures::stream;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tokio::sync::oneshot;

use super::{AudioBackend, AudioSession, SessionStatus, StatusFeed};
use crate::config::PlayerConfig;
use crate::error::PlayerError;

type Reply<T> = oneshot::Sender<Result<T, PlayerError>>;

enum OutputCommand {
    Load {
        session_id: u64,
        bytes: Vec<u8>,
        autoplay: bool,
        status_tx: UnboundedSender<SessionStatus>,
        reply: Reply<Option<Duration>>,
    },
    Play { session_id: u64, reply: Reply<()> },
    Pause { session_id: u64, reply: Reply<()> },
    Stop { session_id: u64, reply: Reply<()> },
    Unload { session_id: u64, reply: Option<Reply<()>> },
}

struct LiveSink {
    sink: Sink,
    duration: Option<Duration>,
    status_tx: UnboundedSender<SessionStatus>,
    finished: bool,
}

impl LiveSink {
    fn status(&self) -> SessionStatus {
        SessionStatus {
            position_ms: self.sink.get_pos().as_millis() as u64,
            duration_ms: self.duration.map_or(0, |d| d.as_millis() as u64),
            is_playing: !self.sink.is_paused() && !self.sink.empty(),
            did_just_finish: false,
        }
    }

    /// Push a report unless the end was already reported
    fn publish(&mut self) {
        if self.finished {
            return;
        }
        let mut status = self.status();
        if self.sink.empty() {
            self.finished = true;
            status.did_just_finish = true;
            status.is_playing = false;
        }
        let _ = self.status_tx.unbounded_send(status);
    }
}

/// Backend playing URIs on the default output device.
pub struct RodioBackend {
    commands: Sender<OutputCommand>,
    http: reqwest::Client,
    next_session_id: AtomicU64,
}

impl RodioBackend {
    /// Open the default output device on a dedicated thread.
    pub fn new(config: &PlayerConfig) -> Result<Self, PlayerError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let (commands, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let interval = config.status_interval;

        std::thread::Builder::new()
            .name("rhevo-audio".to_string())
            .spawn(move || run_output_thread(command_rx, ready_tx, interval))?;

        ready_rx
            .recv()
            .map_err(|_| PlayerError::Output("audio thread exited during startup".to_string()))??;

        tracing::info!(interval_ms = interval.as_millis() as u64, "Audio output ready");

        Ok(Self {
            commands,
            http,
            next_session_id: AtomicU64::new(1),
        })
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, PlayerError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            tracing::debug!(uri, "Fetching remote audio");
            let response = self.http.get(uri).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(PlayerError::HttpStatus {
                    uri: uri.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.bytes().await?.to_vec())
        } else {
            let path = uri.strip_prefix("file://").unwrap_or(uri);
            tracing::debug!(path, "Reading local audio");
            Ok(tokio::fs::read(path).await?)
        }
    }
}

impl AudioBackend for RodioBackend {
    type Session = RodioSession;

    async fn create_session(&self, uri: &str, autoplay: bool) -> Result<RodioSession, PlayerError> {
        let bytes = self.fetch(uri).await?;
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let (status_tx, status_rx) = unbounded();

        let (reply, response) = oneshot::channel();
        self.commands
            .send(OutputCommand::Load {
                session_id,
                bytes,
                autoplay,
                status_tx,
                reply,
            })
            .map_err(|_| PlayerError::SessionClosed)?;
        let duration = response.await.map_err(|_| PlayerError::SessionClosed)??;

        tracing::debug!(session_id, uri, ?duration, "Session loaded");

        Ok(RodioSession {
            session_id,
            commands: self.commands.clone(),
            duration,
            status_feed: Some(status_rx.boxed()),
            released: false,
        })
    }
}

/// A sink living on the audio thread, addressed by id.
pub struct RodioSession {
    session_id: u64,
    commands: Sender<OutputCommand>,
    duration: Option<Duration>,
    status_feed: Option<StatusFeed>,
    released: bool,
}

/// Send one command to the audio thread and wait for its reply
async fn request(
    commands: &Sender<OutputCommand>,
    build: impl FnOnce(Reply<()>) -> OutputCommand,
) -> Result<(), PlayerError> {
    let (reply, response) = oneshot::channel();
    commands
        .send(build(reply))
        .map_err(|_| PlayerError::SessionClosed)?;
    response.await.map_err(|_| PlayerError::SessionClosed)?
}

impl AudioSession for RodioSession {
    async fn play(&mut self) -> Result<(), PlayerError> {
        let session_id = self.session_id;
        request(&self.commands, |reply| OutputCommand::Play { session_id, reply }).await
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        let session_id = self.session_id;
        request(&self.commands, |reply| OutputCommand::Pause { session_id, reply }).await
    }

    async fn stop(&mut self) -> Result<(), PlayerError> {
        let session_id = self.session_id;
        request(&self.commands, |reply| OutputCommand::Stop { session_id, reply }).await
    }

    async fn unload(mut self) -> Result<(), PlayerError> {
        let session_id = self.session_id;
        self.released = true;
        request(&self.commands, |reply| OutputCommand::Unload {
            session_id,
            reply: Some(reply),
        })
        .await
    }

    fn duration_ms(&self) -> Option<u64> {
        self.duration.map(|d| d.as_millis() as u64)
    }

    fn subscribe_status(&mut self) -> StatusFeed {
        self.status_feed
            .take()
            .unwrap_or_else(|| stream::empty().boxed())
    }
}

impl Drop for RodioSession {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.commands.send(OutputCommand::Unload {
                session_id: self.session_id,
                reply: None,
            });
        }
    }
}

fn run_output_thread(
    commands: Receiver<OutputCommand>,
    ready: Sender<Result<(), PlayerError>>,
    interval: Duration,
) {
    // The stream must outlive every sink built from its handle.
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(PlayerError::Output(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut sinks: HashMap<u64, LiveSink> = HashMap::new();
    let mut last_tick = Instant::now();

    loop {
        match commands.recv_timeout(interval) {
            Ok(command) => handle_command(command, &mut sinks, |bytes, autoplay| {
                open_sink(&handle, bytes, autoplay)
            }),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if last_tick.elapsed() >= interval {
            last_tick = Instant::now();
            for live in sinks.values_mut() {
                live.publish();
            }
        }
    }

    tracing::debug!(remaining = sinks.len(), "Audio thread shutting down");
}

fn handle_command(
    command: OutputCommand,
    sinks: &mut HashMap<u64, LiveSink>,
    open: impl FnOnce(Vec<u8>, bool) -> Result<(Sink, Option<Duration>), PlayerError>,
) {
    match command {
        OutputCommand::Load {
            session_id,
            bytes,
            autoplay,
            status_tx,
            reply,
        } => {
            let result = open(bytes, autoplay).map(|(sink, duration)| {
                let mut live = LiveSink {
                    sink,
                    duration,
                    status_tx,
                    finished: false,
                };
                live.publish();
                sinks.insert(session_id, live);
                duration
            });
            let _ = reply.send(result);
        }
        OutputCommand::Play { session_id, reply } => {
            let result = with_sink(sinks, session_id, |live| {
                live.sink.play();
                live.publish();
            });
            let _ = reply.send(result);
        }
        OutputCommand::Pause { session_id, reply } => {
            let result = with_sink(sinks, session_id, |live| {
                live.sink.pause();
                live.publish();
            });
            let _ = reply.send(result);
        }
        OutputCommand::Stop { session_id, reply } => {
            // An explicit stop drains the sink; it must not read as a natural end.
            let result = with_sink(sinks, session_id, |live| {
                live.finished = true;
                live.sink.stop();
            });
            let _ = reply.send(result);
        }
        OutputCommand::Unload { session_id, reply } => {
            let result = match sinks.remove(&session_id) {
                Some(live) => {
                    live.sink.stop();
                    Ok(())
                }
                None => Err(PlayerError::SessionClosed),
            };
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }
    }
}

fn open_sink(
    handle: &OutputStreamHandle,
    bytes: Vec<u8>,
    autoplay: bool,
) -> Result<(Sink, Option<Duration>), PlayerError> {
    let source = Decoder::new(Cursor::new(bytes)).map_err(|e| PlayerError::Decode(e.to_string()))?;
    let duration = source.total_duration();
    let sink = Sink::try_new(handle).map_err(|e| PlayerError::Output(e.to_string()))?;
    if !autoplay {
        sink.pause();
    }
    sink.append(source);
    Ok((sink, duration))
}

fn with_sink(
    sinks: &mut HashMap<u64, LiveSink>,
    session_id: u64,
    action: impl FnOnce(&mut LiveSink),
) -> Result<(), PlayerError> {
    match sinks.get_mut(&session_id) {
        Some(live) => {
            action(live);
            Ok(())
        }
        None => Err(PlayerError::SessionClosed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::channel::mpsc::UnboundedReceiver;
    use rodio::queue::SourcesQueueOutput;
    use rodio::source::SineWave;

    fn live_sink() -> (LiveSink, SourcesQueueOutput<f32>, UnboundedReceiver<SessionStatus>) {
        let (sink, output) = Sink::new_idle();
        sink.append(SineWave::new(440.0).take_duration(Duration::from_millis(20)));
        let (status_tx, status_rx) = unbounded();
        let live = LiveSink {
            sink,
            duration: Some(Duration::from_millis(20)),
            status_tx,
            finished: false,
        };
        (live, output, status_rx)
    }

    /// Pull samples the way the device would until the sink runs dry
    fn drain(sink: &Sink, output: &mut SourcesQueueOutput<f32>) {
        for _ in 0..1_000_000 {
            if sink.empty() {
                return;
            }
            output.next();
        }
    }

    fn received(rx: &mut UnboundedReceiver<SessionStatus>) -> Vec<SessionStatus> {
        let mut statuses = Vec::new();
        while let Some(Some(status)) = rx.next().now_or_never() {
            statuses.push(status);
        }
        statuses
    }

    fn no_device(_: Vec<u8>, _: bool) -> Result<(Sink, Option<Duration>), PlayerError> {
        Err(PlayerError::Output("no device".to_string()))
    }

    #[test]
    fn finish_is_reported_once() {
        let (mut live, mut output, mut rx) = live_sink();

        live.publish();
        let first = received(&mut rx);
        assert_eq!(first.len(), 1);
        assert!(!first[0].did_just_finish);
        assert!(first[0].is_playing);
        assert_eq!(first[0].duration_ms, 20);

        drain(&live.sink, &mut output);
        assert!(live.sink.empty());

        live.publish();
        live.publish();
        live.publish();

        let after = received(&mut rx);
        assert_eq!(after.len(), 1);
        assert!(after[0].did_just_finish);
        assert!(!after[0].is_playing);
    }

    #[test]
    fn explicit_stop_is_not_a_natural_end() {
        let (live, mut output, mut rx) = live_sink();
        let mut sinks = HashMap::from([(1, live)]);

        let (reply, mut response) = oneshot::channel();
        handle_command(OutputCommand::Stop { session_id: 1, reply }, &mut sinks, no_device);
        assert!(matches!(response.try_recv(), Ok(Ok(()))));

        let live = sinks.get_mut(&1).unwrap();
        drain(&live.sink, &mut output);
        live.publish();
        live.publish();

        assert!(received(&mut rx).iter().all(|status| !status.did_just_finish));
    }

    #[test]
    fn pause_reports_not_playing() {
        let (live, _output, mut rx) = live_sink();
        let mut sinks = HashMap::from([(3, live)]);

        let (reply, mut response) = oneshot::channel();
        handle_command(OutputCommand::Pause { session_id: 3, reply }, &mut sinks, no_device);

        assert!(matches!(response.try_recv(), Ok(Ok(()))));
        let statuses = received(&mut rx);
        assert_eq!(statuses.len(), 1);
        assert!(!statuses[0].is_playing);
        assert!(!statuses[0].did_just_finish);
    }

    #[test]
    fn unknown_session_is_closed() {
        let mut sinks = HashMap::new();

        let (reply, mut response) = oneshot::channel();
        handle_command(OutputCommand::Play { session_id: 9, reply }, &mut sinks, no_device);
        assert!(matches!(response.try_recv(), Ok(Err(PlayerError::SessionClosed))));

        let (reply, mut response) = oneshot::channel();
        handle_command(
            OutputCommand::Unload {
                session_id: 9,
                reply: Some(reply),
            },
            &mut sinks,
            no_device,
        );
        assert!(matches!(response.try_recv(), Ok(Err(PlayerError::SessionClosed))));
    }

    #[test]
    fn unload_removes_sink() {
        let (live, _output, _rx) = live_sink();
        let mut sinks = HashMap::from([(4, live)]);

        let (reply, mut response) = oneshot::channel();
        handle_command(
            OutputCommand::Unload {
                session_id: 4,
                reply: Some(reply),
            },
            &mut sinks,
            no_device,
        );

        assert!(matches!(response.try_recv(), Ok(Ok(()))));
        assert!(sinks.is_empty());
    }

    #[test]
    fn load_failure_is_replied() {
        let mut sinks = HashMap::new();
        let (status_tx, _status_rx) = unbounded();

        let (reply, mut response) = oneshot::channel();
        handle_command(
            OutputCommand::Load {
                session_id: 5,
                bytes: vec![0; 16],
                autoplay: true,
                status_tx,
                reply,
            },
            &mut sinks,
            no_device,
        );

        assert!(matches!(response.try_recv(), Ok(Err(PlayerError::Output(_)))));
        assert!(sinks.is_empty());
    }

    fn session(session_id: u64, commands: Sender<OutputCommand>, released: bool) -> RodioSession {
        RodioSession {
            session_id,
            commands,
            duration: None,
            status_feed: None,
            released,
        }
    }

    #[test]
    fn dropped_session_is_unloaded() {
        let (commands, command_rx) = mpsc::channel();

        drop(session(7, commands, false));

        match command_rx.try_recv() {
            Ok(OutputCommand::Unload { session_id, reply }) => {
                assert_eq!(session_id, 7);
                assert!(reply.is_none());
            }
            _ => panic!("expected an unload command"),
        }
    }

    #[test]
    fn released_session_drops_quietly() {
        let (commands, command_rx) = mpsc::channel();

        drop(session(8, commands, true));

        assert!(command_rx.try_recv().is_err());
    }
}
