use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use rhevo_player::display::{queue_listing, status_line};
use rhevo_player::logging;
use rhevo_player::model::load_tracks;
use rhevo_player::{PlaybackCoordinator, PlaybackState, PlayerConfig, RodioBackend, Track};

const HELP: &str = "\
commands:
  play <n>    play track n of the library (library becomes the queue)
  add <n>     play track n without replacing the queue
  pick <n>    select track n without playing it
  n | next    next track
  p | prev    previous track
  t | toggle  play/pause
  pause       pause
  s           toggle shuffle
  r           cycle repeat
  queue       show the queue
  lib         show the library
  clear       clear the player
  q | quit    exit";

#[tokio::main]
async fn main() -> Result<()> {
    let config = PlayerConfig::load().context("Invalid configuration")?;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== Rhevo Player Starting ===");

    let library_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| config.library.clone());
    let library = load_tracks(&library_path)
        .with_context(|| format!("Could not load track list {}", library_path.display()))?;
    tracing::info!(tracks = library.len(), path = %library_path.display(), "Library loaded");

    let backend = RodioBackend::new(&config).context("Could not open audio output")?;
    let coordinator = match config.shuffle_seed {
        Some(seed) => PlaybackCoordinator::with_seed(backend, seed),
        None => PlaybackCoordinator::new(backend),
    };

    spawn_state_printer(&coordinator);

    println!("Rhevo Player - {} tracks loaded. Type 'help' for commands.", library.len());

    let res = run_console(&coordinator, &library).await;

    coordinator.shutdown().await?;

    if let Err(err) = &res {
        tracing::error!(error = ?err, "Console error");
    }

    tracing::info!("Rhevo Player shutting down");
    res
}

async fn run_console(coordinator: &PlaybackCoordinator, library: &[Track]) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("");
        let argument = words.next();

        match command {
            "" => println!("{}", status_line(&coordinator.state())),
            "help" | "h" => println!("{}", HELP),
            "play" => {
                if let Some(track) = library_track(library, argument) {
                    coordinator.play_track(track, Some(library.to_vec())).await?;
                }
            }
            "add" => {
                if let Some(track) = library_track(library, argument) {
                    coordinator.play_track(track, None).await?;
                }
            }
            "pick" => {
                if let Some(track) = library_track(library, argument) {
                    coordinator.set_current_track(track).await?;
                }
            }
            "n" | "next" => coordinator.play_next().await?,
            "p" | "prev" => coordinator.play_previous().await?,
            "t" | "toggle" => coordinator.toggle_play_pause().await?,
            "pause" => coordinator.pause().await?,
            "s" | "shuffle" => coordinator.toggle_shuffle().await?,
            "r" | "repeat" => coordinator.toggle_repeat().await?,
            "queue" => println!("{}", queue_listing(&coordinator.state())),
            "lib" => {
                let listing = PlaybackState {
                    queue: library.to_vec(),
                    ..Default::default()
                };
                println!("{}", queue_listing(&listing));
            }
            "clear" => coordinator.clear_player().await?,
            "q" | "quit" => break,
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }

    Ok(())
}

fn library_track(library: &[Track], argument: Option<&str>) -> Option<Track> {
    let track = argument
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| library.get(i))
        .cloned();
    if track.is_none() {
        println!("Expected a track number between 1 and {}", library.len());
    }
    track
}

/// Print a status line whenever the selection, play state, modes or error change
fn spawn_state_printer(coordinator: &PlaybackCoordinator) {
    let mut updates = coordinator.subscribe();

    tokio::spawn(async move {
        let mut last_key = None;
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            let key = (
                state.current_track.as_ref().map(|t| t.id.clone()),
                state.is_playing,
                state.is_shuffling,
                state.repeat_mode,
                state.last_error.clone(),
            );
            if last_key.as_ref() != Some(&key) {
                println!("{}", status_line(&state));
                last_key = Some(key);
            }
        }
    });
}
