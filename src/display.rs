//! Plain-text formatting of playback state for the console driver

use crate::model::{PlaybackState, Track};

pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// One-line summary: track, progress, shuffle and repeat
pub fn status_line(state: &PlaybackState) -> String {
    let track_text = match &state.current_track {
        None => "No track playing".to_string(),
        Some(track) => {
            let icon = if state.is_playing { "▶" } else { "⏸" };
            format!("{} {} | {}", icon, truncate_string(&track.title, 40), truncate_string(&track.artist, 30))
        }
    };

    let shuffle_text = if state.is_shuffling { "Shuffle: On" } else { "Shuffle: Off" };

    let time_str = format!(
        "{} / {}",
        format_duration(state.position_ms),
        format_duration(state.duration_ms)
    );

    let mut line = format!(
        "{}  [{}]  {} | {}",
        track_text,
        time_str,
        shuffle_text,
        state.repeat_mode.label()
    );
    if let Some(error) = &state.last_error {
        line.push_str(&format!("  (error: {})", error));
    }
    line
}

/// Numbered queue listing with a marker on the selected row
pub fn queue_listing(state: &PlaybackState) -> String {
    if state.queue.is_empty() {
        return "Queue is empty".to_string();
    }

    let num_width = state.queue.len().to_string().len();
    state
        .queue
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if state.current_index == Some(i) { ">" } else { " " };
            format!("{} {:>width$}. {}", marker, i + 1, track_label(track), width = num_width)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn track_label(track: &Track) -> String {
    let pending = if track.is_playable() { "" } else { " (not ready)" };
    format!("{} - {}{}", track.title, track.artist, pending)
}
