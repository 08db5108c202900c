//! Track value type and track-list loading

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PlayerError;

/// A playable item. Immutable once built.
///
/// `audio_url` is absent for tracks that are not ready yet (e.g. still being
/// generated); selecting such a track never loads audio.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            image: None,
            audio_url: None,
        }
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    /// Audio location, if the track is ready to play. Empty URLs count as absent.
    pub fn playable_url(&self) -> Option<&str> {
        self.audio_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn is_playable(&self) -> bool {
        self.playable_url().is_some()
    }
}

// Catalog APIs hand out numeric ids, generated tracks use strings.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Load a JSON array of tracks from disk
pub fn load_tracks(path: &Path) -> Result<Vec<Track>, PlayerError> {
    let content = std::fs::read_to_string(path)?;
    let tracks: Vec<Track> = serde_json::from_str(&content)
        .map_err(|e| PlayerError::Library(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(count = tracks.len(), path = %path.display(), "Track list loaded");
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn deserializes_camel_case_and_numeric_ids() {
        let json = r#"[
            {"id": 3135556, "title": "Harder", "artist": "Daft Punk", "audioUrl": "https://cdn.example/a.mp3"},
            {"id": "gen-42", "title": "Sketch", "artist": "AI", "image": "https://img.example/42.png"}
        ]"#;

        let tracks: Vec<Track> = serde_json::from_str(json).unwrap();

        assert_eq!(tracks[0].id, "3135556");
        assert_eq!(tracks[0].audio_url.as_deref(), Some("https://cdn.example/a.mp3"));
        assert!(tracks[0].is_playable());
        assert_eq!(tracks[1].id, "gen-42");
        assert_eq!(tracks[1].audio_url, None);
        assert!(!tracks[1].is_playable());
    }

    #[test]
    fn empty_audio_url_is_not_playable() {
        let track = Track::new("1", "t", "a").with_audio_url("");
        assert!(!track.is_playable());
        assert_eq!(track.playable_url(), None);
    }

    #[test]
    fn playable_url_returns_location() {
        let track = Track::new("1", "t", "a").with_audio_url("file:///music/1.flac");
        assert_eq!(track.playable_url(), Some("file:///music/1.flac"));
        assert_eq!(Track::new("2", "t", "a").playable_url(), None);
    }

    #[test]
    fn load_tracks_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "a", "title": "A", "artist": "X"}}]"#).unwrap();

        let tracks = load_tracks(file.path()).unwrap();

        assert_eq!(tracks, vec![Track::new("a", "A", "X")]);
    }

    #[test]
    fn load_tracks_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_tracks(file.path()).unwrap_err();

        assert!(matches!(err, PlayerError::Library(_)));
    }
}
