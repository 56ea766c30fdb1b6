use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::id::TrackId;

/// One song of the catalog together with its resource locators.
///
/// Serialized with the camelCase field names used by the persisted slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub id: TrackId,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Locator used for playback.
    pub audio_url: String,
    /// Locator used for the audio download. May equal `audio_url`.
    pub mp3_url: String,
    #[serde(default)]
    pub document_url: Option<String>,
}

impl TrackRecord {
    /// Artist as shown on the track card.
    pub fn display_artist(&self) -> &str {
        if self.artist.is_empty() {
            "Unknown Artist"
        } else {
            &self.artist
        }
    }

    pub fn audio_filename(&self) -> String {
        format!("{}.mp3", self.title)
    }

    pub fn document_filename(&self) -> String {
        format!("{}-document.pdf", self.title)
    }
}

/// A resource the user picked for a new track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// A local file, referenced through a `file://` locator.
    File(PathBuf),
    /// An already playable locator.
    Url(String),
}

/// Input of the "add song" action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub audio: Option<MediaSource>,
    /// Overrides the download locator. Defaults to a fresh locator for `audio`.
    #[serde(default)]
    pub download: Option<MediaSource>,
    #[serde(default)]
    pub document: Option<MediaSource>,
}
