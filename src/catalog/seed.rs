use crate::domain::{id::TrackId, track::TrackRecord};

const SAMPLE_AUDIO: &str = "https://www.soundjay.com/misc/sounds/bell-ringing-05.wav";

/// Tracks a fresh catalog starts with.
pub fn seed_tracks() -> Vec<TrackRecord> {
    [(1, "Perfect Cover"), (2, "Someone Like You Cover")]
        .into_iter()
        .map(|(id, title)| TrackRecord {
            id: TrackId(id),
            title: title.to_string(),
            artist: "Laki".to_string(),
            audio_url: SAMPLE_AUDIO.to_string(),
            mp3_url: SAMPLE_AUDIO.to_string(),
            document_url: None,
        })
        .collect()
}
