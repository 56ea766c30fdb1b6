use thiserror::Error;

use crate::domain::id::TrackId;

#[derive(Debug, Error, PartialEq)]
pub enum PlaybackError {
    #[error("no widget for track {0}")]
    UnknownWidget(TrackId),

    #[error("playback rate {0} is outside 0.5x..2x")]
    InvalidRate(f32),

    #[error("failed to start {source_url}: {reason}")]
    Start { source_url: String, reason: String },
}
