use log::debug;

use super::{controller::AudioHandle, error::PlaybackError, rate::PlaybackRate};

/// Audio handle for a widget rendered by a remote page.
///
/// The page does the actual decoding; this side only tracks the session state
/// the page is told to apply.
#[derive(Debug, Clone)]
pub struct SessionAudio {
    source_url: String,
    playing: bool,
    rate: PlaybackRate,
}

impl SessionAudio {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            playing: false,
            rate: PlaybackRate::default(),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }
}

impl AudioHandle for SessionAudio {
    fn start(&mut self) -> Result<(), PlaybackError> {
        if self.source_url.trim().is_empty() {
            return Err(PlaybackError::Start {
                source_url: self.source_url.clone(),
                reason: "no audio source".to_string(),
            });
        }
        debug!("start {} at {}", self.source_url, self.rate);
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        if self.playing {
            debug!("stop {}", self.source_url);
        }
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_rate(&mut self, rate: PlaybackRate) {
        self.rate = rate;
    }
}
