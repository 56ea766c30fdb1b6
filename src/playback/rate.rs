use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::PlaybackError;

/// Playback speed multiplier of one widget, between 0.5x and 2x.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 2.0;
    pub const NORMAL: PlaybackRate = PlaybackRate(1.0);

    pub fn new(rate: f32) -> Result<Self, PlaybackError> {
        if rate.is_finite() && (Self::MIN..=Self::MAX).contains(&rate) {
            Ok(Self(rate))
        } else {
            Err(PlaybackError::InvalidRate(rate))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f32> for PlaybackRate {
    type Error = PlaybackError;

    fn try_from(rate: f32) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<PlaybackRate> for f32 {
    fn from(rate: PlaybackRate) -> Self {
        rate.0
    }
}

/// Accepts `1.5` as well as `1.5x`.
impl FromStr for PlaybackRate {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['x', 'X']);
        let rate = trimmed
            .parse::<f32>()
            .map_err(|_| PlaybackError::InvalidRate(f32::NAN))?;
        Self::new(rate)
    }
}

impl Display for PlaybackRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.0)
    }
}
