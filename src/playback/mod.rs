//! Playback coordination across every rendered track widget.

pub mod controller;
pub mod error;
pub mod rate;
pub mod session;
