//! Offline support: a versioned response cache sitting in front of the page server.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod types;
pub mod worker;
