pub mod confirm;
pub mod error;
pub mod media;
pub mod seed;
pub mod store;
