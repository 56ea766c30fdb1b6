pub mod db;
pub mod error;
pub(crate) mod schema;
pub mod slot;
