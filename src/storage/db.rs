use std::path::Path;

use anyhow::anyhow;
use chrono::{DateTime, Local, Utc};
use rusqlite::Connection;

use crate::{
    config::Database,
    storage::{error::StorageError, schema},
};

pub type MillisSinceUnix = i64;

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open(path)
}

/// Opens a connection as configured and makes sure the schema exists.
///
/// Every caller gets its own connection. With `in_memory = true` that means
/// every caller also gets its own database.
pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = match (config.in_memory, &config.path) {
        (true, _) => open_in_memory()?,
        (false, Some(path)) => open_from_file(path)?,
        (false, None) => {
            return Err(StorageError::Internal(anyhow!(
                "database.path is required when database.in_memory is false"
            )));
        }
    };
    schema::init(&db)?;
    Ok(db)
}

pub fn now_millis() -> MillisSinceUnix {
    Utc::now().timestamp_millis()
}

/// converts milliseconds since unix epoch to local date time
pub fn millis_to_local_time(since_unix: MillisSinceUnix) -> anyhow::Result<DateTime<Local>> {
    let datetime = DateTime::from_timestamp_millis(since_unix).ok_or(anyhow!(
        "failed to convert {since_unix} ms timestamp to datetime"
    ))?;

    Ok(DateTime::from(datetime))
}
