use rusqlite::Connection;

pub mod tables {
    pub const SLOTS: &str = "slots";
    pub const CACHES: &str = "caches";
    pub const CACHE_ENTRIES: &str = "cache_entries";

    pub const ALL_TABLES: &[&str] = &[SLOTS, CACHES, CACHE_ENTRIES];
}

pub mod columns {
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
    pub const CACHE_NAME: &str = "cache_name";
    pub const METHOD: &str = "method";
    pub const URL: &str = "url";
    pub const STATUS: &str = "status";
    pub const HEADERS: &str = "headers";
    pub const BODY: &str = "body";
    pub const STORED_AT: &str = "stored_at";
}

pub use columns::*;
pub use tables::*;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS caches (
    cache_name TEXT PRIMARY KEY NOT NULL
);

CREATE TABLE IF NOT EXISTS cache_entries (
    cache_name TEXT NOT NULL REFERENCES caches (cache_name) ON DELETE CASCADE,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    stored_at INTEGER NOT NULL,
    PRIMARY KEY (cache_name, method, url)
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)
}
