//! Named response caches.

use rusqlite::{OptionalExtension, params};

use crate::{
    offline::types::{FetchResponse, RequestKey, ResponseKind},
    storage::{
        db::{MillisSinceUnix, now_millis},
        error::StorageError,
        schema::{columns::*, tables::*},
    },
};

pub trait CacheStorage {
    /// Creates the cache if it does not exist yet.
    fn open(&mut self, name: &str) -> Result<(), StorageError>;

    /// Cache names in creation order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Drops a cache with all its entries. Returns whether it existed.
    fn delete(&mut self, name: &str) -> Result<bool, StorageError>;

    fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<FetchResponse>, StorageError>;

    fn put(
        &mut self,
        name: &str,
        key: &RequestKey,
        response: &FetchResponse,
    ) -> Result<(), StorageError>;

    /// Stores every entry or none of them.
    fn put_all(
        &mut self,
        name: &str,
        entries: &[(RequestKey, FetchResponse)],
    ) -> Result<(), StorageError>;
}

#[derive(Debug, PartialEq, Eq)]
pub struct CacheSummary {
    pub name: String,
    pub entries: usize,
    pub last_stored_at: Option<MillisSinceUnix>,
}

pub struct SqliteCacheStorage {
    pub(crate) db: rusqlite::Connection,
}

impl SqliteCacheStorage {
    pub fn new(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    pub fn summary(&self) -> Result<Vec<CacheSummary>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT c.{CACHE_NAME}, COUNT(e.{URL}), MAX(e.{STORED_AT})
             FROM {CACHES} c LEFT JOIN {CACHE_ENTRIES} e ON e.{CACHE_NAME} = c.{CACHE_NAME}
             GROUP BY c.{CACHE_NAME}
             ORDER BY c.rowid"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CacheSummary {
                    name: row.get(0)?,
                    entries: row.get::<_, i64>(1)? as usize,
                    last_stored_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert_entry(
        conn: &rusqlite::Connection,
        name: &str,
        key: &RequestKey,
        response: &FetchResponse,
        stored_at: MillisSinceUnix,
    ) -> Result<(), StorageError> {
        let headers = serde_json::to_string(&response.headers)?;
        conn.execute(
            &format!("INSERT OR IGNORE INTO {CACHES} ({CACHE_NAME}) VALUES (?1)"),
            params![name],
        )?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {CACHE_ENTRIES}
                 ({CACHE_NAME}, {METHOD}, {URL}, {STATUS}, {HEADERS}, {BODY}, {STORED_AT})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                name,
                key.method,
                key.url,
                response.status,
                headers,
                response.body,
                stored_at
            ],
        )?;
        Ok(())
    }
}

impl CacheStorage for SqliteCacheStorage {
    fn open(&mut self, name: &str) -> Result<(), StorageError> {
        self.db.execute(
            &format!("INSERT OR IGNORE INTO {CACHES} ({CACHE_NAME}) VALUES (?1)"),
            params![name],
        )?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {CACHE_NAME} FROM {CACHES} ORDER BY rowid"))?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn delete(&mut self, name: &str) -> Result<bool, StorageError> {
        let tx = self.db.transaction()?;
        tx.execute(
            &format!("DELETE FROM {CACHE_ENTRIES} WHERE {CACHE_NAME} = ?1"),
            params![name],
        )?;
        let removed = tx.execute(
            &format!("DELETE FROM {CACHES} WHERE {CACHE_NAME} = ?1"),
            params![name],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<FetchResponse>, StorageError> {
        let row = self
            .db
            .query_row(
                &format!(
                    "SELECT {STATUS}, {HEADERS}, {BODY} FROM {CACHE_ENTRIES}
                     WHERE {CACHE_NAME} = ?1 AND {METHOD} = ?2 AND {URL} = ?3"
                ),
                params![name, key.method, key.url],
                |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((status, headers, body)) = row else {
            return Ok(None);
        };
        Ok(Some(FetchResponse {
            status,
            kind: ResponseKind::Basic,
            headers: serde_json::from_str(&headers)?,
            body,
        }))
    }

    fn put(
        &mut self,
        name: &str,
        key: &RequestKey,
        response: &FetchResponse,
    ) -> Result<(), StorageError> {
        let tx = self.db.transaction()?;
        Self::insert_entry(&tx, name, key, response, now_millis())?;
        tx.commit()?;
        Ok(())
    }

    fn put_all(
        &mut self,
        name: &str,
        entries: &[(RequestKey, FetchResponse)],
    ) -> Result<(), StorageError> {
        let stored_at = now_millis();
        let tx = self.db.transaction()?;
        for (key, response) in entries {
            Self::insert_entry(&tx, name, key, response, stored_at)?;
        }
        tx.commit()?;
        Ok(())
    }
}
