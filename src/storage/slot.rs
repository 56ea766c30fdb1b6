//! String-keyed persistence slots.
//!
//! A slot holds one serialized value and is always written whole.

use rusqlite::{OptionalExtension, params};

use crate::storage::{
    error::StorageError,
    schema::{KEY, SLOTS, VALUE},
};

pub trait KeyValueSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value under `key`. Readers observe either the old or the new value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

pub struct SqliteSlot {
    pub(crate) db: rusqlite::Connection,
}

impl SqliteSlot {
    pub fn new(db: rusqlite::Connection) -> Self {
        Self { db }
    }
}

impl KeyValueSlot for SqliteSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .db
            .query_row(
                &format!("SELECT {VALUE} FROM {SLOTS} WHERE {KEY} = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.execute(
            &format!(
                "INSERT INTO {SLOTS} ({KEY}, {VALUE}) VALUES (?1, ?2)
                 ON CONFLICT ({KEY}) DO UPDATE SET {VALUE} = excluded.{VALUE}"
            ),
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::storage::schema;

    fn setup_slot() -> anyhow::Result<SqliteSlot> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(SqliteSlot::new(conn))
    }

    #[test]
    fn missing_key_reads_as_none() -> anyhow::Result<()> {
        let slot = setup_slot()?;
        assert_eq!(slot.read("songs")?, None);
        Ok(())
    }

    #[test]
    fn write_overwrites_previous_value() -> anyhow::Result<()> {
        let mut slot = setup_slot()?;
        slot.write("songs", "[1]")?;
        slot.write("songs", "[1,2]")?;

        assert_eq!(slot.read("songs")?.as_deref(), Some("[1,2]"));

        let rows: i64 = slot
            .db
            .query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))?;
        assert_eq!(rows, 1);
        Ok(())
    }

    #[test]
    fn keys_are_independent() -> anyhow::Result<()> {
        let mut slot = setup_slot()?;
        slot.write("a", "1")?;
        slot.write("b", "2")?;
        assert_eq!(slot.read("a")?.as_deref(), Some("1"));
        assert_eq!(slot.read("b")?.as_deref(), Some("2"));
        Ok(())
    }
}
