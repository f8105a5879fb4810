//! Database interface.

use std::path::Path;

use rusqlite::{params, OptionalExtension, Row};

use crate::prelude::*;

/// Wraps `rusqlite::Connection` and provides the high-level database methods.
pub struct Db {
    connection: rusqlite::Connection,
}

impl Db {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let mut connection = rusqlite::Connection::open(path)?;
        // Overlapping invocations serialize on SQLite's own locking.
        connection.busy_timeout(std::time::Duration::from_secs(5))?;
        connection.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        connection.execute_batch("PRAGMA synchronous = NORMAL")?;
        migrate(&mut connection)?;
        Ok(Self { connection })
    }

    /// Appends the reading as one atomic statement. A reading with the same
    /// timestamp is never overwritten, the conflict is reported instead.
    pub fn insert_reading(&self, reading: &Reading) -> Result<(), StorageError> {
        let result = self
            .connection
            .prepare_cached(
                // language=sql
                r#"
                INSERT INTO readings (timestamp, occupancy_count, temperature, precipitation)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?
            .execute(params![
                reading.timestamp.to_rfc3339(),
                reading.occupancy_count,
                reading.temperature,
                reading.precipitation,
            ]);
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(error, _))
                if error.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateTimestamp(reading.timestamp))
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn select_reading(&self, timestamp: &DateTime<Local>) -> Result<Option<Reading>, StorageError> {
        Ok(self
            .connection
            .prepare_cached(
                // language=sql
                r"SELECT timestamp, occupancy_count, temperature, precipitation FROM readings WHERE timestamp = ?1",
            )?
            .query_row(params![timestamp.to_rfc3339()], get_reading)
            .optional()?)
    }

    pub fn select_reading_count(&self) -> Result<u64, StorageError> {
        Ok(self
            .connection
            // language=sql
            .prepare_cached(r"SELECT COUNT(*) FROM readings")?
            .query_row([], |row| row.get::<_, i64>(0))? as u64)
    }

    /// Timestamp of the newest stored reading, used for the gap warning on
    /// daemon startup.
    pub fn select_last_timestamp(&self) -> Result<Option<DateTime<Local>>, StorageError> {
        let timestamp: Option<String> = self
            .connection
            // language=sql
            .prepare_cached(r"SELECT MAX(timestamp) FROM readings")?
            .query_row([], |row| row.get(0))?;
        Ok(timestamp
            .as_deref()
            .and_then(|timestamp| DateTime::parse_from_rfc3339(timestamp).ok())
            .map(|timestamp| timestamp.with_timezone(&Local)))
    }

    /// Journals a failed stage so gaps in the dataset are explainable later.
    pub fn insert_error(
        &self,
        timestamp: &DateTime<Local>,
        stage: &str,
        message: &str,
    ) -> Result<(), StorageError> {
        self.connection
            .prepare_cached(
                // language=sql
                r"INSERT INTO errors (timestamp, stage, message) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![timestamp.to_rfc3339(), stage, message])?;
        Ok(())
    }

    pub fn select_error_count(&self) -> Result<u64, StorageError> {
        Ok(self
            .connection
            // language=sql
            .prepare_cached(r"SELECT COUNT(*) FROM errors")?
            .query_row([], |row| row.get::<_, i64>(0))? as u64)
    }

    #[cfg(test)]
    pub fn get_user_version(&self) -> Result<i64, StorageError> {
        Ok(self
            .connection
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }
}

fn migrate(connection: &mut rusqlite::Connection) -> Result<(), StorageError> {
    let user_version: i64 = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    for (i, migration) in MIGRATIONS.iter().enumerate() {
        if user_version < (i + 1) as i64 {
            info!("Applying migration #{}…", i + 1);
            let tx = connection.transaction()?;
            tx.execute_batch(migration)?;
            tx.commit()?;
        }
    }
    Ok(())
}

/// Builds a `Reading` instance based on the database row.
fn get_reading(row: &Row) -> rusqlite::Result<Reading> {
    let timestamp: String = row.get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
        })?
        .with_timezone(&Local);
    Ok(Reading {
        timestamp,
        occupancy_count: row.get("occupancy_count")?,
        temperature: row.get("temperature")?,
        precipitation: row.get("precipitation")?,
    })
}

const MIGRATIONS: &[&str] = &[
    // language=sql
    r#"
    CREATE TABLE IF NOT EXISTS readings (
        timestamp TEXT NOT NULL PRIMARY KEY, -- RFC 3339, aligned to the tick boundary
        occupancy_count INTEGER NOT NULL,
        temperature REAL NULL, -- degrees in the configured unit system
        precipitation REAL NULL -- rain over the last hour, mm
    );

    CREATE TABLE IF NOT EXISTS errors (
        timestamp TEXT NOT NULL, -- RFC 3339
        stage TEXT NOT NULL,
        message TEXT NOT NULL
    );

    PRAGMA user_version = 1;
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Reading {
        Reading {
            timestamp: Local.with_ymd_and_hms(2026, 2, 12, 14, 15, 0).unwrap(),
            occupancy_count: 42,
            temperature: Some(5.3),
            precipitation: Some(0.0),
        }
    }

    #[test]
    fn insert_then_select_ok() -> Result<(), StorageError> {
        let db = Db::open(":memory:")?;
        let reading = reading();
        db.insert_reading(&reading)?;
        assert_eq!(db.select_reading(&reading.timestamp)?, Some(reading));
        assert_eq!(db.select_reading_count()?, 1);
        Ok(())
    }

    #[test]
    fn partial_reading_roundtrips_nulls() -> Result<(), StorageError> {
        let db = Db::open(":memory:")?;
        let reading = Reading {
            temperature: None,
            precipitation: None,
            ..reading()
        };
        db.insert_reading(&reading)?;
        assert_eq!(db.select_reading(&reading.timestamp)?, Some(reading));
        Ok(())
    }

    #[test]
    fn double_insert_keeps_the_first_row() -> Result<(), StorageError> {
        let db = Db::open(":memory:")?;
        let first = reading();
        db.insert_reading(&first)?;
        let second = Reading {
            occupancy_count: 99,
            ..first.clone()
        };
        match db.insert_reading(&second) {
            Err(StorageError::DuplicateTimestamp(timestamp)) => assert_eq!(timestamp, first.timestamp),
            other => panic!("expected a duplicate-timestamp error, got {:?}", other),
        }
        assert_eq!(db.select_reading_count()?, 1);
        assert_eq!(db.select_reading(&first.timestamp)?, Some(first));
        Ok(())
    }

    #[test]
    fn select_reading_returns_none_on_empty_database() -> Result<(), StorageError> {
        let db = Db::open(":memory:")?;
        assert_eq!(db.select_reading(&Local::now())?, None);
        Ok(())
    }

    #[test]
    fn last_timestamp_is_the_newest_one() -> Result<(), StorageError> {
        let db = Db::open(":memory:")?;
        assert_eq!(db.select_last_timestamp()?, None);
        let older = reading();
        let newer = Reading {
            timestamp: older.timestamp + chrono::Duration::minutes(15),
            ..older.clone()
        };
        db.insert_reading(&older)?;
        db.insert_reading(&newer)?;
        assert_eq!(db.select_last_timestamp()?, Some(newer.timestamp));
        Ok(())
    }

    #[test]
    fn error_journal_ok() -> Result<(), StorageError> {
        let db = Db::open(":memory:")?;
        db.insert_error(&Local::now(), "weather", "rate limit exceeded")?;
        assert_eq!(db.select_error_count()?, 1);
        Ok(())
    }

    #[test]
    fn reopening_keeps_rows_and_schema_version() -> Result<(), StorageError> {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("gymlog.sqlite3");
        let reading = reading();
        {
            let db = Db::open(&path)?;
            db.insert_reading(&reading)?;
        }
        let db = Db::open(&path)?;
        assert_eq!(db.get_user_version()?, MIGRATIONS.len() as i64);
        assert_eq!(db.select_reading(&reading.timestamp)?, Some(reading));
        Ok(())
    }
}
