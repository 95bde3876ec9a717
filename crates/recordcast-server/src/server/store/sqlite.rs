//! SQLite-backed [`RecordStore`].
//!
//! # Invariants
//! - The `users` table exists before [`SqliteStore::open`] returns.
//! - `name` and `occupation` are fixed-width `CHARACTER(50)` columns: values
//!   are space-padded on write, rejected when longer than the column, and
//!   stripped of padding on read.
//! - Every blocking SQLite call runs on Tokio's blocking pool.

use super::RecordStore;
use parking_lot::Mutex;
use recordcast_core::{
    Error, Result,
    types::{Record, Salary},
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::sync::Arc;
use std::time::Instant;

/// Width of the fixed-width text columns.
pub const FIXED_WIDTH: usize = 50;

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const CREATE_USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS users
    (
        uid INTEGER PRIMARY KEY AUTOINCREMENT,
        name CHARACTER(50) NOT NULL CHECK (length(name) = 50),
        age INTEGER NOT NULL,
        occupation CHARACTER(50) NOT NULL CHECK (length(occupation) = 50),
        salary_cents INTEGER NOT NULL
    );";

/// A single SQLite connection shared behind a mutex.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and bootstraps the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: &str) -> Result<Self> {
        let started_at = Instant::now();
        let mut conn = if path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(store_err)?;

        bootstrap(&mut conn).map_err(store_err)?;

        tracing::info!(
            path,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "Record store ready"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            op(&mut conn)
        })
        .await
        .map_err(|e| Error::Store {
            context: format!("store task failed: {e}"),
        })?
    }
}

impl RecordStore for SqliteStore {
    async fn insert(&self, record: Record) -> Result<i64> {
        let name = pad(&record.name, "name")?;
        let occupation = pad(&record.occupation, "occupation")?;

        let id = self
            .with_conn(move |conn| {
                conn.query_row(
                    "INSERT INTO users (name, age, occupation, salary_cents)
                     VALUES (?1, ?2, ?3, ?4)
                     RETURNING uid;",
                    params![name, record.age, occupation, record.salary.cents()],
                    |row| row.get::<_, i64>(0),
                )
                .map_err(store_err)
            })
            .await?;

        tracing::debug!(id, "Inserted record");
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<Record> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT name, age, occupation, salary_cents FROM users WHERE uid = ?1;",
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(store_err)?
            .ok_or(Error::RecordNotFound { id })
        })
        .await
    }

    async fn get_all(&self) -> Result<Vec<Record>> {
        let records = self
            .with_conn(|conn| {
                let mut stmt = conn
                    .prepare("SELECT name, age, occupation, salary_cents FROM users ORDER BY uid;")
                    .map_err(store_err)?;
                let rows = stmt.query_map([], row_to_record).map_err(store_err)?;
                rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
            })
            .await?;

        if records.is_empty() {
            return Err(Error::NoRecords);
        }
        tracing::debug!(count = records.len(), "Loaded records");
        Ok(records)
    }
}

fn bootstrap(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_USERS_TABLE)?;
    tx.commit()
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        name: unpad(row.get(0)?),
        age: row.get(1)?,
        occupation: unpad(row.get(2)?),
        salary: Salary::from_cents(row.get(3)?),
    })
}

fn pad(value: &str, column: &str) -> Result<String> {
    if value.chars().count() > FIXED_WIDTH {
        return Err(Error::Store {
            context: format!("value too long for {column} character({FIXED_WIDTH})"),
        });
    }
    Ok(format!("{value:<FIXED_WIDTH$}"))
}

fn unpad(mut value: String) -> String {
    let len = value.trim_end_matches(' ').len();
    value.truncate(len);
    value
}

fn store_err(e: rusqlite::Error) -> Error {
    Error::Store {
        context: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Record {
        Record {
            name: "Alice".to_string(),
            age: 30,
            salary: Salary::from_cents(5_000_050),
            occupation: "Engineer".to_string(),
        }
    }

    fn store() -> SqliteStore {
        SqliteStore::open(IN_MEMORY).unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_strips_padding() {
        let store = store();
        let id = store.insert(alice()).await.unwrap();
        assert!(id > 0);

        let raw: String = store
            .conn
            .lock()
            .query_row("SELECT name FROM users WHERE uid = ?1", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(raw.chars().count(), FIXED_WIDTH);

        let record = store.get_by_id(id).await.unwrap();
        assert_eq!(record, alice());
    }

    #[tokio::test]
    async fn ids_are_assigned_in_insert_order() {
        let store = store();
        let first = store.insert(alice()).await.unwrap();
        let second = store.insert(alice()).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        let store = store();
        let err = store.get_by_id(42).await.unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { id: 42 }));
    }

    #[tokio::test]
    async fn empty_table_is_no_records() {
        let store = store();
        assert!(matches!(store.get_all().await, Err(Error::NoRecords)));
    }

    #[tokio::test]
    async fn get_all_returns_rows_in_id_order() {
        let store = store();
        let mut bob = alice();
        bob.name = "Bob".to_string();
        bob.age = 41;
        store.insert(alice()).await.unwrap();
        store.insert(bob.clone()).await.unwrap();

        let records = store.get_all().await.unwrap();
        assert_eq!(records, vec![alice(), bob]);
    }

    #[tokio::test]
    async fn over_wide_values_are_rejected() {
        let store = store();
        let mut record = alice();
        record.occupation = "x".repeat(FIXED_WIDTH + 1);
        let err = store.insert(record).await.unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
        assert!(matches!(store.get_all().await, Err(Error::NoRecords)));
    }

    #[tokio::test]
    async fn full_width_and_leading_spaces_survive() {
        let store = store();
        let mut record = alice();
        record.name = "é".repeat(FIXED_WIDTH);
        record.occupation = "  Engineer".to_string();
        let id = store.insert(record.clone()).await.unwrap();
        assert_eq!(store.get_by_id(id).await.unwrap(), record);
    }

    #[test]
    fn schema_bootstrap_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        bootstrap(&mut conn).unwrap();
        bootstrap(&mut conn).unwrap();
    }
}
