//! SQLite storage manager
//!
//! Reference implementation of the [`StorageManager`] contract over
//! rusqlite. One connection guarded by a mutex: the batching pipeline's
//! flush workers serialize on it, which SQLite's single-writer model would
//! force anyway.

use super::dialect::SqliteDialect;
use super::sql;
use super::{ConnectionParams, StorageManager};
use crate::error::{StoreError, StoreResult};
use crate::query::{Filter, Sort};
use crate::schema::{SchemaRegistry, TableDescriptor};
use crate::value::{Row, RowMap, Value};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Pragmas applied to every new connection
///
/// WAL and relaxed sync for ingest throughput; foreign_keys must be ON for
/// the cascade-delete invariant to hold (SQLite defaults it off).
const CONNECT_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
PRAGMA foreign_keys = ON;
"#;

/// In-memory connections reject WAL; everything else still applies
const CONNECT_PRAGMAS_MEMORY: &str = r#"
PRAGMA temp_store = MEMORY;
PRAGMA foreign_keys = ON;
"#;

/// SQL to create the metadata key-value table
const CREATE_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS db_info (
    key TEXT PRIMARY KEY,
    value TEXT
)
"#;

/// SQLite-backed storage manager
pub struct SqliteManager {
    /// Connection parameters (`database` is the file path)
    params: Mutex<ConnectionParams>,

    /// Open connection, `None` while disconnected
    conn: Mutex<Option<Connection>>,

    /// Use an in-memory database instead of a file
    in_memory: bool,

    /// Literal/type formatting
    dialect: SqliteDialect,
}

impl SqliteManager {
    /// Manager for a database file
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            params: Mutex::new(ConnectionParams::file(
                path.as_ref().to_string_lossy().into_owned(),
            )),
            conn: Mutex::new(None),
            in_memory: false,
            dialect: SqliteDialect,
        }
    }

    /// Manager for an in-memory database (testing)
    pub fn in_memory() -> Self {
        Self {
            params: Mutex::new(ConnectionParams::file(":memory:")),
            conn: Mutex::new(None),
            in_memory: true,
            dialect: SqliteDialect,
        }
    }

    fn database_path(&self) -> String {
        self.params
            .lock()
            .map(|p| p.database.clone())
            .unwrap_or_default()
    }

    /// Run a closure against the open connection
    fn with_conn<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::NotConnected { operation })?;
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StoreError::NotConnected { operation }),
        }
    }
}

impl StorageManager for SqliteManager {
    fn set_connection(&self, params: ConnectionParams) {
        if let Ok(mut guard) = self.params.lock() {
            *guard = params;
        }
    }

    fn connect(&self) -> StoreResult<()> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::NotConnected {
            operation: "connect",
        })?;
        if guard.is_some() {
            return Ok(());
        }

        let target = self.database_path();
        let conn = if self.in_memory {
            Connection::open_in_memory()
        } else {
            Connection::open(&target)
        }
        .map_err(|e| StoreError::ConnectFailed {
            target: target.clone(),
            source: e,
        })?;

        let pragmas = if self.in_memory {
            CONNECT_PRAGMAS_MEMORY
        } else {
            CONNECT_PRAGMAS
        };
        conn.execute_batch(pragmas)?;
        conn.execute(CREATE_META_TABLE, [])?;

        info!(database = %target, "Connected to SQLite database");
        *guard = Some(conn);
        Ok(())
    }

    fn disconnect(&self) -> StoreResult<()> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::NotConnected {
            operation: "disconnect",
        })?;
        if guard.take().is_some() {
            debug!(database = %self.database_path(), "Disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.conn
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn create_database(&self) -> StoreResult<()> {
        // SQLite creates the file on first open; only the parent directory
        // needs to exist ahead of time.
        if self.in_memory {
            return Ok(());
        }
        let target = self.database_path();
        if let Some(parent) = Path::new(&target).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::CreateFailed {
                    name: target.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn metadata(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_conn("metadata", |conn| {
            let result = conn.query_row(
                "SELECT value FROM db_info WHERE key = ?1",
                [key],
                |row| row.get(0),
            );
            match result {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn set_metadata(&self, key: &str, value: &str) -> StoreResult<()> {
        self.with_conn("set_metadata", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO db_info (key, value) VALUES (?1, ?2)",
                [key, value],
            )?;
            Ok(())
        })
    }

    fn clear_metadata(&self) -> StoreResult<()> {
        self.with_conn("clear_metadata", |conn| {
            conn.execute("DELETE FROM db_info", [])?;
            Ok(())
        })
    }

    fn build_table(&self, desc: &TableDescriptor, registry: &SchemaRegistry) -> StoreResult<()> {
        let stmt = sql::create_table_sql(desc, registry, &self.dialect)?;
        self.with_conn("build_table", |conn| {
            conn.execute(&stmt, [])
                .map_err(|e| StoreError::TableFailed {
                    operation: "build",
                    table: desc.name.clone(),
                    source: e,
                })?;
            debug!(table = %desc.name, "Built table");
            Ok(())
        })
    }

    fn drop_table(&self, desc: &TableDescriptor) -> StoreResult<()> {
        let stmt = sql::drop_table_sql(desc);
        self.with_conn("drop_table", |conn| {
            conn.execute(&stmt, [])
                .map_err(|e| StoreError::TableFailed {
                    operation: "drop",
                    table: desc.name.clone(),
                    source: e,
                })?;
            debug!(table = %desc.name, "Dropped table");
            Ok(())
        })
    }

    fn insert_rows(&self, desc: &TableDescriptor, rows: &[Row]) -> StoreResult<usize> {
        let Some(stmt) = sql::insert_rows_sql(desc, rows, &self.dialect) else {
            return Ok(0);
        };
        self.with_conn("insert_rows", |conn| {
            conn.execute(&stmt, [])?;
            Ok(rows.len())
        })
    }

    fn insert_keys(&self, desc: &TableDescriptor, keys: &[Value]) -> StoreResult<usize> {
        let Some(stmt) = sql::insert_keys_sql(desc, keys, &self.dialect) else {
            return Ok(0);
        };
        self.with_conn("insert_keys", |conn| {
            let written = conn.execute(&stmt, [])?;
            Ok(written)
        })
    }

    fn query(
        &self,
        desc: &TableDescriptor,
        filter: Option<&Filter>,
        sort: Option<&Sort>,
        registry: &SchemaRegistry,
    ) -> StoreResult<Vec<RowMap>> {
        let stmt_text = sql::select_sql(desc, filter, sort, registry, &self.dialect)?;
        debug!(sql = %stmt_text, "Running query");

        self.with_conn("query", |conn| {
            let mut stmt = conn.prepare(&stmt_text)?;
            let column_names: Vec<String> =
                stmt.column_names().iter().map(|s| (*s).to_owned()).collect();

            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                let mut map = RowMap::with_capacity(column_names.len());
                for (idx, name) in column_names.iter().enumerate() {
                    let value = match row.get_ref(idx)? {
                        ValueRef::Null => Value::Null,
                        ValueRef::Integer(v) => Value::Integer(v),
                        ValueRef::Real(v) => Value::Real(v),
                        ValueRef::Text(v) => {
                            Value::Text(String::from_utf8_lossy(v).into_owned())
                        }
                        ValueRef::Blob(_) => Value::Null,
                    };
                    map.insert(name.clone(), value);
                }
                results.push(map);
            }
            Ok(results)
        })
    }
}
