//! Storage manager contract and the SQLite reference backend
//!
//! [`StorageManager`] is the backend plug-in point: the orchestrator and
//! the batching pipeline only ever talk to this trait. The generic SQL text
//! building lives in [`sql`], with backend-specific type names and literal
//! formatting supplied by a [`Dialect`](dialect::Dialect) value, so a new
//! SQL-family backend is a dialect plus a connection wrapper rather than a
//! subclass hierarchy.

pub mod dialect;
pub mod sql;
pub mod sqlite;

pub use dialect::{Dialect, SqliteDialect};
pub use sqlite::SqliteManager;

use crate::error::StoreResult;
use crate::query::{Filter, Sort};
use crate::schema::{SchemaRegistry, TableDescriptor};
use crate::value::{Row, RowMap, Value};

/// Connection parameters for a backend
///
/// SQLite only uses `database` (the file path); server/port/credentials
/// exist for networked backends implementing the same contract.
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    /// Server host (unused by file-backed backends)
    pub server: Option<String>,

    /// Server port
    pub port: Option<u16>,

    /// User name
    pub user: Option<String>,

    /// Password
    pub password: Option<String>,

    /// Database name (file path for SQLite)
    pub database: String,
}

impl ConnectionParams {
    /// Parameters for a file-backed database
    pub fn file(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }
}

/// Contract every storage backend must implement
///
/// Methods take `&self`; implementations guard their connection state
/// internally. The batching pipeline calls `insert_rows`/`insert_keys`
/// from several worker threads at once - a single-connection backend
/// serializes these internally (the SQLite manager does), a pooled
/// backend may run them in parallel.
///
/// Backend failures are returned wrapped in [`StoreError`](crate::error::StoreError)
/// with the original cause attached, never swallowed here; callers decide
/// whether to log-and-continue or abort.
pub trait StorageManager: Send + Sync {
    /// Replace the connection parameters (takes effect on next `connect`)
    fn set_connection(&self, params: ConnectionParams);

    /// Open the backend connection
    fn connect(&self) -> StoreResult<()>;

    /// Close the backend connection
    fn disconnect(&self) -> StoreResult<()>;

    /// Whether a connection is currently open
    fn is_connected(&self) -> bool;

    /// Create the database if it does not exist (idempotent)
    fn create_database(&self) -> StoreResult<()>;

    /// Read one metadata value
    fn metadata(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write one metadata value (replacing any previous value)
    fn set_metadata(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove all metadata
    fn clear_metadata(&self) -> StoreResult<()>;

    /// Create the table for a descriptor if it does not exist
    fn build_table(&self, desc: &TableDescriptor, registry: &SchemaRegistry) -> StoreResult<()>;

    /// Drop the table for a descriptor if it exists
    fn drop_table(&self, desc: &TableDescriptor) -> StoreResult<()>;

    /// Bulk upsert fully-populated rows (existing primary keys are replaced)
    ///
    /// Returns the number of rows written.
    fn insert_rows(&self, desc: &TableDescriptor, rows: &[Row]) -> StoreResult<usize>;

    /// Bulk insert bare primary keys, skipping keys already present
    ///
    /// Used for placeholder parent rows that satisfy foreign key
    /// constraints ahead of the real row. Returns the number of keys
    /// written.
    fn insert_keys(&self, desc: &TableDescriptor, keys: &[Value]) -> StoreResult<usize>;

    /// Run a filter + sort against a table, returning raw attribute rows
    fn query(
        &self,
        desc: &TableDescriptor,
        filter: Option<&Filter>,
        sort: Option<&Sort>,
        registry: &SchemaRegistry,
    ) -> StoreResult<Vec<RowMap>>;
}

/// Metadata keys recognized by the orchestrator
pub mod meta_keys {
    /// Software version that produced the stored data
    pub const SOFTWARE_VERSION: &str = "software_version";

    /// Start of the source data's effective range (RFC 3339)
    pub const EFFECTIVE_FROM: &str = "effective_from";

    /// End of the source data's effective range (RFC 3339)
    pub const EFFECTIVE_TO: &str = "effective_to";

    /// Load status: "rebuilt", "loaded"
    pub const STATUS: &str = "status";
}
