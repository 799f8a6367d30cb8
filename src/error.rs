//! Error types for aerodb
//!
//! This module defines the error hierarchy for the database core:
//! - Schema declaration and registration errors
//! - Storage backend errors (SQLite, connection lifecycle)
//! - Batching pipeline errors
//! - Configuration errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what to do
//! - Preserve error chains for debugging

use thiserror::Error;

/// Top-level error type for the aerodb core
#[derive(Error, Debug)]
pub enum DbError {
    /// Schema declaration or registration errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Storage backend errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Batching pipeline errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Stored data is outside its effective range under strict enforcement
    #[error("Data is out of date: effective range {from:?}..{to:?} does not contain now")]
    OutOfDate {
        from: Option<String>,
        to: Option<String>,
    },
}

/// Schema declaration and registration errors
///
/// These are configuration errors in the feature type declarations. They
/// are fatal and raised at registration time, never at query time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Table declared with an empty name
    #[error("Table name must not be empty")]
    EmptyTableName,

    /// Table declared without any primary key column
    #[error("Table '{table}' declares no primary key column")]
    MissingPrimaryKey { table: String },

    /// Table declared with more than one foreign key column
    #[error("Table '{table}' declares more than one foreign key (single-parent model)")]
    MultipleForeignKeys { table: String },

    /// Foreign key references a table that was never registered
    #[error("Table '{table}' declares foreign key into unregistered table '{parent}'")]
    UnknownParent { table: String, parent: String },

    /// The same table name was registered twice
    #[error("Table '{table}' is already registered")]
    DuplicateTable { table: String },

    /// Table lookup failed
    #[error("No table registered under name '{table}'")]
    UnknownTable { table: String },

    /// Dependency ordering could not make progress (foreign-key cycle)
    #[error("Foreign-key graph contains a cycle involving tables: {remaining:?}")]
    CyclicSchema { remaining: Vec<String> },

    /// A result row is missing a declared column
    #[error("Result row for table '{table}' is missing column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A result row holds a value of the wrong type for a column
    #[error("Column '{column}' of table '{table}' holds {found}, expected {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Storage backend errors
///
/// Backend failures are wrapped here with their original cause preserved.
/// This layer never swallows errors; higher layers decide whether to
/// log-and-continue or abort.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Operation attempted without an open connection
    #[error("Not connected - call connect() before '{operation}'")]
    NotConnected { operation: &'static str },

    /// Connection could not be established
    #[error("Failed to connect to '{target}': {source}")]
    ConnectFailed {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to create the database
    #[error("Failed to create database '{name}': {reason}")]
    CreateFailed { name: String, reason: String },

    /// Table build/drop failed
    #[error("Failed to {operation} table '{table}': {source}")]
    TableFailed {
        operation: &'static str,
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Schema lookup failed while translating a query
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Batching pipeline errors
#[derive(Error, Debug)]
pub enum BatchError {
    /// Pipeline channel closed unexpectedly
    #[error("Pipeline channel closed unexpectedly")]
    ChannelClosed,

    /// Worker thread could not be spawned
    #[error("Failed to spawn flush worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Worker thread panicked
    #[error("Flush worker {id} panicked")]
    Panicked { id: usize },

    /// Pool did not drain before the shutdown timeout
    #[error("Pipeline shutdown timed out after {secs}s with {pending} workers still running")]
    ShutdownTimeout { secs: u64, pending: usize },

    /// Record added for a table that was never registered
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid batch size
    #[error("Invalid batch size {size}: must be between {min} and {max}")]
    InvalidBatchSize { size: usize, min: usize, max: usize },

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid flush timeout
    #[error("Invalid flush timeout {secs}s: must be at least 1s")]
    InvalidFlushTimeout { secs: u64 },
}

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Result type alias for SchemaError
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Result type alias for StoreError
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for BatchError
pub type BatchResult<T> = std::result::Result<T, BatchError>;
