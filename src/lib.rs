//! aerodb - Relational persistence core for aeronautical data
//!
//! Ingests AIXM/NASR feature records (airports, runways, navaids) into a
//! relational schema and exposes a typed query/select API over it. The
//! XML parsing layer that produces feature records and the CLI that
//! configures a run live outside this crate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Ingestion (AIXM/NASR parser, external)          │
//! └───────────────┬─────────────────────────────────────────────┘
//!                 │ add_record / add_key
//!                 ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BatchPipeline                           │
//! │   batch cut at N features ──► bounded channel                │
//! │   ┌─────────┐  ┌─────────┐        ┌─────────┐               │
//! │   │ flush-0 │  │ flush-1 │  ...   │ flush-K │  worker pool  │
//! │   └────┬────┘  └────┬────┘        └────┬────┘               │
//! └────────┼────────────┼──────────────────┼────────────────────┘
//!          │ placeholder keys first, upsert rows second
//!          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │   StorageManager (SQLite reference backend)                  │
//! │   CREATE/DROP in dependency order · metadata · SELECT+JOIN   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`Database`] orchestrator owns startup: create the database, decide
//! (via stored version and effective-date metadata) whether to rebuild,
//! drop tables child-first, build them parent-first, and answer typed
//! `select`/`select_all` calls.
//!
//! # Example
//!
//! ```no_run
//! use aerodb::config::DatabaseConfig;
//! use aerodb::model::{Airport, Runway};
//! use aerodb::query::Filter;
//! use aerodb::store::SqliteManager;
//! use aerodb::Database;
//! use std::sync::Arc;
//!
//! # fn main() -> aerodb::error::Result<()> {
//! let manager = Arc::new(SqliteManager::new("nasr.db"));
//! let mut db = Database::new(manager, DatabaseConfig::default())?;
//! db.register::<Airport>()?;
//! db.register::<Runway>()?;
//! db.initialize()?;
//!
//! let high_and_south = Filter::greater_than::<Airport>("field_elevation", 12)
//!     .and(Filter::less_than::<Airport>("latitude", 50.0));
//! let airports: Vec<Airport> = db.select_all(Some(&high_and_south), None);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod query;
pub mod schema;
pub mod store;
pub mod value;

pub use database::{Database, Initialization};
pub use error::{DbError, Result};
