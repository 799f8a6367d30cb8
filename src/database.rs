//! Database orchestrator
//!
//! Coordinates startup and exposes the typed query surface. `initialize`
//! creates and connects the backing store, decides whether a rebuild is
//! needed (forced, version mismatch, or stale effective range), and if so
//! drops tables child-first and rebuilds them parent-first. `select` /
//! `select_all` translate filters through the schema registry and
//! materialize typed records, degrading to empty results instead of
//! propagating query failures to callers.

use crate::batch::BatchPipeline;
use crate::config::{DatabaseConfig, EnforcementLevel};
use crate::error::{DbError, Result};
use crate::query::{Filter, Sort};
use crate::schema::{Record, SchemaRegistry};
use crate::store::{meta_keys, StorageManager};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of `initialize`: does the caller need to re-ingest source data?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initialization {
    /// Tables were rebuilt; a full re-ingest from source data is required
    ReloadRequired,

    /// Existing data is intact and current
    UpToDate,
}

/// The database core: storage manager + schema registry + configuration
pub struct Database {
    manager: Arc<dyn StorageManager>,
    registry: SchemaRegistry,
    config: DatabaseConfig,
}

impl Database {
    /// Create a database over a storage backend
    pub fn new(manager: Arc<dyn StorageManager>, config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            manager,
            registry: SchemaRegistry::new(),
            config,
        })
    }

    /// Register a feature type's table
    ///
    /// Parents must be registered before children. Mis-declared types fail
    /// here, before anything touches storage.
    pub fn register<R: Record>(&mut self) -> Result<()> {
        self.registry.register::<R>()?;
        Ok(())
    }

    /// The schema registry
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The storage manager
    pub fn manager(&self) -> &Arc<dyn StorageManager> {
        &self.manager
    }

    /// Ensure the database exists, connect, and rebuild if needed
    ///
    /// Rebuild happens when any of these hold: the force-rebuild flag is
    /// set, the stored software version differs from this crate's version,
    /// or (unless enforcement is Ignore) the stored effective range does
    /// not contain now. Backend failures along the way are logged and the
    /// affected step skipped - startup is best-effort, and a rebuild
    /// decision still comes back so the caller knows whether to re-ingest.
    pub fn initialize(&mut self) -> Result<Initialization> {
        if let Err(e) = self.manager.create_database() {
            warn!(error = %e, "Database creation failed; continuing");
        }
        if let Err(e) = self.manager.connect() {
            warn!(error = %e, "Connect failed; subsequent operations will fail");
        }

        let current_version = env!("CARGO_PKG_VERSION");
        let stored_version = self
            .manager
            .metadata(meta_keys::SOFTWARE_VERSION)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not read stored version");
                None
            });
        let version_mismatch = stored_version.as_deref() != Some(current_version);

        let stale = self.config.enforcement.checks_dates() && !self.is_data_valid(Utc::now());

        let rebuild = self.config.force_rebuild || version_mismatch || stale;
        info!(
            force = self.config.force_rebuild,
            version_mismatch,
            stale,
            rebuild,
            stored_version = stored_version.as_deref(),
            current_version,
            "Rebuild decision"
        );

        if !rebuild {
            return Ok(Initialization::UpToDate);
        }

        self.rebuild_tables(current_version)?;
        Ok(Initialization::ReloadRequired)
    }

    /// Drop all tables child-first, clear metadata, rebuild parent-first
    fn rebuild_tables(&mut self, current_version: &str) -> Result<()> {
        for name in self.registry.child_first()? {
            // Tables come straight out of the registry's own ordering
            if let Some(desc) = self.registry.get(&name) {
                if let Err(e) = self.manager.drop_table(desc) {
                    warn!(table = %name, error = %e, "Drop failed; continuing");
                }
            }
        }

        if let Err(e) = self.manager.clear_metadata() {
            warn!(error = %e, "Metadata clear failed; continuing");
        }
        if let Err(e) = self
            .manager
            .set_metadata(meta_keys::SOFTWARE_VERSION, current_version)
        {
            warn!(error = %e, "Version stamp failed; continuing");
        }

        for name in self.registry.parent_first()? {
            if let Some(desc) = self.registry.get(&name) {
                if let Err(e) = self.manager.build_table(desc, &self.registry) {
                    warn!(table = %name, error = %e, "Build failed; continuing");
                }
            }
        }

        if let Err(e) = self.manager.set_metadata(meta_keys::STATUS, "rebuilt") {
            warn!(error = %e, "Status stamp failed; continuing");
        }

        info!(tables = self.registry.len(), "Tables rebuilt");
        Ok(())
    }

    /// Store the effective range of freshly ingested source data
    ///
    /// Also advances the stored status from "rebuilt" to "loaded", since
    /// the caller sets the range once ingestion has finished.
    pub fn set_effective_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<()> {
        self.manager
            .set_metadata(meta_keys::EFFECTIVE_FROM, &from.to_rfc3339())
            .map_err(DbError::from)?;
        self.manager
            .set_metadata(meta_keys::EFFECTIVE_TO, &to.to_rfc3339())
            .map_err(DbError::from)?;
        self.manager
            .set_metadata(meta_keys::STATUS, "loaded")
            .map_err(DbError::from)?;
        Ok(())
    }

    /// The stored effective range, if both bounds are present and parse
    pub fn effective_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let from = self.stored_datetime(meta_keys::EFFECTIVE_FROM)?;
        let to = self.stored_datetime(meta_keys::EFFECTIVE_TO)?;
        Some((from, to))
    }

    /// Read a metadata key as an RFC 3339 timestamp
    ///
    /// Absent keys, read failures, and unparseable values all come back as
    /// `None`; a corrupted bound makes the range invalid, not fatal.
    fn stored_datetime(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.manager.metadata(key).ok().flatten()?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                warn!(key, value = %raw, error = %e, "Stored timestamp does not parse");
                None
            }
        }
    }

    /// Whether `now` falls strictly inside the stored effective range
    ///
    /// An absent or unparseable bound means invalid.
    pub fn is_data_valid(&self, now: DateTime<Utc>) -> bool {
        match self.effective_range() {
            Some((from, to)) => from < now && now < to,
            None => false,
        }
    }

    /// Apply the configured enforcement level after a reload
    ///
    /// Strict mode fails if the data is still outside its effective range
    /// (the new source itself is out of date); Lenient logs and continues;
    /// Ignore never checks.
    pub fn enforce_validity(&self) -> Result<()> {
        match self.config.enforcement {
            EnforcementLevel::Ignore => Ok(()),
            EnforcementLevel::Lenient => {
                if !self.is_data_valid(Utc::now()) {
                    warn!("Loaded data is outside its effective range; proceeding (lenient)");
                }
                Ok(())
            }
            EnforcementLevel::Strict => {
                if self.is_data_valid(Utc::now()) {
                    Ok(())
                } else {
                    let from = self
                        .manager
                        .metadata(meta_keys::EFFECTIVE_FROM)
                        .unwrap_or(None);
                    let to = self
                        .manager
                        .metadata(meta_keys::EFFECTIVE_TO)
                        .unwrap_or(None);
                    Err(DbError::OutOfDate { from, to })
                }
            }
        }
    }

    /// First record matching the filter, if any
    pub fn select<R: Record>(&self, filter: Option<&Filter>) -> Option<R> {
        self.select_all::<R>(filter, None).into_iter().next()
    }

    /// All records matching the filter, in the given sort order
    ///
    /// Join fan-out rows with the same primary key as the immediately
    /// preceding row are collapsed, so N roots joined with M children come
    /// back as N records. Query or materialization failures degrade to an
    /// empty result - callers see "nothing found", never an exception.
    pub fn select_all<R: Record>(&self, filter: Option<&Filter>, sort: Option<&Sort>) -> Vec<R> {
        let desc = match self.registry.get_of::<R>() {
            Ok(desc) => desc,
            Err(e) => {
                warn!(table = R::TABLE, error = %e, "Select against unregistered table");
                return Vec::new();
            }
        };

        let rows = match self.manager.query(desc, filter, sort, &self.registry) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(table = R::TABLE, error = %e, "Query failed; returning empty result");
                return Vec::new();
            }
        };

        let pk = &desc.primary_key;
        let mut results = Vec::new();
        let mut previous_key = None;
        for row in &rows {
            let key = row.get(pk.as_str()).cloned();
            if key.is_some() && key == previous_key {
                continue;
            }
            match R::from_row(row) {
                Ok(record) => results.push(record),
                Err(e) => {
                    warn!(table = R::TABLE, error = %e, "Materialization failed; returning empty result");
                    return Vec::new();
                }
            }
            previous_key = key;
        }

        debug!(
            table = R::TABLE,
            raw = rows.len(),
            distinct = results.len(),
            "Select completed"
        );
        results
    }

    /// Create a batching pipeline bound to this database's manager
    ///
    /// Call after registration is complete; the pipeline takes a frozen
    /// snapshot of the schema.
    pub fn pipeline(&self) -> Result<BatchPipeline> {
        let pipeline = BatchPipeline::new(
            Arc::clone(&self.manager),
            Arc::new(self.registry.clone()),
            self.config.batch_size,
            self.config.workers,
            self.config.flush_timeout,
        )?;
        Ok(pipeline)
    }

    /// Disconnect from the backend
    pub fn close(&self) -> Result<()> {
        self.manager.disconnect().map_err(DbError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteManager;
    use chrono::Duration;

    fn database() -> Database {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::in_memory());
        let db = Database::new(manager, DatabaseConfig::default()).unwrap();
        db.manager().connect().unwrap();
        db
    }

    #[test]
    fn test_effective_range_validity() {
        let db = database();
        let now = Utc::now();

        // No range stored: invalid
        assert!(!db.is_data_valid(now));

        // now strictly inside: valid
        db.set_effective_range(now - Duration::days(1), now + Duration::days(27))
            .unwrap();
        assert!(db.is_data_valid(now));

        // now outside: invalid
        assert!(!db.is_data_valid(now + Duration::days(28)));
        assert!(!db.is_data_valid(now - Duration::days(2)));

        // Boundary is exclusive
        let (from, to) = db.effective_range().unwrap();
        assert!(!db.is_data_valid(from));
        assert!(!db.is_data_valid(to));
    }

    #[test]
    fn test_unparseable_effective_bound_is_invalid() {
        let db = database();
        let now = Utc::now();
        db.set_effective_range(now - Duration::days(1), now + Duration::days(1))
            .unwrap();
        assert!(db.is_data_valid(now));

        // A corrupted bound makes the range absent, never a panic
        db.manager()
            .set_metadata(meta_keys::EFFECTIVE_TO, "four weeks from now")
            .unwrap();
        assert!(db.effective_range().is_none());
        assert!(!db.is_data_valid(now));
    }

    #[test]
    fn test_effective_range_marks_data_loaded() {
        let db = database();
        let now = Utc::now();
        db.set_effective_range(now, now + Duration::days(28)).unwrap();
        assert_eq!(
            db.manager().metadata(meta_keys::STATUS).unwrap().as_deref(),
            Some("loaded")
        );
    }

    #[test]
    fn test_strict_enforcement_raises_when_stale() {
        let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::in_memory());
        let config = DatabaseConfig {
            enforcement: EnforcementLevel::Strict,
            ..DatabaseConfig::default()
        };
        let db = Database::new(manager, config).unwrap();
        db.manager().connect().unwrap();

        let err = db.enforce_validity().unwrap_err();
        assert!(matches!(err, DbError::OutOfDate { .. }));

        let now = Utc::now();
        db.set_effective_range(now - Duration::days(1), now + Duration::days(1))
            .unwrap();
        assert!(db.enforce_validity().is_ok());
    }

    #[test]
    fn test_lenient_and_ignore_never_raise() {
        for enforcement in [EnforcementLevel::Lenient, EnforcementLevel::Ignore] {
            let manager: Arc<dyn StorageManager> = Arc::new(SqliteManager::in_memory());
            let config = DatabaseConfig {
                enforcement,
                ..DatabaseConfig::default()
            };
            let db = Database::new(manager, config).unwrap();
            db.manager().connect().unwrap();
            assert!(db.enforce_validity().is_ok());
        }
    }

    #[test]
    fn test_select_on_unregistered_table_is_empty() {
        use crate::error::SchemaResult;
        use crate::schema::{TableBuilder, TableDescriptor};
        use crate::value::{RowMap, Value, ValueType};

        struct Ghost;
        impl Record for Ghost {
            const TABLE: &'static str = "ghosts";
            fn descriptor() -> SchemaResult<TableDescriptor> {
                TableBuilder::new("ghosts")
                    .primary_key("id", ValueType::Integer)
                    .build()
            }
            fn primary_key(&self) -> Value {
                Value::Integer(0)
            }
            fn to_row(&self) -> Vec<(String, Value)> {
                vec![("id".into(), Value::Integer(0))]
            }
            fn from_row(_row: &RowMap) -> SchemaResult<Self> {
                Ok(Self)
            }
        }

        let db = database();
        let results: Vec<Ghost> = db.select_all(None, None);
        assert!(results.is_empty());
    }
}
