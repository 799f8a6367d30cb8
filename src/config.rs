//! Configuration types for the database core
//!
//! This module defines:
//! - Runtime configuration with validation
//! - Enforcement levels for out-of-date source data
//!
//! The CLI layer that populates these settings lives outside this crate;
//! aerodb only consumes the validated values.

use crate::error::ConfigError;
use std::time::Duration;

/// Maximum reasonable flush worker count
const MAX_WORKERS: usize = 64;

/// Batch size limits
const MIN_BATCH_SIZE: usize = 10;
const MAX_BATCH_SIZE: usize = 100_000;

/// How strictly out-of-date source data is treated
///
/// Stored data carries an effective range (valid-from/valid-to). When `now`
/// falls outside that range the data is stale; this level decides what
/// happens next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnforcementLevel {
    /// Never rebuild on date grounds
    Ignore,

    /// Rebuild stale data and proceed without raising
    #[default]
    Lenient,

    /// Rebuild stale data; raise a fatal error if it is still stale afterward
    Strict,
}

impl EnforcementLevel {
    /// Whether the effective-range check participates in rebuild decisions
    pub fn checks_dates(self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

/// Runtime configuration for the database core
///
/// The storage target (file path or in-memory) belongs to the manager, not
/// here: the orchestrator works against whatever backend it is handed.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Drop and rebuild all tables regardless of stored version
    pub force_rebuild: bool,

    /// Enforcement level for out-of-date source data
    pub enforcement: EnforcementLevel,

    /// Feature count at which an accumulating batch is cut and flushed
    pub batch_size: usize,

    /// Number of flush worker threads
    pub workers: usize,

    /// How long shutdown waits for in-flight flushes before giving up
    pub flush_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            force_rebuild: false,
            enforcement: EnforcementLevel::default(),
            batch_size: 5_000,
            workers: 4,
            flush_timeout: Duration::from_secs(30),
        }
    }
}

impl DatabaseConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size < MIN_BATCH_SIZE || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize {
                size: self.batch_size,
                min: MIN_BATCH_SIZE,
                max: MAX_BATCH_SIZE,
            });
        }

        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.workers,
                max: MAX_WORKERS,
            });
        }

        if self.flush_timeout < Duration::from_secs(1) {
            return Err(ConfigError::InvalidFlushTimeout {
                secs: self.flush_timeout.as_secs(),
            });
        }

        Ok(())
    }
}
