//! Batching pipeline
//!
//! Ingestion hands feature records (and placeholder primary keys) to a
//! [`BatchPipeline`]; the pipeline buffers them in a [`Batch`] and, once the
//! feature count crosses the configured limit, cuts the batch and hands it
//! to a fixed pool of flush workers over a bounded channel. Each flush
//! inserts placeholder keys first, then fully-populated rows, and logs
//! failures without aborting: one bad batch costs its rows, not the load.
//!
//! Insert order across batches is not guaranteed - parallel workers may
//! commit out of order. That is safe because row inserts are upserts keyed
//! by primary key and placeholder inserts are insert-if-absent.

mod pipeline;

pub use pipeline::{BatchPipeline, PipelineStats};

use crate::schema::Record;
use crate::value::{Row, Value};
use std::collections::{HashMap, HashSet};

/// Transient accumulation of pending inserts
///
/// Holds hydrated rows keyed by primary key and bare placeholder keys, per
/// table. Within one batch a hydration always overwrites a placeholder for
/// the same key, whichever arrives first, so a placeholder can never shadow
/// a full row. Placeholder keys do not count toward the flush limit.
#[derive(Debug, Default)]
pub struct Batch {
    /// table -> primary key -> full row
    rows: HashMap<String, HashMap<Value, Row>>,

    /// table -> placeholder primary keys (disjoint from hydrated keys)
    keys: HashMap<String, HashSet<Value>>,

    /// Feature adds since creation (placeholders excluded)
    feature_count: usize,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully-populated feature record
    pub fn add_record<R: Record>(&mut self, record: &R) {
        self.add_row(R::TABLE, record.primary_key(), record.to_row());
    }

    /// Add a full row under its primary key
    pub fn add_row(&mut self, table: &str, key: Value, row: Row) {
        if let Some(keys) = self.keys.get_mut(table) {
            keys.remove(&key);
        }
        self.rows
            .entry(table.to_owned())
            .or_default()
            .insert(key, row);
        self.feature_count += 1;
    }

    /// Add a placeholder primary key
    ///
    /// No-op if the key is already hydrated in this batch.
    pub fn add_key(&mut self, table: &str, key: Value) {
        let hydrated = self
            .rows
            .get(table)
            .is_some_and(|rows| rows.contains_key(&key));
        if !hydrated {
            self.keys.entry(table.to_owned()).or_default().insert(key);
        }
    }

    /// Number of feature adds (placeholder keys excluded)
    pub fn len(&self) -> usize {
        self.feature_count
    }

    /// Whether nothing (rows or placeholders) is pending
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(HashMap::is_empty) && self.keys.values().all(HashSet::is_empty)
    }

    /// Split into disjoint placeholder-key and full-row groups for commit
    pub fn split(self) -> (Vec<(String, Vec<Value>)>, Vec<(String, Vec<Row>)>) {
        let keys = self
            .keys
            .into_iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(table, set)| (table, set.into_iter().collect()))
            .collect();
        let rows = self
            .rows
            .into_iter()
            .filter(|(_, map)| !map.is_empty())
            .map(|(table, map)| (table, map.into_values().collect()))
            .collect();
        (keys, rows)
    }
}
