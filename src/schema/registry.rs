//! Schema registry and dependency ordering
//!
//! The registry owns every registered table descriptor, wires child links
//! as foreign keys are declared, and computes the two dependency orderings:
//! parent-first (table creation) and child-first (table drops). Orderings
//! are computed lazily and cached; registration invalidates the cache.

use super::table::{Record, TableDescriptor};
use crate::error::{SchemaError, SchemaResult};
use tracing::debug;

/// Registry of all table descriptors for one database
///
/// An explicit object, owned by the orchestrator - no global state. Parents
/// must be registered before their children so foreign keys can be checked
/// at registration time.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Descriptors in registration order
    tables: Vec<TableDescriptor>,

    /// Cached child-first ordering (drop order); parent-first is its reverse
    child_first: Option<Vec<String>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature type's table
    ///
    /// Builds the descriptor, verifies the declared parent (if any) is
    /// already registered, and links this table into the parent's
    /// child-list. Registering the same table name twice is an error.
    pub fn register<R: Record>(&mut self) -> SchemaResult<()> {
        let desc = R::descriptor()?;
        self.register_descriptor(desc)
    }

    /// Register a pre-built descriptor (tests, dynamic schemas)
    pub fn register_descriptor(&mut self, desc: TableDescriptor) -> SchemaResult<()> {
        if self.tables.iter().any(|t| t.name == desc.name) {
            return Err(SchemaError::DuplicateTable { table: desc.name });
        }

        if let Some(fk) = &desc.foreign_key {
            let parent = self
                .tables
                .iter_mut()
                .find(|t| t.name == fk.parent_table)
                .ok_or_else(|| SchemaError::UnknownParent {
                    table: desc.name.clone(),
                    parent: fk.parent_table.clone(),
                })?;
            parent.children.push(desc.name.clone());
        }

        debug!(
            table = %desc.name,
            columns = desc.columns.len(),
            parent = desc.foreign_key.as_ref().map(|fk| fk.parent_table.as_str()),
            "Registered table"
        );

        self.tables.push(desc);
        self.child_first = None;
        Ok(())
    }

    /// Look up a descriptor by table name
    pub fn get(&self, table: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == table)
    }

    /// Look up the descriptor for a feature type, failing if unregistered
    pub fn get_of<R: Record>(&self) -> SchemaResult<&TableDescriptor> {
        self.get(R::TABLE).ok_or_else(|| SchemaError::UnknownTable {
            table: R::TABLE.to_owned(),
        })
    }

    /// Number of registered tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no tables are registered
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables in child-first order (safe drop order)
    ///
    /// If table A has a foreign key into table B, A appears before B.
    pub fn child_first(&mut self) -> SchemaResult<Vec<String>> {
        if self.child_first.is_none() {
            self.child_first = Some(self.compute_child_first()?);
        }
        // Cache was just filled
        Ok(self.child_first.clone().unwrap_or_default())
    }

    /// Tables in parent-first order (safe creation order)
    ///
    /// If table A has a foreign key into table B, A appears after B.
    pub fn parent_first(&mut self) -> SchemaResult<Vec<String>> {
        let mut order = self.child_first()?;
        order.reverse();
        Ok(order)
    }

    /// Clear all registrations and cached orderings
    pub fn reset(&mut self) {
        self.tables.clear();
        self.child_first = None;
    }

    /// Child-first topological sort
    ///
    /// Repeatedly extract tables whose every child is already placed; a
    /// table with no children qualifies immediately. O(n^2) in table count,
    /// which stays in the tens. A pass that places nothing while tables
    /// remain means the foreign-key graph has a cycle - structurally
    /// impossible with single-parent declarations, but checked anyway so a
    /// bad schema fails fast instead of hanging.
    fn compute_child_first(&self) -> SchemaResult<Vec<String>> {
        let mut placed: Vec<String> = Vec::with_capacity(self.tables.len());
        let mut remaining: Vec<&TableDescriptor> = self.tables.iter().collect();

        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|table| {
                let ready = table
                    .children
                    .iter()
                    .all(|child| placed.iter().any(|p| p == child));
                if ready {
                    placed.push(table.name.clone());
                }
                !ready
            });

            if remaining.len() == before {
                return Err(SchemaError::CyclicSchema {
                    remaining: remaining.iter().map(|t| t.name.clone()).collect(),
                });
            }
        }

        Ok(placed)
    }
}
