//! SQL text construction
//!
//! Translates table descriptors and filter trees into SQL statements.
//! Shared across SQL-family backends; only type names and literal
//! formatting come from the active [`Dialect`].

use super::dialect::Dialect;
use crate::error::{SchemaError, SchemaResult};
use crate::query::{Filter, Sort};
use crate::schema::{RelationKind, SchemaRegistry, TableDescriptor};
use crate::value::{Row, Value};

/// `CREATE TABLE IF NOT EXISTS` for a descriptor
///
/// Primary key column first (NOT NULL), foreign key second (NOT NULL),
/// remaining columns after, with a trailing `PRIMARY KEY(...)` and, when a
/// parent exists, `FOREIGN KEY(...) REFERENCES parent(pk) ON DELETE
/// CASCADE`. Cascade delete is deliberate: removing a parent row must
/// remove all descendant rows so no orphaned children survive a rebuild.
pub fn create_table_sql(
    desc: &TableDescriptor,
    registry: &SchemaRegistry,
    dialect: &dyn Dialect,
) -> SchemaResult<String> {
    let mut parts: Vec<String> = Vec::with_capacity(desc.columns.len() + 2);

    for col in &desc.columns {
        let not_null = if col.is_primary() || col.is_foreign() {
            " NOT NULL"
        } else {
            ""
        };
        parts.push(format!(
            "{} {}{}",
            col.name,
            dialect.type_name(col.value_type),
            not_null
        ));
    }

    parts.push(format!("PRIMARY KEY({})", desc.primary_key));

    if let Some(fk) = &desc.foreign_key {
        let parent =
            registry
                .get(&fk.parent_table)
                .ok_or_else(|| SchemaError::UnknownParent {
                    table: desc.name.clone(),
                    parent: fk.parent_table.clone(),
                })?;
        parts.push(format!(
            "FOREIGN KEY({}) REFERENCES {}({}) ON DELETE CASCADE",
            fk.column, parent.name, parent.primary_key
        ));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        desc.name,
        parts.join(", ")
    ))
}

/// `DROP TABLE IF EXISTS` for a descriptor
pub fn drop_table_sql(desc: &TableDescriptor) -> String {
    format!("DROP TABLE IF EXISTS {}", desc.name)
}

/// Multi-row upsert: `INSERT OR REPLACE INTO t (cols) VALUES (...), (...)`
///
/// Rows come pre-ordered from `Record::to_row` (primary key, foreign key,
/// remaining columns). Returns `None` for an empty slice.
pub fn insert_rows_sql(desc: &TableDescriptor, rows: &[Row], dialect: &dyn Dialect) -> Option<String> {
    let first = rows.first()?;
    let columns: Vec<&str> = first.iter().map(|(name, _)| name.as_str()).collect();

    let tuples: Vec<String> = rows
        .iter()
        .map(|row| {
            let values: Vec<String> = row
                .iter()
                .map(|(_, value)| dialect.format_value(value))
                .collect();
            format!("({})", values.join(", "))
        })
        .collect();

    Some(format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES {}",
        desc.name,
        columns.join(", "),
        tuples.join(", ")
    ))
}

/// Placeholder key insert: `INSERT OR IGNORE INTO t (pk) VALUES (...), (...)`
///
/// Insert-if-absent, so a placeholder never clobbers a row that was fully
/// hydrated by an earlier batch. Returns `None` for an empty slice.
pub fn insert_keys_sql(
    desc: &TableDescriptor,
    keys: &[Value],
    dialect: &dyn Dialect,
) -> Option<String> {
    if keys.is_empty() {
        return None;
    }

    let tuples: Vec<String> = keys
        .iter()
        .map(|key| format!("({})", dialect.format_value(key)))
        .collect();

    Some(format!(
        "INSERT OR IGNORE INTO {} ({}) VALUES {}",
        desc.name,
        desc.primary_key,
        tuples.join(", ")
    ))
}

/// `SELECT target.* FROM ... [WHERE ...] [ORDER BY ...]`
///
/// The FROM list is the target table plus every table reachable from the
/// filter's comparisons by walking belongs-to foreign keys upward. When
/// more than one table is involved, one join equality per foreign-key edge
/// (child.fk = parent.pk) is ANDed ahead of the translated predicate.
pub fn select_sql(
    desc: &TableDescriptor,
    filter: Option<&Filter>,
    sort: Option<&Sort>,
    registry: &SchemaRegistry,
    dialect: &dyn Dialect,
) -> SchemaResult<String> {
    let joined = join_set(desc, filter, registry)?;

    let mut sql = format!("SELECT {}.* FROM {}", desc.name, joined.join(", "));

    let mut conditions: Vec<String> = Vec::new();
    for name in &joined {
        // Tables in the join set are known to the registry
        let table = registry.get(name).ok_or_else(|| SchemaError::UnknownTable {
            table: name.clone(),
        })?;
        if let Some(fk) = &table.foreign_key {
            if joined.iter().any(|t| t == &fk.parent_table) {
                let parent = registry.get(&fk.parent_table).ok_or_else(|| {
                    SchemaError::UnknownTable {
                        table: fk.parent_table.clone(),
                    }
                })?;
                conditions.push(format!(
                    "{}.{} = {}.{}",
                    table.name, fk.column, parent.name, parent.primary_key
                ));
            }
        }
    }

    if let Some(filter) = filter {
        if conditions.is_empty() {
            conditions.push(filter_sql(filter, dialect));
        } else {
            conditions.push(grouped(filter, dialect));
        }
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some(sort) = sort {
        sql.push_str(&format!(
            " ORDER BY {}.{} {}",
            sort.table,
            sort.attribute,
            sort.direction.sql()
        ));
    }

    Ok(sql)
}

/// Target table plus every table the filter reaches through belongs-to
/// links, target first
///
/// When the filter touches a table other than the target, the target's own
/// belongs-to chain joins the set as well. Both chains close upward to the
/// root, so every non-root table in the set has its parent present and
/// contributes a join equality - a filter on an ancestor never degenerates
/// into a cross join.
fn join_set(
    desc: &TableDescriptor,
    filter: Option<&Filter>,
    registry: &SchemaRegistry,
) -> SchemaResult<Vec<String>> {
    let mut joined = vec![desc.name.clone()];

    let mut frontier = filter.map(Filter::referenced_tables).unwrap_or_default();
    if frontier.iter().any(|t| t != &desc.name) {
        if let Some(fk) = &desc.foreign_key {
            if fk.relation == RelationKind::BelongsTo {
                frontier.push(fk.parent_table.clone());
            }
        }
    }

    while let Some(name) = frontier.pop() {
        if joined.iter().any(|t| t == &name) {
            continue;
        }
        let table = registry.get(&name).ok_or_else(|| SchemaError::UnknownTable {
            table: name.clone(),
        })?;
        joined.push(name);
        if let Some(fk) = &table.foreign_key {
            if fk.relation == RelationKind::BelongsTo {
                frontier.push(fk.parent_table.clone());
            }
        }
    }

    Ok(joined)
}

/// Recursive predicate translation
///
/// Conjunction/disjunction children join with AND/OR; nested groups are
/// parenthesized so precedence follows the tree, not SQL defaults.
fn filter_sql(filter: &Filter, dialect: &dyn Dialect) -> String {
    match filter {
        Filter::Compare(cmp) => format!(
            "{}.{} {} {}",
            cmp.table,
            cmp.attribute,
            cmp.op.sql(),
            dialect.format_value(&cmp.value)
        ),
        Filter::All(children) => children
            .iter()
            .map(|child| grouped(child, dialect))
            .collect::<Vec<_>>()
            .join(" AND "),
        Filter::Any(children) => children
            .iter()
            .map(|child| grouped(child, dialect))
            .collect::<Vec<_>>()
            .join(" OR "),
    }
}

/// Parenthesize non-leaf sub-expressions
fn grouped(filter: &Filter, dialect: &dyn Dialect) -> String {
    match filter {
        Filter::Compare(_) => filter_sql(filter, dialect),
        Filter::All(_) | Filter::Any(_) => format!("({})", filter_sql(filter, dialect)),
    }
}
