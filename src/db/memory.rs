// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory table store for local development and tests.

use crate::db::{Direction, Query, StoreError, TableStore};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

/// Table store that keeps rows in process memory.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<DashMap<String, Vec<Value>>>,
    insert_failure: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail with the given backend message
    /// (`None` restores normal behavior).
    pub fn set_insert_failure(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.insert_failure.lock() {
            *failure = message.map(str::to_string);
        }
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn pending_failure(&self) -> Option<String> {
        self.insert_failure
            .lock()
            .ok()
            .and_then(|failure| failure.clone())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
        if let Some(message) = self.pending_failure() {
            return Err(StoreError::Backend(message));
        }

        let Value::Object(mut row) = record else {
            return Err(StoreError::Backend(format!(
                "Row for table '{}' must be a JSON object",
                table
            )));
        };

        if !row.contains_key("id") {
            row.insert(
                "id".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }

        let row = Value::Object(row);
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());

        tracing::debug!(table, "Inserted row into memory store");
        Ok(row)
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.matches(row))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        let rows = rows
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX));

        Ok(match &query.columns {
            Some(columns) => rows.map(|row| project(row, columns)).collect(),
            None => rows.collect(),
        })
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        if let Some(mut rows) = self.tables.get_mut(table) {
            let id_filter = Query::new().eq("id", id);
            rows.retain(|row| !id_filter.matches(row));
        }
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        // Missing/null sorts last ascending, like Postgres NULLS LAST
        (Some(_), None | Some(Value::Null)) => Ordering::Less,
        (None | Some(Value::Null), Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn project(row: Value, columns: &[String]) -> Value {
    match row {
        Value::Object(mut map) => {
            let mut projected = Map::new();
            for column in columns {
                if let Some(value) = map.remove(column) {
                    projected.insert(column.clone(), value);
                }
            }
            Value::Object(projected)
        }
        other => other,
    }
}
