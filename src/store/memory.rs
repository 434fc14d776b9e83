use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{RemoteStore, SelectQuery};
use crate::core::{ChangeAction, ChangeEvent, StoreError, StoreResult};
use crate::entity::{JoinSpec, tables};

const DEFAULT_FEED_CAPACITY: usize = 64;

struct TableData {
    rows: Vec<Value>,
    feed: broadcast::Sender<ChangeEvent>,
}

impl TableData {
    fn new(capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(capacity);
        Self {
            rows: Vec::new(),
            feed,
        }
    }
}

/// In-process implementation of [`RemoteStore`].
///
/// Rows live in per-table vectors; ids and timestamps are generated on
/// insert; read-time joins are computed per query so the stored rows stay
/// normalized. Every committed mutation is announced on the table's change
/// feed after it is applied.
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, TableData>>,
    feed_capacity: usize,
}

impl InMemoryStore {
    /// Creates an empty store with no tables.
    pub fn new() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }

    pub fn with_feed_capacity(feed_capacity: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            feed_capacity,
        }
    }

    /// Creates a store with the five dashboard tables pre-created.
    pub fn for_dashboard() -> Self {
        let store = Self::new();
        for table in [
            tables::IRRIGATION_AREAS,
            tables::CANALS,
            tables::GATES,
            tables::MONITORING_DATA,
            tables::ALERTS,
        ] {
            store.create_table(table);
        }
        store
    }

    /// Creates a table. Creating an existing table is a no-op.
    pub fn create_table(&self, name: &str) {
        let mut tables = match self.tables.write() {
            Ok(tables) => tables,
            Err(poisoned) => poisoned.into_inner(),
        };
        tables
            .entry(name.to_string())
            .or_insert_with(|| TableData::new(self.feed_capacity));
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables
            .read()
            .map(|tables| tables.contains_key(name))
            .unwrap_or(false)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>> {
        let tables = self.tables.read()?;
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let mut rows: Vec<Value> = data
            .rows
            .iter()
            .filter(|row| matches_filters(row, &query.filters))
            .cloned()
            .collect();

        if let Some(key) = query.order_by.as_deref() {
            rows.sort_by(|a, b| cmp_order_key(b, a, key));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        if let Some(spec) = query.join {
            for row in &mut rows {
                embed_join(&tables, row, spec);
            }
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value, join: Option<JoinSpec>) -> StoreResult<Value> {
        let mut stored = match row {
            Value::Object(obj) => obj,
            other => {
                return Err(StoreError::InvalidRow(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };

        let id = match stored.get("id").and_then(parse_id) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                stored.insert("id".to_string(), json!(id));
                id
            }
        };
        let now = json!(Utc::now());
        stored.entry("created_at".to_string()).or_insert(now.clone());
        stored.entry("updated_at".to_string()).or_insert(now);

        let mut tables = self.tables.write()?;
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        data.rows.push(Value::Object(stored.clone()));
        let _ = data
            .feed
            .send(ChangeEvent::new(table, ChangeAction::Insert, Some(id)));

        let mut created = Value::Object(stored);
        if let Some(spec) = join {
            embed_join(&tables, &mut created, spec);
        }
        Ok(created)
    }

    async fn update(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        join: Option<JoinSpec>,
    ) -> StoreResult<Value> {
        let patch = match patch {
            Value::Object(obj) => obj,
            other => {
                return Err(StoreError::InvalidRow(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };

        let mut tables = self.tables.write()?;
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let row = data
            .rows
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or(StoreError::RowNotFound {
                table: table.to_string(),
                id,
            })?;

        if let Some(obj) = row.as_object_mut() {
            for (key, value) in patch {
                if key == "id" || key == "created_at" {
                    continue;
                }
                obj.insert(key, value);
            }
            obj.insert("updated_at".to_string(), json!(Utc::now()));
        }
        let mut updated = row.clone();
        let _ = data
            .feed
            .send(ChangeEvent::new(table, ChangeAction::Update, Some(id)));

        if let Some(spec) = join {
            embed_join(&tables, &mut updated, spec);
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write()?;
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let before = data.rows.len();
        data.rows.retain(|row| row_id(row) != Some(id));
        if data.rows.len() < before {
            let _ = data
                .feed
                .send(ChangeEvent::new(table, ChangeAction::Delete, Some(id)));
        }
        Ok(())
    }

    async fn count(&self, table: &str, filters: &[(String, Value)]) -> StoreResult<usize> {
        let tables = self.tables.read()?;
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(data
            .rows
            .iter()
            .filter(|row| matches_filters(row, filters))
            .count())
    }

    fn subscribe(&self, table: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        let tables = self.tables.read()?;
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(data.feed.subscribe())
    }
}

fn matches_filters(row: &Value, filters: &[(String, Value)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| row.get(field).unwrap_or(&Value::Null) == expected)
}

fn row_id(row: &Value) -> Option<Uuid> {
    row.get("id").and_then(parse_id)
}

fn parse_id(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s).ok())
}

fn cmp_order_key(a: &Value, b: &Value, key: &str) -> Ordering {
    match (parse_timestamp(a.get(key)), parse_timestamp(b.get(key))) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => field_repr(a, key).cmp(&field_repr(b, key)),
    }
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn field_repr(row: &Value, key: &str) -> String {
    row.get(key).map(Value::to_string).unwrap_or_default()
}

/// Embeds the parent's display field as a nested object, the shape the
/// mirror's flattening step expects. A dangling or absent foreign key embeds
/// nothing, which flattens to an empty display name.
fn embed_join(tables: &HashMap<String, TableData>, row: &mut Value, spec: JoinSpec) {
    let parent_value = row
        .get(spec.foreign_key)
        .and_then(parse_id)
        .and_then(|parent_id| {
            tables
                .get(spec.parent_table)?
                .rows
                .iter()
                .find(|parent| row_id(parent) == Some(parent_id))
        })
        .and_then(|parent| parent.get(spec.parent_field))
        .cloned();

    if let (Some(obj), Some(display)) = (row.as_object_mut(), parent_value) {
        let mut nested = Map::new();
        nested.insert(spec.parent_field.to_string(), display);
        obj.insert(spec.parent_table.to_string(), Value::Object(nested));
    }
}
