// ============================================================================
// Remote store seam
// ============================================================================
//
// The synchronization layer talks to an opaque relational backend through
// the `RemoteStore` trait: per-table select/insert/update/delete/count over
// JSON object rows, plus a per-table change feed. `InMemoryStore` is a
// complete in-process implementation used for tests, demos and local
// development.
//
// ============================================================================

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::{ChangeEvent, StoreResult};
use crate::entity::JoinSpec;

/// A full-collection query: equality filters, descending order key, limit
/// and an optional read-time join.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<String>,
    pub limit: Option<usize>,
    pub join: Option<JoinSpec>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter on a field.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Orders descending (newest first) by the given field.
    pub fn order_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn maybe_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn join(mut self, spec: JoinSpec) -> Self {
        self.join = Some(spec);
        self
    }

    pub fn maybe_join(mut self, spec: Option<JoinSpec>) -> Self {
        self.join = spec;
        self
    }
}

/// The remote authoritative store the mirrors synchronize against.
///
/// Rows cross this seam as JSON objects; typed decoding happens in the
/// mirror. Insert and update return the full authoritative record (generated
/// id, timestamps, embedded join parents) so the caller can apply it locally
/// without refetching.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>>;

    async fn insert(&self, table: &str, row: Value, join: Option<JoinSpec>) -> StoreResult<Value>;

    async fn update(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        join: Option<JoinSpec>,
    ) -> StoreResult<Value>;

    /// Deletes by id. Deleting an absent row is not an error.
    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<()>;

    async fn count(&self, table: &str, filters: &[(String, Value)]) -> StoreResult<usize>;

    /// Opens a change feed for a table. Every committed insert/update/delete
    /// on the table is announced to all open receivers.
    fn subscribe(&self, table: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>>;
}
