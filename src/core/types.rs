use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of row-level change a remote store announces on its feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// A row-level change announcement.
///
/// Only the table name, action and (when known) row id are carried. The
/// payload shape of push events is never trusted for mirror reconciliation:
/// a change announcement always triggers a full reload so denormalized join
/// fields stay correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub action: ChangeAction,
    pub id: Option<Uuid>,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, action: ChangeAction, id: Option<Uuid>) -> Self {
        Self {
            table: table.into(),
            action,
            id,
        }
    }
}

/// A write operation performed through the mutation coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update,
    Delete,
}

impl MutationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationOp::Create => "create",
            MutationOp::Update => "update",
            MutationOp::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
