use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::core::{MutationOp, Result, SyncError};
use crate::entity::{Entity, flatten_join};
use crate::notify::NotificationHub;
use crate::store::RemoteStore;

use super::EntityMirror;

/// Performs writes against the remote store and keeps the local mirror
/// consistent with them.
///
/// Every operation awaits the store's acknowledgement and applies the
/// authoritative record the store returned, never the caller's payload: the
/// store is what generates ids, timestamps and join fields. The initiating
/// session therefore observes its own write in the snapshot before the call
/// returns, ahead of any push echo. Each outcome, success or failure, is
/// published as a user-facing notification naming the entity and operation.
pub struct MutationCoordinator<E: Entity> {
    store: Arc<dyn RemoteStore>,
    mirror: Arc<EntityMirror<E>>,
    hub: NotificationHub,
}

impl<E: Entity> MutationCoordinator<E> {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        mirror: Arc<EntityMirror<E>>,
        hub: NotificationHub,
    ) -> Self {
        Self { store, mirror, hub }
    }

    /// Validates and inserts a new record, then prepends the acknowledged
    /// result to the mirror.
    ///
    /// A payload missing one of the entity's required fields is rejected
    /// before any remote call; the mirror is untouched either way on failure.
    pub async fn create(&self, payload: impl Serialize) -> Result<E> {
        let row = self.serialize_payload(payload, MutationOp::Create)?;
        if let Err(err) = validate_required::<E>(&row) {
            self.hub
                .error(format!("Failed to create {}", E::DISPLAY));
            return Err(err);
        }

        match self.store.insert(E::TABLE, row, E::JOIN).await {
            Ok(created) => {
                let record = self.decode(created, MutationOp::Create)?;
                self.mirror.apply_created(record.clone()).await;
                self.hub.success(format!("{} created", display_title::<E>()));
                Ok(record)
            }
            Err(source) => {
                self.hub
                    .error(format!("Failed to create {}", E::DISPLAY));
                Err(SyncError::Write {
                    op: MutationOp::Create,
                    entity: E::DISPLAY.to_string(),
                    source,
                })
            }
        }
    }

    /// Applies a partial update and replaces the mirrored record with the
    /// acknowledged result.
    pub async fn update(&self, id: Uuid, patch: impl Serialize) -> Result<E> {
        let patch = self.serialize_payload(patch, MutationOp::Update)?;

        match self.store.update(E::TABLE, id, patch, E::JOIN).await {
            Ok(updated) => {
                let record = self.decode(updated, MutationOp::Update)?;
                self.mirror.apply_updated(id, record.clone()).await;
                self.hub.success(format!("{} updated", display_title::<E>()));
                Ok(record)
            }
            Err(source) => {
                self.hub
                    .error(format!("Failed to update {}", E::DISPLAY));
                Err(SyncError::Write {
                    op: MutationOp::Update,
                    entity: E::DISPLAY.to_string(),
                    source,
                })
            }
        }
    }

    /// Deletes a record and removes it from the mirror.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        match self.store.delete(E::TABLE, id).await {
            Ok(()) => {
                self.mirror.apply_deleted(id).await;
                self.hub.success(format!("{} deleted", display_title::<E>()));
                Ok(())
            }
            Err(source) => {
                self.hub
                    .error(format!("Failed to delete {}", E::DISPLAY));
                Err(SyncError::Write {
                    op: MutationOp::Delete,
                    entity: E::DISPLAY.to_string(),
                    source,
                })
            }
        }
    }

    fn serialize_payload(&self, payload: impl Serialize, op: MutationOp) -> Result<Value> {
        let value = serde_json::to_value(payload).map_err(|err| SyncError::Decode {
            entity: E::DISPLAY.to_string(),
            message: err.to_string(),
        })?;
        if !value.is_object() {
            debug!("rejected non-object {op} payload for {}", E::TABLE);
            self.hub
                .error(format!("Failed to {op} {}", E::DISPLAY));
            return Err(SyncError::InvalidPayload {
                entity: E::DISPLAY.to_string(),
            });
        }
        Ok(value)
    }

    fn decode(&self, mut row: Value, op: MutationOp) -> Result<E> {
        if let Some(spec) = E::JOIN {
            flatten_join(&mut row, spec);
        }
        serde_json::from_value(row).map_err(|err| {
            self.hub.error(format!("Failed to {op} {}", E::DISPLAY));
            SyncError::Decode {
                entity: E::DISPLAY.to_string(),
                message: err.to_string(),
            }
        })
    }
}

/// Checks that every required field is present and non-null.
fn validate_required<E: Entity>(row: &Value) -> Result<()> {
    for field in E::REQUIRED {
        let value = row.get(*field);
        if value.is_none() || value == Some(&Value::Null) {
            return Err(SyncError::Validation {
                entity: E::DISPLAY.to_string(),
                field: (*field).to_string(),
            });
        }
    }
    Ok(())
}

fn display_title<E: Entity>() -> String {
    let mut chars = E::DISPLAY.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
