// ============================================================================
// Mirrored entity types
// ============================================================================
//
// One record type per remote collection, plus the `Entity` contract the
// generic mirror machinery is parameterized over. Per-entity fetch, join and
// validation knowledge lives here as declarative metadata instead of being
// duplicated in every data path.
//
// ============================================================================

pub mod alert;
pub mod area;
pub mod canal;
pub mod gate;
pub mod reading;

pub use alert::{Alert, AlertDraft, AlertKind, AlertPatch};
pub use area::{Area, AreaDraft, AreaPatch, AreaStatus};
pub use canal::{Canal, CanalDraft, CanalPatch, CanalStatus};
pub use gate::{Gate, GateCondition, GateDraft, GateKind, GatePatch, GateStatus};
pub use reading::{MonitoringReading, ReadingCondition, ReadingDraft};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// Canonical remote collection names.
pub mod tables {
    pub const IRRIGATION_AREAS: &str = "irrigation_areas";
    pub const CANALS: &str = "canals";
    pub const GATES: &str = "gates";
    pub const MONITORING_DATA: &str = "monitoring_data";
    pub const ALERTS: &str = "alerts";
}

/// Declarative read-time join, producing one display-only field.
///
/// The parent's display field is embedded by the store as a nested object
/// (`{"irrigation_areas": {"name": ...}}`) and flattened by the mirror into
/// `target_field`. The flat field is never a source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    /// Foreign-key field on the child row.
    pub foreign_key: &'static str,
    /// Table the foreign key references.
    pub parent_table: &'static str,
    /// Field of the parent row to surface.
    pub parent_field: &'static str,
    /// Flat field name on the child record after flattening.
    pub target_field: &'static str,
}

/// Contract every mirrored record type fulfills.
///
/// All of the per-entity knowledge the sync layer needs is declared here
/// once; the mirror, subscription and mutation machinery is generic over it.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Remote collection name.
    const TABLE: &'static str;

    /// Human-readable singular name used in notifications and errors.
    const DISPLAY: &'static str;

    /// Field the default listing is ordered by, descending (newest first).
    const ORDER_BY: &'static str;

    /// Default fetch limit for the full reload, if any.
    const FETCH_LIMIT: Option<usize> = None;

    /// Fields a create payload must carry, checked before any remote call.
    const REQUIRED: &'static [&'static str];

    /// Read-time denormalization, if this entity carries a parent name.
    const JOIN: Option<JoinSpec> = None;

    fn id(&self) -> Uuid;
}

/// Flattens an embedded join object into the flat display field.
///
/// Missing parents flatten to an empty string, matching the display-only
/// nature of the field.
pub fn flatten_join(row: &mut Value, spec: JoinSpec) {
    if let Some(obj) = row.as_object_mut() {
        let display = obj
            .remove(spec.parent_table)
            .as_ref()
            .and_then(|parent| parent.get(spec.parent_field))
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();
        obj.insert(spec.target_field.to_string(), Value::String(display));
    }
}
