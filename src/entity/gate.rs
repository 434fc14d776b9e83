use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, JoinSpec, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Intake,
    Distribution,
    Drainage,
}

impl GateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::Intake => "intake",
            GateKind::Distribution => "distribution",
            GateKind::Drainage => "drainage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Open,
    Closed,
    Partial,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Open => "open",
            GateStatus::Closed => "closed",
            GateStatus::Partial => "partial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateCondition {
    Good,
    Fair,
    Poor,
}

impl GateCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateCondition::Good => "good",
            GateCondition::Fair => "fair",
            GateCondition::Poor => "poor",
        }
    }
}

/// A water gate mounted on a canal. The wire field for the gate kind is
/// `type`, kept from the remote schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub id: Uuid,
    pub canal_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GateKind,
    pub status: GateStatus,
    pub condition: GateCondition,
    pub last_maintenance: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub canal_name: String,
}

impl Entity for Gate {
    const TABLE: &'static str = tables::GATES;
    const DISPLAY: &'static str = "gate";
    const ORDER_BY: &'static str = "created_at";
    const REQUIRED: &'static [&'static str] = &["canal_id", "name", "type", "status", "condition"];
    const JOIN: Option<JoinSpec> = Some(JoinSpec {
        foreign_key: "canal_id",
        parent_table: tables::CANALS,
        parent_field: "name",
        target_field: "canal_name",
    });

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Create payload for a gate.
#[derive(Debug, Clone, Serialize)]
pub struct GateDraft {
    pub canal_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GateKind,
    pub status: GateStatus,
    pub condition: GateCondition,
    pub last_maintenance: Option<NaiveDate>,
}

impl GateDraft {
    pub fn new(canal_id: Uuid, name: impl Into<String>, kind: GateKind) -> Self {
        Self {
            canal_id,
            name: name.into(),
            kind,
            status: GateStatus::Closed,
            condition: GateCondition::Good,
            last_maintenance: None,
        }
    }

    pub fn status(mut self, status: GateStatus) -> Self {
        self.status = status;
        self
    }

    pub fn condition(mut self, condition: GateCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn last_maintenance(mut self, date: NaiveDate) -> Self {
        self.last_maintenance = Some(date);
        self
    }
}

/// Partial update payload for a gate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canal_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<GateKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GateStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<GateCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_maintenance: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gate_kind_uses_type_as_wire_field() {
        let draft = GateDraft::new(Uuid::new_v4(), "Pintu Intake 1", GateKind::Intake);
        let value = serde_json::to_value(draft).unwrap();
        assert_eq!(value["type"], json!("intake"));
        assert!(value.get("kind").is_none());
    }
}
