use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, JoinSpec, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanalStatus {
    Good,
    NeedsRepair,
    Critical,
}

impl CanalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanalStatus::Good => "good",
            CanalStatus::NeedsRepair => "needs_repair",
            CanalStatus::Critical => "critical",
        }
    }
}

/// A canal carrying water within an irrigation area.
///
/// `area_name` is a display-only denormalized field joined at read time; the
/// `area_id` reference remains the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canal {
    pub id: Uuid,
    pub area_id: Uuid,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub capacity: f64,
    pub status: CanalStatus,
    pub last_inspection: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub area_name: String,
}

impl Entity for Canal {
    const TABLE: &'static str = tables::CANALS;
    const DISPLAY: &'static str = "canal";
    const ORDER_BY: &'static str = "created_at";
    const REQUIRED: &'static [&'static str] =
        &["area_id", "name", "length", "width", "capacity", "status"];
    const JOIN: Option<JoinSpec> = Some(JoinSpec {
        foreign_key: "area_id",
        parent_table: tables::IRRIGATION_AREAS,
        parent_field: "name",
        target_field: "area_name",
    });

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Create payload for a canal.
#[derive(Debug, Clone, Serialize)]
pub struct CanalDraft {
    pub area_id: Uuid,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub capacity: f64,
    pub status: CanalStatus,
    pub last_inspection: Option<NaiveDate>,
}

impl CanalDraft {
    pub fn new(
        area_id: Uuid,
        name: impl Into<String>,
        length: f64,
        width: f64,
        capacity: f64,
    ) -> Self {
        Self {
            area_id,
            name: name.into(),
            length,
            width,
            capacity,
            status: CanalStatus::Good,
            last_inspection: None,
        }
    }

    pub fn status(mut self, status: CanalStatus) -> Self {
        self.status = status;
        self
    }

    pub fn last_inspection(mut self, date: NaiveDate) -> Self {
        self.last_inspection = Some(date);
        self
    }
}

/// Partial update payload for a canal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CanalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CanalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_inspection: Option<NaiveDate>,
}
