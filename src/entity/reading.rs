use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, JoinSpec, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingCondition {
    Normal,
    Warning,
    Critical,
}

impl ReadingCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingCondition::Normal => "normal",
            ReadingCondition::Warning => "warning",
            ReadingCondition::Critical => "critical",
        }
    }
}

/// A water-level/discharge measurement taken at a gate.
///
/// Listings are ordered by `recorded_at` and capped at the most recent 100
/// readings; older history belongs to the reports surface, not the live
/// monitoring view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringReading {
    pub id: Uuid,
    pub gate_id: Uuid,
    pub water_level: f64,
    pub discharge: f64,
    pub condition: ReadingCondition,
    pub recorded_by: Option<Uuid>,
    pub notes: Option<String>,
    pub video_url: Option<String>,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub gate_name: String,
}

impl Entity for MonitoringReading {
    const TABLE: &'static str = tables::MONITORING_DATA;
    const DISPLAY: &'static str = "monitoring reading";
    const ORDER_BY: &'static str = "recorded_at";
    const FETCH_LIMIT: Option<usize> = Some(100);
    const REQUIRED: &'static [&'static str] =
        &["gate_id", "water_level", "discharge", "condition"];
    const JOIN: Option<JoinSpec> = Some(JoinSpec {
        foreign_key: "gate_id",
        parent_table: tables::GATES,
        parent_field: "name",
        target_field: "gate_name",
    });

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Create payload for a monitoring reading. `recorded_at` defaults to the
/// moment the draft is built.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingDraft {
    pub gate_id: Uuid,
    pub water_level: f64,
    pub discharge: f64,
    pub condition: ReadingCondition,
    pub recorded_by: Option<Uuid>,
    pub notes: Option<String>,
    pub video_url: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ReadingDraft {
    pub fn new(gate_id: Uuid, water_level: f64, discharge: f64, condition: ReadingCondition) -> Self {
        Self {
            gate_id,
            water_level,
            discharge,
            condition,
            recorded_by: None,
            notes: None,
            video_url: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn recorded_by(mut self, actor_id: Uuid) -> Self {
        self.recorded_by = Some(actor_id);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }
}
