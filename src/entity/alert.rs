use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Critical,
    Warning,
    Info,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Critical => "critical",
            AlertKind::Warning => "warning",
            AlertKind::Info => "info",
        }
    }
}

/// An operational alert shown on the dashboard. Only the ten most recent
/// alerts are mirrored; the wire field for the alert kind is `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub location: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Alert {
    const TABLE: &'static str = tables::ALERTS;
    const DISPLAY: &'static str = "alert";
    const ORDER_BY: &'static str = "created_at";
    const FETCH_LIMIT: Option<usize> = Some(10);
    const REQUIRED: &'static [&'static str] = &["type", "title", "location"];

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Create payload for an alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertDraft {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub location: String,
    pub is_read: bool,
}

impl AlertDraft {
    pub fn new(kind: AlertKind, title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            location: location.into(),
            is_read: false,
        }
    }
}

/// Partial update payload for an alert, typically used to mark it read.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AlertKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

impl AlertPatch {
    pub fn mark_read() -> Self {
        Self {
            is_read: Some(true),
            ..Self::default()
        }
    }
}
