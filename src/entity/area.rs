use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaStatus {
    Active,
    Maintenance,
    Inactive,
}

impl AreaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaStatus::Active => "active",
            AreaStatus::Maintenance => "maintenance",
            AreaStatus::Inactive => "inactive",
        }
    }
}

/// An irrigation service area, the root of the infrastructure hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub total_area: f64,
    pub status: AreaStatus,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Area {
    const TABLE: &'static str = tables::IRRIGATION_AREAS;
    const DISPLAY: &'static str = "area";
    const ORDER_BY: &'static str = "created_at";
    const REQUIRED: &'static [&'static str] = &["name", "location", "total_area", "status"];

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Create payload for an area.
#[derive(Debug, Clone, Serialize)]
pub struct AreaDraft {
    pub name: String,
    pub location: String,
    pub total_area: f64,
    pub status: AreaStatus,
    pub lat: f64,
    pub lng: f64,
}

impl AreaDraft {
    /// Builds a draft with all required fields; coordinates default to the
    /// origin until placed on the map.
    pub fn new(name: impl Into<String>, location: impl Into<String>, total_area: f64) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            total_area,
            status: AreaStatus::Active,
            lat: 0.0,
            lng: 0.0,
        }
    }

    pub fn status(mut self, status: AreaStatus) -> Self {
        self.status = status;
        self
    }

    pub fn coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.lat = lat;
        self.lng = lng;
        self
    }
}

/// Partial update payload for an area.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AreaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AreaStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}
