use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dashboard role, supplied by the external identity provider.
///
/// Roles gate which mutation entry points the presentation layer exposes;
/// the remote store's access-control policy enforces the same rules on its
/// side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    FieldOfficer,
    Manager,
}

impl Role {
    /// Whether this role may create, edit and delete infrastructure records.
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Admin | Role::FieldOfficer)
    }

    /// Whether this role administers user accounts.
    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// The signed-in actor. Identity and session management live entirely in the
/// external provider; this crate only carries the resolved result, e.g. to
/// stamp `recorded_by` on monitoring readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}
