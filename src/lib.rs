// ============================================================================
// irrisync Library
// ============================================================================
//
// Client-side realtime synchronization layer for irrigation monitoring
// dashboards. Each screen opens a view over one remote collection; the view
// keeps an in-memory mirror consistent with the store through full
// refetch-on-demand, push-driven invalidation and apply-after-
// acknowledgement writes.
//
// ============================================================================

pub mod core;
pub mod entity;
pub mod facade;
pub mod identity;
pub mod notify;
pub mod store;
pub mod sync;

// Re-export main types for convenience
pub use core::{ChangeAction, ChangeEvent, MutationOp, Result, StoreError, SyncError};
pub use facade::{DashboardStats, DashboardView, EntityView, SyncClient, SyncOptions};
pub use identity::{Actor, Role};
pub use notify::{Notification, NotificationHub, NotificationKind};
pub use store::{InMemoryStore, RemoteStore, SelectQuery};
pub use sync::{EntityMirror, MutationCoordinator, Subscription, SubscriptionManager};

// Re-export the mirrored entity types
pub use entity::{
    Alert, AlertDraft, AlertKind, AlertPatch, Area, AreaDraft, AreaPatch, AreaStatus, Canal,
    CanalDraft, CanalPatch, CanalStatus, Entity, Gate, GateCondition, GateDraft, GateKind,
    GatePatch, GateStatus, JoinSpec, MonitoringReading, ReadingCondition, ReadingDraft,
};
