// ============================================================================
// Synchronization core
// ============================================================================
//
// Three cooperating pieces keep a local snapshot consistent with the remote
// store:
//
// - `EntityMirror`: the authoritative local copy of one table's rows.
// - `SubscriptionManager`: push channels that turn remote change
//   announcements into full mirror reloads.
// - `MutationCoordinator`: writes that apply the store's acknowledged result
//   to the mirror before returning.
//
// ============================================================================

pub mod mirror;
pub mod mutation;
pub mod subscription;

pub use mirror::EntityMirror;
pub use mutation::MutationCoordinator;
pub use subscription::{Subscription, SubscriptionManager};
