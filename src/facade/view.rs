use std::sync::Arc;

use log::warn;
use serde::Serialize;
use uuid::Uuid;

use crate::core::Result;
use crate::entity::Entity;
use crate::notify::NotificationHub;
use crate::sync::{EntityMirror, MutationCoordinator, Subscription};

/// One mounted view over one entity type.
///
/// Bundles the mirror, its push subscription and the mutation coordinator
/// for the lifetime of the consuming screen. Dropping the view (or calling
/// [`close`](EntityView::close)) detaches the mirror and closes the channel:
/// loads still in flight are discarded and no further reload can fire.
pub struct EntityView<E: Entity> {
    mirror: Arc<EntityMirror<E>>,
    coordinator: MutationCoordinator<E>,
    subscription: Option<Subscription>,
    hub: NotificationHub,
}

impl<E: Entity> EntityView<E> {
    pub(crate) fn new(
        mirror: Arc<EntityMirror<E>>,
        coordinator: MutationCoordinator<E>,
        subscription: Option<Subscription>,
        hub: NotificationHub,
    ) -> Self {
        Self {
            mirror,
            coordinator,
            subscription,
            hub,
        }
    }

    /// The current ordered records, newest first. No I/O.
    pub async fn snapshot(&self) -> Vec<E> {
        self.mirror.snapshot().await
    }

    pub async fn len(&self) -> usize {
        self.mirror.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.mirror.is_empty().await
    }

    /// True while a full fetch is in flight; the presentation layer renders
    /// its loading indicator from this.
    pub async fn is_loading(&self) -> bool {
        self.mirror.is_loading().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.mirror.last_error().await
    }

    /// True when the push channel is open and live updates are flowing.
    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Re-runs the full fetch on demand. On failure the previous snapshot
    /// stays available and an error notification is published.
    pub async fn reload(&self) -> Result<()> {
        self.mirror.load().await.inspect_err(|err| {
            warn!("reload of {} failed: {err}", E::TABLE);
            self.hub
                .error(format!("Failed to load {} data", E::DISPLAY));
        })
    }

    /// Creates a record; see [`MutationCoordinator::create`].
    pub async fn create(&self, payload: impl Serialize) -> Result<E> {
        self.coordinator.create(payload).await
    }

    /// Partially updates a record; see [`MutationCoordinator::update`].
    pub async fn update(&self, id: Uuid, patch: impl Serialize) -> Result<E> {
        self.coordinator.update(id, patch).await
    }

    /// Deletes a record; see [`MutationCoordinator::delete`].
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.coordinator.delete(id).await
    }

    /// Tears the view down explicitly. Equivalent to dropping it.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.mirror.detach();
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
    }
}

impl<E: Entity> Drop for EntityView<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
