use std::sync::Arc;

use log::warn;

use crate::entity::Entity;
use crate::notify::{DEFAULT_NOTIFICATION_CAPACITY, NotificationHub};
use crate::store::RemoteStore;
use crate::sync::{EntityMirror, MutationCoordinator, SubscriptionManager};

use super::dashboard::DashboardView;
use super::view::EntityView;

/// Tuning knobs for a [`SyncClient`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Open a push channel for every view. Disable to run fetch-on-open-only,
    /// e.g. in tests that drive reloads by hand.
    pub auto_subscribe: bool,

    /// Capacity of the user-facing notification channel.
    pub notification_capacity: usize,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self {
            auto_subscribe: true,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }

    pub fn auto_subscribe(mut self, enabled: bool) -> Self {
        self.auto_subscribe = enabled;
        self
    }

    pub fn notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point of the synchronization layer.
///
/// Holds the injected store instance and the notification hub shared by all
/// views. Created once at application bootstrap and passed down; there is
/// deliberately no global instance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use irrisync::{Area, AreaDraft, InMemoryStore, SyncClient};
///
/// # tokio_test::block_on(async {
/// let store = Arc::new(InMemoryStore::for_dashboard());
/// let client = SyncClient::new(store);
///
/// let areas = client.open::<Area>().await;
/// let created = areas
///     .create(AreaDraft::new("Daerah Utara", "Kecamatan Sumber", 120.5))
///     .await
///     .unwrap();
/// assert_eq!(areas.snapshot().await[0].id, created.id);
/// # });
/// ```
pub struct SyncClient {
    store: Arc<dyn RemoteStore>,
    notifications: NotificationHub,
    options: SyncOptions,
}

impl SyncClient {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_options(store, SyncOptions::new())
    }

    pub fn with_options(store: Arc<dyn RemoteStore>, options: SyncOptions) -> Self {
        Self {
            store,
            notifications: NotificationHub::new(options.notification_capacity),
            options,
        }
    }

    /// The hub the presentation layer subscribes to for toasts.
    pub fn notifications(&self) -> &NotificationHub {
        &self.notifications
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Opens a view over one entity type: a fresh mirror, a push channel
    /// and an initial full fetch.
    ///
    /// Neither failure mode is fatal. A failed initial fetch leaves the view
    /// empty with `last_error` set; a push channel that cannot be opened
    /// degrades the view to fetch-on-open-only. Both are surfaced through
    /// the notification hub.
    pub async fn open<E: Entity>(&self) -> EntityView<E> {
        let mirror = Arc::new(EntityMirror::new(Arc::clone(&self.store)));

        // the channel opens before the initial fetch, so a change committed
        // while the fetch is in flight still gets announced; the reload it
        // triggers is a full replace and therefore safe to overlap
        let subscription = if self.options.auto_subscribe {
            match SubscriptionManager::attach(&self.store, Arc::clone(&mirror)) {
                Ok(subscription) => Some(subscription),
                Err(err) => {
                    warn!("no live updates for {}: {err}", E::TABLE);
                    self.notifications
                        .warning(format!("Live updates unavailable for {} data", E::DISPLAY));
                    None
                }
            }
        } else {
            None
        };

        if let Err(err) = mirror.load().await {
            warn!("initial load of {} failed: {err}", E::TABLE);
            self.notifications
                .error(format!("Failed to load {} data", E::DISPLAY));
        }

        let coordinator = MutationCoordinator::new(
            Arc::clone(&self.store),
            Arc::clone(&mirror),
            self.notifications.clone(),
        );

        EntityView::new(mirror, coordinator, subscription, self.notifications.clone())
    }

    /// Opens the aggregate dashboard view counting rows across all five
    /// tables, resubscribed to each of them.
    pub async fn open_dashboard(&self) -> DashboardView {
        DashboardView::open(
            Arc::clone(&self.store),
            self.notifications.clone(),
            self.options.auto_subscribe,
        )
        .await
    }
}
