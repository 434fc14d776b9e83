use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::core::{Result, SyncError};
use crate::entity::tables;
use crate::notify::NotificationHub;
use crate::store::RemoteStore;
use crate::sync::{Subscription, SubscriptionManager, subscription::RecomputeFn};

const DASHBOARD_TABLES: [&str; 5] = [
    tables::IRRIGATION_AREAS,
    tables::CANALS,
    tables::GATES,
    tables::MONITORING_DATA,
    tables::ALERTS,
];

/// Aggregate counts shown on the dashboard landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    pub total_areas: usize,
    pub total_canals: usize,
    pub total_gates: usize,
    pub total_readings: usize,
    pub unread_critical_alerts: usize,
}

struct DashboardInner {
    store: Arc<dyn RemoteStore>,
    stats: RwLock<DashboardStats>,
    detached: AtomicBool,
}

impl DashboardInner {
    async fn refresh(&self) -> Result<()> {
        let alert_filters = vec![
            ("type".to_string(), json!("critical")),
            ("is_read".to_string(), json!(false)),
        ];

        let counts = futures::try_join!(
            self.store.count(tables::IRRIGATION_AREAS, &[]),
            self.store.count(tables::CANALS, &[]),
            self.store.count(tables::GATES, &[]),
            self.store.count(tables::MONITORING_DATA, &[]),
            self.store.count(tables::ALERTS, &alert_filters),
        );

        let (areas, canals, gates, readings, alerts) =
            counts.map_err(|source| SyncError::Fetch {
                entity: "dashboard stats".to_string(),
                source,
            })?;

        if self.detached.load(Ordering::SeqCst) {
            return Ok(());
        }
        *self.stats.write().await = DashboardStats {
            total_areas: areas,
            total_canals: canals,
            total_gates: gates,
            total_readings: readings,
            unread_critical_alerts: alerts,
        };
        Ok(())
    }
}

/// The derived dashboard mirror: one aggregate recomputed from five tables.
///
/// Each of the dependency tables gets its own push channel; any change on
/// any of them funnels into the same recount. Dropping the view closes all
/// channels and discards recounts still in flight.
pub struct DashboardView {
    inner: Arc<DashboardInner>,
    subscriptions: Vec<Subscription>,
    hub: NotificationHub,
}

impl DashboardView {
    pub(crate) async fn open(
        store: Arc<dyn RemoteStore>,
        hub: NotificationHub,
        auto_subscribe: bool,
    ) -> Self {
        let inner = Arc::new(DashboardInner {
            store: Arc::clone(&store),
            stats: RwLock::new(DashboardStats::default()),
            detached: AtomicBool::new(false),
        });

        if let Err(err) = inner.refresh().await {
            warn!("initial dashboard recount failed: {err}");
            hub.error("Failed to load dashboard statistics");
        }

        let subscriptions = if auto_subscribe {
            let recompute: RecomputeFn = {
                let inner = Arc::clone(&inner);
                Arc::new(move || {
                    let inner = Arc::clone(&inner);
                    Box::pin(async move {
                        if let Err(err) = inner.refresh().await {
                            warn!("dashboard recount failed: {err}");
                        }
                    })
                })
            };
            match SubscriptionManager::attach_tables(&store, &DASHBOARD_TABLES, recompute) {
                Ok(subscriptions) => subscriptions,
                Err(err) => {
                    warn!("no live updates for dashboard stats: {err}");
                    hub.warning("Live updates unavailable for dashboard statistics");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            inner,
            subscriptions,
            hub,
        }
    }

    /// The current aggregate counts. No I/O.
    pub async fn stats(&self) -> DashboardStats {
        *self.inner.stats.read().await
    }

    /// Recounts on demand. On failure the previous counts stay available
    /// and an error notification is published.
    pub async fn refresh(&self) -> Result<()> {
        self.inner.refresh().await.inspect_err(|err| {
            warn!("dashboard recount failed: {err}");
            self.hub.error("Failed to load dashboard statistics");
        })
    }

    pub fn is_live(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Tears the view down explicitly. Equivalent to dropping it.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.inner.detached.store(true, Ordering::SeqCst);
        for subscription in self.subscriptions.drain(..) {
            subscription.close();
        }
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        self.teardown();
    }
}
