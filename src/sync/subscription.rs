use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::core::{Result, SyncError};
use crate::entity::Entity;
use crate::store::RemoteStore;

use super::EntityMirror;

/// Handle for one open push channel. Dropping it closes the channel; no
/// reload fires after that.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn close(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Shared aggregate recompute invoked for every change on any dependency
/// table, e.g. the dashboard counts spanning all five tables.
pub type RecomputeFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Opens and drives push channels for mirrored tables.
///
/// The payload of a change announcement is never applied directly; it may
/// lack the denormalized join fields. Every announcement instead triggers a
/// full reload of the owning mirror, trading efficiency for correctness at
/// dashboard-scale row counts. A lagged channel is handled the same way: the
/// reload after the next announcement is a full replace, so missed events
/// cannot leave the mirror permanently stale.
pub struct SubscriptionManager;

impl SubscriptionManager {
    /// Opens one channel for the entity's table, reloading the mirror on
    /// every announced change for the lifetime of the returned guard.
    pub fn attach<E: Entity>(
        store: &Arc<dyn RemoteStore>,
        mirror: Arc<EntityMirror<E>>,
    ) -> Result<Subscription> {
        let mut feed = store.subscribe(E::TABLE).map_err(|source| SyncError::Subscription {
            entity: E::DISPLAY.to_string(),
            source,
        })?;

        let handle = tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(event) => {
                        if mirror.is_detached() {
                            break;
                        }
                        debug!(
                            "change on {}: {:?}, reloading mirror",
                            event.table, event.action
                        );
                        if let Err(err) = mirror.load().await {
                            warn!("push-triggered reload of {} failed: {err}", E::TABLE);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("change feed for {} lagged, skipped {skipped} events", E::TABLE);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription { handle })
    }

    /// Opens one channel per dependency table, all funneling into the same
    /// aggregate recompute.
    pub fn attach_tables(
        store: &Arc<dyn RemoteStore>,
        tables: &[&str],
        recompute: RecomputeFn,
    ) -> Result<Vec<Subscription>> {
        let mut subscriptions = Vec::with_capacity(tables.len());
        for table in tables {
            let mut feed = store.subscribe(table).map_err(|source| SyncError::Subscription {
                entity: table.to_string(),
                source,
            })?;
            let recompute = Arc::clone(&recompute);
            let table = table.to_string();

            let handle = tokio::spawn(async move {
                loop {
                    match feed.recv().await {
                        Ok(_) => recompute().await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("change feed for {table} lagged, skipped {skipped} events");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            subscriptions.push(Subscription { handle });
        }
        Ok(subscriptions)
    }
}
