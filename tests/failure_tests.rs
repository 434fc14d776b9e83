//! Failure modes and teardown: failed reloads keep the previous snapshot,
//! failed writes leave the mirror untouched, a dead change feed degrades the
//! view instead of killing it, and a detached mirror discards in-flight work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Notify, broadcast};
use uuid::Uuid;

use irrisync::entity::tables;
use irrisync::{
    Area, AreaDraft, ChangeEvent, EntityMirror, InMemoryStore, JoinSpec, NotificationKind,
    RemoteStore, SelectQuery, StoreError, SubscriptionManager, SyncClient, SyncError, SyncOptions,
};
use irrisync::core::StoreResult;

// ============================================================================
// Store doubles
// ============================================================================

/// Wraps the in-memory store and fails selected operations on demand.
struct FlakyStore {
    inner: InMemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::for_dashboard(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn outage(&self) -> StoreError {
        StoreError::BackendError("connection reset".to_string())
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.outage());
        }
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: &str, row: Value, join: Option<JoinSpec>) -> StoreResult<Value> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.outage());
        }
        self.inner.insert(table, row, join).await
    }

    async fn update(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        join: Option<JoinSpec>,
    ) -> StoreResult<Value> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.outage());
        }
        self.inner.update(table, id, patch, join).await
    }

    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.outage());
        }
        self.inner.delete(table, id).await
    }

    async fn count(&self, table: &str, filters: &[(String, Value)]) -> StoreResult<usize> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.outage());
        }
        self.inner.count(table, filters).await
    }

    fn subscribe(&self, table: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        self.inner.subscribe(table)
    }
}

/// A store whose change feeds never open.
struct DeafStore {
    inner: InMemoryStore,
}

impl DeafStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::for_dashboard(),
        }
    }
}

#[async_trait]
impl RemoteStore for DeafStore {
    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>> {
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: &str, row: Value, join: Option<JoinSpec>) -> StoreResult<Value> {
        self.inner.insert(table, row, join).await
    }

    async fn update(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        join: Option<JoinSpec>,
    ) -> StoreResult<Value> {
        self.inner.update(table, id, patch, join).await
    }

    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<()> {
        self.inner.delete(table, id).await
    }

    async fn count(&self, table: &str, filters: &[(String, Value)]) -> StoreResult<usize> {
        self.inner.count(table, filters).await
    }

    fn subscribe(&self, table: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        Err(StoreError::FeedUnavailable(table.to_string()))
    }
}

/// Holds every select until released, so a load can be caught in flight.
struct GatedStore {
    inner: InMemoryStore,
    gate: Notify,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::for_dashboard(),
            gate: Notify::new(),
        }
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>> {
        self.gate.notified().await;
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: &str, row: Value, join: Option<JoinSpec>) -> StoreResult<Value> {
        self.inner.insert(table, row, join).await
    }

    async fn update(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        join: Option<JoinSpec>,
    ) -> StoreResult<Value> {
        self.inner.update(table, id, patch, join).await
    }

    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<()> {
        self.inner.delete(table, id).await
    }

    async fn count(&self, table: &str, filters: &[(String, Value)]) -> StoreResult<usize> {
        self.inner.count(table, filters).await
    }

    fn subscribe(&self, table: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        self.inner.subscribe(table)
    }
}

async fn seed_area(store: &dyn RemoteStore, name: &str) {
    store
        .insert(
            tables::IRRIGATION_AREAS,
            json!({
                "name": name,
                "location": "Kecamatan Sumber",
                "total_area": 50.0,
                "status": "active",
                "lat": 0.0,
                "lng": 0.0,
            }),
            None,
        )
        .await
        .unwrap();
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn failed_reload_retains_previous_snapshot() {
    let store = Arc::new(FlakyStore::new());
    seed_area(store.as_ref(), "survivor").await;

    let client = SyncClient::with_options(
        Arc::clone(&store) as Arc<dyn RemoteStore>,
        SyncOptions::new().auto_subscribe(false),
    );
    let view = client.open::<Area>().await;
    let before = view.snapshot().await;
    assert_eq!(before.len(), 1);

    store.fail_reads.store(true, Ordering::SeqCst);
    let mut toasts = client.notifications().subscribe();

    let result = view.reload().await;
    assert!(matches!(result, Err(SyncError::Fetch { .. })));

    // exact same records, still readable
    assert_eq!(view.snapshot().await, before);
    assert!(view.last_error().await.is_some());
    assert!(!view.is_loading().await);

    let toast = toasts.recv().await.unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message, "Failed to load area data");

    // recovery clears the error
    store.fail_reads.store(false, Ordering::SeqCst);
    view.reload().await.unwrap();
    assert!(view.last_error().await.is_none());
}

#[tokio::test]
async fn failed_create_leaves_mirror_unchanged_and_notifies() {
    let store = Arc::new(FlakyStore::new());
    seed_area(store.as_ref(), "existing").await;

    let client = SyncClient::with_options(
        Arc::clone(&store) as Arc<dyn RemoteStore>,
        SyncOptions::new().auto_subscribe(false),
    );
    let view = client.open::<Area>().await;
    store.fail_writes.store(true, Ordering::SeqCst);
    let mut toasts = client.notifications().subscribe();

    let result = view
        .create(AreaDraft::new("Daerah Baru", "Hilir", 33.0))
        .await;

    assert!(matches!(result, Err(SyncError::Write { .. })));
    let snapshot = view.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].name, "existing");
    assert_eq!(
        toasts.recv().await.unwrap().message,
        "Failed to create area"
    );
}

#[tokio::test]
async fn dead_change_feed_degrades_to_fetch_on_open() {
    let store = Arc::new(DeafStore::new());
    seed_area(store.as_ref(), "initial").await;

    let client = SyncClient::new(Arc::clone(&store) as Arc<dyn RemoteStore>);
    let mut toasts = client.notifications().subscribe();
    let view = client.open::<Area>().await;

    // the initial fetch still happened
    assert_eq!(view.snapshot().await.len(), 1);
    assert!(!view.is_live());

    let toast = toasts.recv().await.unwrap();
    assert_eq!(toast.kind, NotificationKind::Warning);
    assert_eq!(toast.message, "Live updates unavailable for area data");

    // writes still work and still land in the mirror
    view.create(AreaDraft::new("Daerah Baru", "Hilir", 33.0))
        .await
        .unwrap();
    assert_eq!(view.snapshot().await.len(), 2);
}

#[tokio::test]
async fn detached_mirror_discards_in_flight_load() {
    let store = Arc::new(GatedStore::new());
    seed_area(store.as_ref(), "never seen").await;

    let mirror: Arc<EntityMirror<Area>> =
        Arc::new(EntityMirror::new(Arc::clone(&store) as Arc<dyn RemoteStore>));

    let loading = {
        let mirror = Arc::clone(&mirror);
        tokio::spawn(async move { mirror.load().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(mirror.is_loading().await);

    // the owner tears down while the fetch is still blocked in the store
    mirror.detach();
    store.gate.notify_one();
    loading.await.unwrap().unwrap();

    assert!(mirror.snapshot().await.is_empty());
    assert!(!mirror.is_loading().await);
}

#[tokio::test]
async fn change_during_initial_load_still_reaches_the_view() {
    let store = Arc::new(GatedStore::new());
    let client = Arc::new(SyncClient::new(Arc::clone(&store) as Arc<dyn RemoteStore>));

    let opening = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.open::<Area>().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // committed while the initial fetch is suspended in the store
    seed_area(store.as_ref(), "during load").await;

    // let the initial fetch and any push-triggered reload through
    let releaser = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            loop {
                store.gate.notify_one();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };
    let view = opening.await.unwrap();

    let mut arrived = false;
    for _ in 0..100 {
        if view.len().await == 1 {
            arrived = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    releaser.abort();
    assert!(arrived, "change committed during the initial load was lost");
    assert_eq!(view.snapshot().await[0].name, "during load");
}

#[tokio::test]
async fn closed_subscription_stops_reloading() {
    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::for_dashboard());
    let mirror: Arc<EntityMirror<Area>> = Arc::new(EntityMirror::new(Arc::clone(&store)));
    let subscription = SubscriptionManager::attach(&store, Arc::clone(&mirror)).unwrap();

    seed_area(store.as_ref(), "while live").await;
    let mut arrived = false;
    for _ in 0..100 {
        if mirror.len().await == 1 {
            arrived = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(arrived);

    subscription.close();
    mirror.detach();
    seed_area(store.as_ref(), "after close").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(mirror.len().await, 1);
    assert_eq!(mirror.snapshot().await[0].name, "while live");
}

#[tokio::test]
async fn decode_failure_keeps_snapshot_and_reports() {
    let store = Arc::new(InMemoryStore::for_dashboard());
    seed_area(store.as_ref(), "good row").await;

    let mirror: Arc<EntityMirror<Area>> =
        Arc::new(EntityMirror::new(Arc::clone(&store) as Arc<dyn RemoteStore>));
    mirror.load().await.unwrap();
    assert_eq!(mirror.len().await, 1);

    // a row the Area type cannot decode: status outside the enum
    store
        .insert(
            tables::IRRIGATION_AREAS,
            json!({
                "name": "bad row",
                "location": "Hulu",
                "total_area": 1.0,
                "status": "flooded",
                "lat": 0.0,
                "lng": 0.0,
            }),
            None,
        )
        .await
        .unwrap();

    let result = mirror.load().await;
    assert!(matches!(result, Err(SyncError::Decode { .. })));
    // never partially replaced
    assert_eq!(mirror.len().await, 1);
    assert_eq!(mirror.snapshot().await[0].name, "good row");
    assert!(mirror.last_error().await.is_some());
}
