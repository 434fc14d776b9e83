use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::{Result, SyncError};
use crate::entity::{Entity, flatten_join};
use crate::store::{RemoteStore, SelectQuery};

struct MirrorInner<E> {
    records: Vec<E>,
    loading: bool,
    last_error: Option<String>,
}

/// The authoritative local snapshot of one remote table.
///
/// A mirror holds at most one record per id, ordered newest first by the
/// entity's ordering key. `load` replaces the whole snapshot from the store;
/// the `apply_*` operations patch it with records the store has already
/// acknowledged. After `detach` the mirror ignores every further write, so a
/// reload still in flight when its owning view closes cannot touch state
/// nobody renders anymore.
pub struct EntityMirror<E: Entity> {
    store: Arc<dyn RemoteStore>,
    inner: RwLock<MirrorInner<E>>,
    detached: AtomicBool,
}

impl<E: Entity> EntityMirror<E> {
    /// Creates an empty mirror bound to a store. The first `load` populates it.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            inner: RwLock::new(MirrorInner {
                records: Vec::new(),
                loading: false,
                last_error: None,
            }),
            detached: AtomicBool::new(false),
        }
    }

    /// Replaces the snapshot with a full fetch, joined and ordered.
    ///
    /// On failure the previous snapshot is retained untouched; stale data
    /// stays available to the presentation layer while the error is
    /// reported. A decode failure is treated the same way: the snapshot is
    /// never partially replaced.
    pub async fn load(&self) -> Result<()> {
        if self.is_detached() {
            return Ok(());
        }
        self.inner.write().await.loading = true;

        let query = SelectQuery::new()
            .order_desc(E::ORDER_BY)
            .maybe_limit(E::FETCH_LIMIT)
            .maybe_join(E::JOIN);
        let fetched = self.store.select(E::TABLE, query).await;

        if self.is_detached() {
            debug!("discarding {} load result: mirror detached", E::TABLE);
            self.inner.write().await.loading = false;
            return Ok(());
        }

        let mut inner = self.inner.write().await;
        inner.loading = false;
        let rows = match fetched {
            Ok(rows) => rows,
            Err(source) => {
                let err = SyncError::Fetch {
                    entity: E::DISPLAY.to_string(),
                    source,
                };
                inner.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for mut row in rows {
            if let Some(spec) = E::JOIN {
                flatten_join(&mut row, spec);
            }
            match serde_json::from_value::<E>(row) {
                Ok(record) => records.push(record),
                Err(err) => {
                    let err = SyncError::Decode {
                        entity: E::DISPLAY.to_string(),
                        message: err.to_string(),
                    };
                    inner.last_error = Some(err.to_string());
                    return Err(err);
                }
            }
        }

        debug!("loaded {} rows into {} mirror", records.len(), E::TABLE);
        inner.records = records;
        inner.last_error = None;
        Ok(())
    }

    /// Returns the current ordered snapshot without any I/O.
    pub async fn snapshot(&self) -> Vec<E> {
        self.inner.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    /// True while a full fetch is in flight.
    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    /// The last load failure, cleared by the next successful load.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// Prepends an acknowledged record, replacing any copy with the same id.
    ///
    /// The id-keyed replace is what keeps a record applied here and also
    /// delivered by a push-triggered reload from appearing twice.
    pub async fn apply_created(&self, record: E) {
        if self.is_detached() {
            return;
        }
        let mut inner = self.inner.write().await;
        let id = record.id();
        inner.records.retain(|existing| existing.id() != id);
        inner.records.insert(0, record);
    }

    /// Replaces the record with the given id in place, preserving its
    /// position. A miss is a no-op: the push may reference a record that was
    /// already dropped from the mirrored window. When the replacement
    /// carries a different id than the slot it lands in, any other copy
    /// with that id is dropped, keeping ids unique.
    pub async fn apply_updated(&self, id: Uuid, record: E) {
        if self.is_detached() {
            return;
        }
        let mut inner = self.inner.write().await;
        let new_id = record.id();
        if let Some(pos) = inner.records.iter().position(|existing| existing.id() == id) {
            inner.records[pos] = record;
            if new_id != id {
                let mut index = 0;
                inner.records.retain(|existing| {
                    let keep = index == pos || existing.id() != new_id;
                    index += 1;
                    keep
                });
            }
        }
    }

    /// Removes the record with the given id. Idempotent.
    pub async fn apply_deleted(&self, id: Uuid) {
        if self.is_detached() {
            return;
        }
        let mut inner = self.inner.write().await;
        inner.records.retain(|existing| existing.id() != id);
    }

    /// Marks the mirror as torn down. All subsequent writes, including
    /// results of loads already in flight, are discarded.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub(crate) fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }
}
