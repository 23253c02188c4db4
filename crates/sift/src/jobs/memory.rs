//! Memory: in-process event store.
//!
//! Evaluates [`Filter`]s directly against a vector of records. Used for
//! small bundles and as the store double in tests.

use std::collections::BTreeSet;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::filter::{Field, Filter};
use super::model::EventRecord;
use super::store::{EventStore, SortOrder, StoreError, StoreFuture};

/// Records scanned between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1024;

#[derive(Default)]
struct Inner {
    records: Vec<EventRecord>,
    offline: Option<String>,
}

#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: EventRecord) {
        self.inner.write().await.records.push(record);
    }

    pub async fn insert_many(&self, records: impl IntoIterator<Item = EventRecord>) {
        self.inner.write().await.records.extend(records);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    /// Make every query fail with [`StoreError::Unavailable`] until cleared.
    pub async fn set_offline(&self, reason: Option<String>) {
        self.inner.write().await.offline = reason;
    }
}

fn scan<'r>(
    records: &'r [EventRecord],
    filter: &Filter,
    cancel: &CancellationToken,
) -> Result<Vec<&'r EventRecord>, StoreError> {
    let mut matched = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if filter.matches(record) {
            matched.push(record);
        }
    }
    Ok(matched)
}

impl EventStore for MemoryEventStore {
    fn find<'a>(
        &'a self,
        filter: &'a Filter,
        order: SortOrder,
        cancel: &'a CancellationToken,
    ) -> StoreFuture<'a, Vec<EventRecord>> {
        Box::pin(async move {
            let state = self.inner.read().await;
            if let Some(reason) = &state.offline {
                return Err(StoreError::Unavailable(reason.clone()));
            }

            let mut found: Vec<EventRecord> = scan(&state.records, filter, cancel)?
                .into_iter()
                .cloned()
                .collect();
            if order == SortOrder::TimestampAscending {
                // Stable: equal timestamps keep insertion order.
                found.sort_by_key(|r| r.timestamp);
            }
            Ok(found)
        })
    }

    fn distinct<'a>(
        &'a self,
        field: Field,
        filter: &'a Filter,
        cancel: &'a CancellationToken,
    ) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move {
            let state = self.inner.read().await;
            if let Some(reason) = &state.offline {
                return Err(StoreError::Unavailable(reason.clone()));
            }

            let values: BTreeSet<&str> = scan(&state.records, filter, cancel)?
                .into_iter()
                .filter_map(|record| field.value(record))
                .collect();
            Ok(values.into_iter().map(str::to_string).collect())
        })
    }
}
