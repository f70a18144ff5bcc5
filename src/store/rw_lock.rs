use crate::observability::metrics as prom_metrics;
use crate::store::common::{self, Entries};
use crate::store::{Engine, KvStore, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

/// Shared-state engine.
///
/// One `RwLock` guards the whole map: `get` and `len` share it, mutations take
/// it exclusively. Waiting for the lock is the only suspension point and it
/// races the caller's token. Guards are never held across an await.
#[derive(Debug, Clone)]
pub struct RwLockStore {
    max_size: usize,
    entries: Arc<RwLock<Entries>>,
}

impl RwLockStore {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: Arc::new(RwLock::new(Entries::new())),
        }
    }

    async fn read(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RwLockReadGuard<'_, Entries>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let wait = Instant::now();
        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            guard = self.entries.read() => guard,
        };
        prom_metrics::record_lock_wait("read", wait.elapsed().as_secs_f64());
        Ok(guard)
    }

    async fn write(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RwLockWriteGuard<'_, Entries>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let wait = Instant::now();
        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            guard = self.entries.write() => guard,
        };
        prom_metrics::record_lock_wait("write", wait.elapsed().as_secs_f64());
        Ok(guard)
    }
}

#[async_trait]
impl KvStore for RwLockStore {
    async fn delete(&self, cancel: &CancellationToken, key: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let res = match self.write(cancel).await {
            Ok(mut entries) => {
                let res = common::delete(&mut entries, key);
                prom_metrics::set_entries(Engine::RwMutex.as_str(), entries.len());
                res
            }
            Err(e) => Err(e),
        };
        prom_metrics::record_store_op(Engine::RwMutex.as_str(), "delete", &res, start);
        res
    }

    async fn get(&self, cancel: &CancellationToken, key: &str) -> Result<String, StoreError> {
        let start = Instant::now();
        let res = match self.read(cancel).await {
            Ok(entries) => common::get(&entries, key),
            Err(e) => Err(e),
        };
        prom_metrics::record_store_op(Engine::RwMutex.as_str(), "get", &res, start);
        res
    }

    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: String,
    ) -> Result<(), StoreError> {
        let start = Instant::now();
        let res = match self.write(cancel).await {
            Ok(mut entries) => {
                let res = common::set(&mut entries, self.max_size, key, value);
                prom_metrics::set_entries(Engine::RwMutex.as_str(), entries.len());
                res
            }
            Err(e) => Err(e),
        };
        prom_metrics::record_store_op(Engine::RwMutex.as_str(), "set", &res, start);
        res
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: String,
    ) -> Result<(), StoreError> {
        let start = Instant::now();
        let res = match self.write(cancel).await {
            Ok(mut entries) => common::update(&mut entries, key, value),
            Err(e) => Err(e),
        };
        prom_metrics::record_store_op(Engine::RwMutex.as_str(), "update", &res, start);
        res
    }

    async fn len(&self, cancel: &CancellationToken) -> Result<usize, StoreError> {
        let start = Instant::now();
        let res = self.read(cancel).await.map(|entries| entries.len());
        prom_metrics::record_store_op(Engine::RwMutex.as_str(), "len", &res, start);
        res
    }

    fn engine(&self) -> Engine {
        Engine::RwMutex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn pending_writer_is_cancelled_without_mutation() {
        let store = RwLockStore::new(4);
        let held = store.entries.clone();
        let guard = held.read().await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let writer = {
            let store = store.clone();
            tokio::spawn(async move { store.set(&cancel, "k", "v".into()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
        let res = writer.await.unwrap();
        drop(guard);

        assert_eq!(res, Err(StoreError::Cancelled));
        let fresh = CancellationToken::new();
        assert_eq!(store.len(&fresh).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn readers_share_the_lock() {
        let store = RwLockStore::new(4);
        let cancel = CancellationToken::new();
        store.set(&cancel, "k", "v".into()).await.unwrap();

        // A read guard held here must not block other readers.
        let _held = store.entries.read().await;
        let res = tokio::time::timeout(Duration::from_secs(1), store.get(&cancel, "k")).await;
        assert_eq!(res.unwrap().unwrap(), "v");
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let store = RwLockStore::new(4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(store.get(&cancel, "k").await, Err(StoreError::Cancelled));
        assert_eq!(store.delete(&cancel, "k").await, Err(StoreError::Cancelled));
    }
}
