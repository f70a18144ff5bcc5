use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::actor::ActorKvStore;

pub mod common;
pub mod rw_lock;

pub use rw_lock::RwLockStore;

/// Default capacity bound when none is configured.
pub const DEFAULT_MAX_SIZE: usize = 50_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("maximum capacity ({max_size} keys)")]
    MaxCapacity { max_size: usize },
    #[error("operation cancelled before completion")]
    Cancelled,
    #[error("store is shut down")]
    Closed,
}

/// Concurrency engine backing a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Single worker task owning the map, fed through a mailbox.
    Channel,
    /// Shared map behind a reader/writer lock.
    RwMutex,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Channel => "channel",
            Engine::RwMutex => "rwmutex",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "channel" => Ok(Engine::Channel),
            "rwmutex" => Ok(Engine::RwMutex),
            other => Err(format!(
                "invalid concurrency engine '{other}' (expected channel or rwmutex)"
            )),
        }
    }
}

/// Bounded, concurrent key/value store.
///
/// Every operation takes the caller's cancellation token. When the token fires
/// before an outcome is known the call returns [`StoreError::Cancelled`]; for
/// mutations that means the outcome is unknown, not that nothing happened.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Removes `key`. Fails with `NotFound` if it is absent.
    async fn delete(&self, cancel: &CancellationToken, key: &str) -> Result<(), StoreError>;

    /// Returns the current value of `key`. Fails with `NotFound` if it is absent.
    async fn get(&self, cancel: &CancellationToken, key: &str) -> Result<String, StoreError>;

    /// Inserts or overwrites `key`. Fails with `MaxCapacity` if a new key
    /// would exceed the bound; overwrites never fail on capacity.
    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: String,
    ) -> Result<(), StoreError>;

    /// Replaces the value of an existing `key`. Fails with `NotFound` otherwise.
    async fn update(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: String,
    ) -> Result<(), StoreError>;

    /// Number of entries currently stored.
    async fn len(&self, cancel: &CancellationToken) -> Result<usize, StoreError>;

    fn engine(&self) -> Engine;

    /// Stops the engine. Later calls fail with `Closed` where the engine has
    /// anything to stop.
    async fn shutdown(&self) {}
}

/// Builds a store backed by `engine`.
///
/// The actor engine spawns its worker, so this must run inside a Tokio runtime.
pub fn open(engine: Engine, max_size: usize, mailbox_capacity: usize) -> Arc<dyn KvStore> {
    tracing::info!(%engine, max_size, "opening kv store");
    match engine {
        Engine::Channel => Arc::new(ActorKvStore::start(max_size, mailbox_capacity)),
        Engine::RwMutex => Arc::new(RwLockStore::new(max_size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_names_parse() {
        assert_eq!("channel".parse::<Engine>(), Ok(Engine::Channel));
        assert_eq!("RWMUTEX".parse::<Engine>(), Ok(Engine::RwMutex));
        assert!("mutex".parse::<Engine>().is_err());
        assert_eq!(Engine::RwMutex.to_string(), "rwmutex");
    }

    #[test]
    fn error_messages() {
        assert_eq!(StoreError::NotFound("a".into()).to_string(), "not found: a");
        assert_eq!(
            StoreError::MaxCapacity { max_size: 2 }.to_string(),
            "maximum capacity (2 keys)"
        );
    }

    #[tokio::test]
    async fn open_selects_engine() {
        let actor = open(Engine::Channel, 4, 1);
        let locked = open(Engine::RwMutex, 4, 1);
        assert_eq!(actor.engine(), Engine::Channel);
        assert_eq!(locked.engine(), Engine::RwMutex);
        actor.shutdown().await;
        locked.shutdown().await;
    }
}
