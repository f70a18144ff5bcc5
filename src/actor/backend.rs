// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! ActorKvStore - KvStore implementation using the actor model

use std::sync::Arc;
use std::time::Instant;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::actor::kv_actor::KvStoreActor;
use crate::actor::messages::{KvCommand, Reply};
use crate::actor::metrics::Metrics;
use crate::observability::metrics as prom_metrics;
use crate::store::{Engine, KvStore, StoreError};

/// Handle to a running KvStoreActor.
///
/// `start` spawns the worker and `shutdown` stops it and waits for it to
/// finish. Dropping the handle without calling `shutdown` also ends the
/// worker, since its mailbox closes.
pub struct ActorKvStore {
    tx: mpsc::Sender<KvCommand>,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<Metrics>,
}

impl ActorKvStore {
    /// Spawn a worker owning an empty map bounded by `max_size`.
    ///
    /// `mailbox_capacity` is the number of commands that may wait for the
    /// worker; senders beyond that wait for a free slot. Zero is treated as one.
    pub fn start(max_size: usize, mailbox_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
        let shutdown = CancellationToken::new();
        let metrics = Arc::new(Metrics::new());

        let actor = KvStoreActor::new(max_size, rx, shutdown.clone(), metrics.clone());
        let worker = tokio::spawn(actor.run());

        Self {
            tx,
            shutdown,
            worker: Mutex::new(Some(worker)),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Send a command to the worker and wait for its reply.
    ///
    /// Both the send and the reply wait race `cancel`. A reply that is already
    /// available wins over a cancellation that fires at the same time.
    /// `Cancelled` and `Closed` outcomes are recorded here, as the caller sees
    /// them; the worker records the outcomes of the operations it runs.
    async fn send_command<T>(
        &self,
        cancel: &CancellationToken,
        make_command: impl FnOnce(CancellationToken, Reply<T>) -> KvCommand,
    ) -> Result<T, StoreError> {
        let start = Instant::now();
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = make_command(cancel.clone(), reply_tx);
        let operation = cmd.operation();

        let res = self.deliver(cancel, cmd, reply_rx).await;
        if matches!(res, Err(StoreError::Cancelled | StoreError::Closed)) {
            prom_metrics::record_store_op(Engine::Channel.as_str(), operation, &res, start);
        }
        res
    }

    async fn deliver<T>(
        &self,
        cancel: &CancellationToken,
        cmd: KvCommand,
        mut reply_rx: oneshot::Receiver<Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            sent = self.tx.send(cmd) => sent.map_err(|_| StoreError::Closed)?,
        }

        tokio::select! {
            biased;
            reply = &mut reply_rx => reply.unwrap_or(Err(StoreError::Closed)),
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
        }
    }
}

#[async_trait]
impl KvStore for ActorKvStore {
    async fn delete(&self, cancel: &CancellationToken, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.send_command(cancel, |cancel, reply| KvCommand::Delete { key, cancel, reply })
            .await
    }

    async fn get(&self, cancel: &CancellationToken, key: &str) -> Result<String, StoreError> {
        let key = key.to_string();
        self.send_command(cancel, |cancel, reply| KvCommand::Get { key, cancel, reply })
            .await
    }

    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: String,
    ) -> Result<(), StoreError> {
        let key = key.to_string();
        self.send_command(cancel, |cancel, reply| KvCommand::Set {
            key,
            value,
            cancel,
            reply,
        })
        .await
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        key: &str,
        value: String,
    ) -> Result<(), StoreError> {
        let key = key.to_string();
        self.send_command(cancel, |cancel, reply| KvCommand::Update {
            key,
            value,
            cancel,
            reply,
        })
        .await
    }

    async fn len(&self, cancel: &CancellationToken) -> Result<usize, StoreError> {
        self.send_command(cancel, |cancel, reply| KvCommand::Len { cancel, reply })
            .await
    }

    fn engine(&self) -> Engine {
        Engine::Channel
    }

    async fn shutdown(&self) {
        self.shutdown.cancel();
        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("KvStoreActor task failed: {e}");
            }
        }
    }
}
