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

//! Key/value store actor
//!
//! This actor owns the map. It processes commands sequentially, so the map
//! needs no lock. Nothing outside the actor ever sees the map.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::actor::messages::KvCommand;
use crate::actor::metrics::Metrics;
use crate::observability::metrics as prom_metrics;
use crate::store::common::{self, Entries};
use crate::store::{Engine, StoreError};

/// Worker owning the entries of one actor-backed store.
pub struct KvStoreActor {
    /// Capacity bound (immutable)
    max_size: usize,

    entries: Entries,

    /// Incoming command channel
    rx: mpsc::Receiver<KvCommand>,

    /// Fired by the owning handle to stop the worker
    shutdown: CancellationToken,

    metrics: Arc<Metrics>,
}

impl KvStoreActor {
    pub fn new(
        max_size: usize,
        rx: mpsc::Receiver<KvCommand>,
        shutdown: CancellationToken,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            max_size,
            entries: Entries::new(),
            rx,
            shutdown,
            metrics,
        }
    }

    /// Run the actor event loop
    ///
    /// Stops when the shutdown token fires or every sender is gone. Commands
    /// still queued at that point are answered with `Closed`.
    pub async fn run(mut self) {
        tracing::info!(max_size = self.max_size, "KvStoreActor started");

        loop {
            let cmd = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
            };
            self.metrics.inc_message_received();
            self.handle(cmd);
        }

        self.rx.close();
        let mut rejected = 0usize;
        while let Ok(cmd) = self.rx.try_recv() {
            self.metrics.inc_message_rejected();
            cmd.reject(StoreError::Closed);
            rejected += 1;
        }

        tracing::info!(
            entries = self.entries.len(),
            rejected,
            "KvStoreActor stopped"
        );
    }

    fn handle(&mut self, cmd: KvCommand) {
        if cmd.is_abandoned() {
            self.metrics.inc_message_abandoned();
            tracing::debug!(op = cmd.operation(), "skipping abandoned command");
            cmd.reject(StoreError::Cancelled);
            return;
        }

        let op_start = Instant::now();
        match cmd {
            KvCommand::Delete { key, reply, .. } => {
                let res = common::delete(&mut self.entries, &key);
                prom_metrics::record_store_op(Engine::Channel.as_str(), "delete", &res, op_start);
                let _ = reply.send(res);
            }

            KvCommand::Get { key, reply, .. } => {
                let res = common::get(&self.entries, &key);
                prom_metrics::record_store_op(Engine::Channel.as_str(), "get", &res, op_start);
                let _ = reply.send(res);
            }

            KvCommand::Set { key, value, reply, .. } => {
                let res = common::set(&mut self.entries, self.max_size, &key, value);
                if let Err(e) = &res {
                    tracing::debug!(%key, error = %e, "set rejected");
                }
                prom_metrics::record_store_op(Engine::Channel.as_str(), "set", &res, op_start);
                let _ = reply.send(res);
            }

            KvCommand::Update { key, value, reply, .. } => {
                let res = common::update(&mut self.entries, &key, value);
                prom_metrics::record_store_op(Engine::Channel.as_str(), "update", &res, op_start);
                let _ = reply.send(res);
            }

            KvCommand::Len { reply, .. } => {
                let res = Ok(self.entries.len());
                prom_metrics::record_store_op(Engine::Channel.as_str(), "len", &res, op_start);
                let _ = reply.send(res);
            }
        }
        prom_metrics::set_entries(Engine::Channel.as_str(), self.entries.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn actor(
        max_size: usize,
    ) -> (
        KvStoreActor,
        mpsc::Sender<KvCommand>,
        CancellationToken,
        Arc<Metrics>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let metrics = Arc::new(Metrics::new());
        let actor = KvStoreActor::new(max_size, rx, shutdown.clone(), metrics.clone());
        (actor, tx, shutdown, metrics)
    }

    #[tokio::test]
    async fn abandoned_commands_are_skipped() {
        let (actor, tx, _shutdown, metrics) = actor(4);

        let (gone_tx, gone_rx) = oneshot::channel();
        drop(gone_rx);
        tx.send(KvCommand::Set {
            key: "ghost".into(),
            value: "v".into(),
            cancel: CancellationToken::new(),
            reply: gone_tx,
        })
        .await
        .unwrap();

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let (late_tx, late_rx) = oneshot::channel();
        tx.send(KvCommand::Set {
            key: "late".into(),
            value: "v".into(),
            cancel: cancelled,
            reply: late_tx,
        })
        .await
        .unwrap();

        let (len_tx, len_rx) = oneshot::channel();
        tx.send(KvCommand::Len {
            cancel: CancellationToken::new(),
            reply: len_tx,
        })
        .await
        .unwrap();
        drop(tx);

        actor.run().await;

        assert_eq!(late_rx.await.unwrap(), Err(StoreError::Cancelled));
        assert_eq!(len_rx.await.unwrap(), Ok(0));
        assert_eq!(metrics.get_messages_abandoned(), 2);
        assert_eq!(metrics.get_messages_received(), 3);
    }

    #[tokio::test]
    async fn shutdown_rejects_queued_commands() {
        let (actor, tx, shutdown, metrics) = actor(4);

        let mut replies = Vec::new();
        for i in 0..3 {
            let (reply, rx) = oneshot::channel();
            tx.send(KvCommand::Set {
                key: format!("k{i}"),
                value: "v".into(),
                cancel: CancellationToken::new(),
                reply,
            })
            .await
            .unwrap();
            replies.push(rx);
        }
        shutdown.cancel();

        actor.run().await;

        for rx in replies {
            assert_eq!(rx.await.unwrap(), Err(StoreError::Closed));
        }
        assert_eq!(metrics.get_messages_rejected(), 3);
        assert!(tx.is_closed());
    }
}
