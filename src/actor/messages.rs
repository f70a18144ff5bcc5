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

//! Message types for actor communication
//!
//! Each command carries the caller's cancellation token and a oneshot reply
//! slot. The slot holds exactly one reply, so the worker never waits on a
//! caller to collect it.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::store::StoreError;

pub type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

/// Commands sent to the KvStoreActor
#[derive(Debug)]
pub enum KvCommand {
    /// Remove a key
    Delete {
        key: String,
        cancel: CancellationToken,
        reply: Reply<()>,
    },

    /// Read a key
    Get {
        key: String,
        cancel: CancellationToken,
        reply: Reply<String>,
    },

    /// Insert or overwrite a key
    Set {
        key: String,
        value: String,
        cancel: CancellationToken,
        reply: Reply<()>,
    },

    /// Overwrite an existing key
    Update {
        key: String,
        value: String,
        cancel: CancellationToken,
        reply: Reply<()>,
    },

    /// Count entries
    Len {
        cancel: CancellationToken,
        reply: Reply<usize>,
    },
}

impl KvCommand {
    pub fn operation(&self) -> &'static str {
        match self {
            KvCommand::Delete { .. } => "delete",
            KvCommand::Get { .. } => "get",
            KvCommand::Set { .. } => "set",
            KvCommand::Update { .. } => "update",
            KvCommand::Len { .. } => "len",
        }
    }

    /// True once the caller has stopped waiting for this command.
    pub fn is_abandoned(&self) -> bool {
        match self {
            KvCommand::Delete { cancel, reply, .. }
            | KvCommand::Set { cancel, reply, .. }
            | KvCommand::Update { cancel, reply, .. } => {
                cancel.is_cancelled() || reply.is_closed()
            }
            KvCommand::Get { cancel, reply, .. } => cancel.is_cancelled() || reply.is_closed(),
            KvCommand::Len { cancel, reply } => cancel.is_cancelled() || reply.is_closed(),
        }
    }

    /// Answers the command with `err` without running it.
    pub fn reject(self, err: StoreError) {
        match self {
            KvCommand::Delete { reply, .. }
            | KvCommand::Set { reply, .. }
            | KvCommand::Update { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            KvCommand::Get { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            KvCommand::Len { reply, .. } => {
                let _ = reply.send(Err(err));
            }
        }
    }
}
