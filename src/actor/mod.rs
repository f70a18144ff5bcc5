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

//! Actor-based engine
//!
//! A single worker task owns the map and every caller talks to it through a
//! bounded mailbox with a oneshot reply per command. The worker processes
//! commands one at a time, so the map is never shared.

pub mod backend;
pub mod kv_actor;
pub mod messages;
pub mod metrics;

pub use backend::ActorKvStore;
pub use kv_actor::KvStoreActor;
pub use messages::KvCommand;
pub use metrics::Metrics;
