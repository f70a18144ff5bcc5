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

//! Lock-free worker counters
//!
//! Written by the worker, read through the handle, updated with relaxed
//! atomics.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    pub messages_received: AtomicU64,
    /// Commands the worker skipped because the caller had already gone.
    pub messages_abandoned: AtomicU64,
    /// Commands answered with `Closed` during shutdown.
    pub messages_rejected: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_message_abandoned(&self) {
        self.messages_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_message_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn get_messages_abandoned(&self) -> u64 {
        self.messages_abandoned.load(Ordering::Relaxed)
    }

    pub fn get_messages_rejected(&self) -> u64 {
        self.messages_rejected.load(Ordering::Relaxed)
    }
}
