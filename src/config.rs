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

use serde::Deserialize;

use crate::observability::tracing_setup::OutputFormat;
use crate::store::{Engine, DEFAULT_MAX_SIZE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listen address, e.g. "127.0.0.1:3000"
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Per-request deadline in milliseconds; the store call is cancelled when
    /// it passes (0 = no deadline)
    #[serde(default)]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// engine can be "channel" or "rwmutex"
    #[serde(default = "default_engine")]
    pub engine: Engine,
    /// maximum number of distinct keys
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// commands that may queue for the channel engine's worker
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            max_size: default_max_size(),
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// level for this crate when RUST_LOG / LOG_LEVEL are unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: OutputFormat::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_ms: 0,
            store: StoreConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn from_path(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let cfg: Config = toml::from_str(s)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.store.max_size == 0 {
            return Err("store.max_size must be at least 1".to_string());
        }
        if self.store.mailbox_capacity == 0 {
            return Err("store.mailbox_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_engine() -> Engine {
    Engine::Channel
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_mailbox_capacity() -> usize {
    1 // closest to a rendezvous handoff
}

fn default_log_level() -> String {
    "info".to_string()
}
