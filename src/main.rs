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

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use twinkv::config::Config;
use twinkv::handler::BaseHandler;
use twinkv::observability::tracing_setup;
use twinkv::server::HttpConnectionManager;
use twinkv::store::{self, Engine};

#[derive(Parser, Debug)]
#[command(name = "twinkv")]
#[command(about = "Bounded in-memory key/value store over HTTP", long_about = None)]
struct Args {
    /// Concurrency engine to use (channel, rwmutex)
    #[arg(long)]
    concurrency: Option<Engine>,

    /// Maximum number of keys the store may hold
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_size: Option<u64>,

    /// Address to listen on (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    // Command line args override config file
    if let Some(engine) = args.concurrency {
        cfg.store.engine = engine;
    }
    if let Some(max_size) = args.max_size {
        cfg.store.max_size = usize::try_from(max_size)?;
    }
    if let Some(listen) = args.listen {
        cfg.listen_addr = listen;
    }
    cfg.validate()?;

    tracing_setup::init_tracing(cfg.log.format, &cfg.log.level);

    let addr: SocketAddr = cfg.listen_addr.parse()?;
    let kv = store::open(
        cfg.store.engine,
        cfg.store.max_size,
        cfg.store.mailbox_capacity,
    );

    let handler = BaseHandler::new(kv.clone())
        .with_request_timeout(Duration::from_millis(cfg.request_timeout_ms));
    let server = HttpConnectionManager::new(handler);
    let listener = HttpConnectionManager::bind(addr)?;

    tracing::info!(
        engine = %cfg.store.engine,
        max_size = cfg.store.max_size,
        "twinkv listening on {}",
        addr
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
        tracing::warn!("ctrl-c received, shutting down");
    };

    if let Err(e) = server.serve(listener, shutdown).await {
        tracing::error!("server exited with error: {e}");
    }

    kv.shutdown().await;
    tracing::info!("store stopped");
    Ok(())
}
