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

use crate::handler::BaseHandler;
use crate::http::KvHttpHandler;
use std::future::Future;
use std::net::SocketAddr;

/// HTTP connection manager using Axum.
#[derive(Clone)]
pub struct HttpConnectionManager {
    handler: KvHttpHandler,
}

impl HttpConnectionManager {
    pub fn new(handler: BaseHandler) -> Self {
        Self {
            handler: KvHttpHandler::new(handler),
        }
    }

    /// Bind `addr` with TCP_NODELAY and SO_REUSEADDR set.
    pub fn bind(addr: SocketAddr) -> std::io::Result<tokio::net::TcpListener> {
        use socket2::{Domain, Protocol, Socket, Type};

        let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

        socket.set_nodelay(true)?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;

        socket.bind(&addr.into())?;
        socket.listen(1024)?;

        tokio::net::TcpListener::from_std(socket.into())
    }

    /// Serve until `shutdown` resolves, then let in-flight requests finish.
    pub async fn serve(
        &self,
        listener: tokio::net::TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app = self.handler.clone().router();
        tracing::info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
