//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use podium::outbound::persistence::DbPool;
use podium::settings::RuntimeConfig;

/// Everything needed to assemble the HTTP server.
pub struct ServerConfig {
    pub(crate) runtime: RuntimeConfig,
    pub(crate) db_pool: DbPool,
}

impl ServerConfig {
    /// Construct a server configuration from validated settings and a pool.
    #[must_use]
    pub fn new(runtime: RuntimeConfig, db_pool: DbPool) -> Self {
        Self { runtime, db_pool }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.runtime.bind_addr
    }

    /// Whether the maintenance scheduler runs in this process.
    #[must_use]
    pub fn scheduler_enabled(&self) -> bool {
        self.runtime.scheduler_enabled
    }
}
