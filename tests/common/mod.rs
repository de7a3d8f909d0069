//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a config, and a
//! full [`AppContext`] with a known API key. The `with_server` constructors
//! start Axum on a random port with connect info so the gate sees a real
//! peer address.

#![allow(dead_code)]

use std::net::SocketAddr;

use sg_core::config::Config;
use sg_db::pool::{init_memory_pool, DbPool};
use sg_server::context::AppContext;
use sg_server::router::build_router;

/// API key stored in every harness.
pub const TEST_KEY: &str = "TestKey0123456789abcdefghijklmno";

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory DB.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration and in-memory DB.
    pub fn with_config(config: Config) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone()).expect("failed to build context");
        ctx.gate
            .ensure_key(Some(TEST_KEY))
            .expect("failed to store test key");
        Self { ctx, db }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> sg_db::pool::PooledConnection {
        sg_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }
}

/// Full URL for `path` on a test server.
pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}
