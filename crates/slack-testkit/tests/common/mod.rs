//! Shared setup for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary, honoring RUST_LOG.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

/// Serve an application under test on an ephemeral port.
///
/// The server runs for the rest of the test process; tests only need the
/// address to point the harness at.
pub async fn spawn_app(router: axum::Router) -> SocketAddr {
    let handle = axum_server::Handle::new();
    let server = axum_server::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .handle(handle.clone())
        .serve(router.into_make_service());
    tokio::spawn(server);
    handle
        .listening()
        .await
        .expect("application under test failed to bind")
}
