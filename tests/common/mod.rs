//! Shared utilities for integration testing.

use edge_gateway::{GatewayConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Default test configuration: fast saga polling, fixed signing secret.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.signing_secret = "integration-test-secret".into();
    config.saga.poll_interval_ms = 25;
    config.saga.max_poll_attempts = 10;
    config
}

/// Start a gateway on an ephemeral port. The public URL is set to the
/// bound address so redirect rewrites and status URLs are assertable.
pub async fn spawn_gateway(mut config: GatewayConfig) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    config.listener.bind_address = addr.to_string();
    config.listener.public_url = format!("http://{}", addr);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).expect("test config must be valid");
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (format!("http://{}", addr), shutdown)
}

/// Client that does not follow redirects (so Location rewrites are visible).
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
