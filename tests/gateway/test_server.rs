use ed25519_dalek::Signer;
use gamekeeper::config::Config;
use gamekeeper::transport::gateway::run_gateway_with_listener;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::harness::signing_key;

pub const TIMESTAMP: &str = "1714566600";

pub struct GatewayTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl GatewayTestServer {
    pub async fn start(config: Config) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral gateway listener should expose local address")
            .port();

        let host = "127.0.0.1".to_string();
        let config = Arc::new(config);
        let handle =
            tokio::spawn(async move { run_gateway_with_listener(&host, listener, config).await });

        wait_until_gateway_ready(port).await;

        Self { port, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }

    /// POST a body to `/interactions` signed with the test key.
    pub async fn post_signed(&self, body: &serde_json::Value) -> reqwest::Response {
        let body = body.to_string();
        let mut message = TIMESTAMP.as_bytes().to_vec();
        message.extend_from_slice(body.as_bytes());
        let signature = hex::encode(signing_key().sign(&message).to_bytes());

        reqwest::Client::new()
            .post(self.url("/interactions"))
            .header("content-type", "application/json")
            .header("x-signature-ed25519", signature)
            .header("x-signature-timestamp", TIMESTAMP)
            .body(body)
            .send()
            .await
            .expect("interaction request should complete")
    }
}

impl Drop for GatewayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_gateway_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("gateway did not become ready on port {port}");
}

/// Poll the mock server until it has seen `count` requests.
pub async fn wait_for_requests(server: &wiremock::MockServer, count: usize) -> usize {
    for _ in 0..100 {
        let seen = server.received_requests().await.map_or(0, |r| r.len());
        if seen >= count {
            return seen;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    server.received_requests().await.map_or(0, |r| r.len())
}
