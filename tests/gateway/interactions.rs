use crate::harness::{
    mount_describe, mount_initial_reply, mount_update, mount_update_reply, test_config,
};
use crate::test_server::{GatewayTestServer, TIMESTAMP, wait_for_requests};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::MockServer;

fn command(id: &str, token: &str, sub_command: &str) -> Value {
    json!({
        "type": 2,
        "id": id,
        "token": token,
        "application_id": crate::harness::APP_ID,
        "data": {
            "name": "gameserver",
            "type": 1,
            "options": [{"name": sub_command, "type": 1}]
        }
    })
}

#[tokio::test]
async fn health_is_public() {
    let discord = MockServer::start().await;
    let gateway = GatewayTestServer::start(test_config(&discord)).await;

    let body: Value = reqwest::get(gateway.url("/health"))
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health response should be json");
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn ping_gets_pong() {
    let discord = MockServer::start().await;
    let gateway = GatewayTestServer::start(test_config(&discord)).await;

    let response = gateway.post_signed(&json!({"type": 1})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("pong should be json");
    assert_eq!(body, json!({"type": 1}));
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let discord = MockServer::start().await;
    let gateway = GatewayTestServer::start(test_config(&discord)).await;

    let response = reqwest::Client::new()
        .post(gateway.url("/interactions"))
        .header("x-signature-ed25519", "00".repeat(64))
        .header("x-signature-timestamp", TIMESTAMP)
        .body(json!({"type": 1}).to_string())
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.text().await.unwrap_or_default(),
        "Invalid request signature"
    );
}

#[tokio::test]
async fn start_command_runs_workflow_in_background() {
    let discord = MockServer::start().await;
    mount_initial_reply(&discord, "Starting the server...", 1).await;
    mount_update(&discord, 1, 1).await;
    mount_describe(&discord, 0, 1, 1).await;
    mount_update_reply(
        &discord,
        "tok-start",
        "The server is starting, try again in a minute or two.",
        1,
    )
    .await;
    let gateway = GatewayTestServer::start(test_config(&discord)).await;

    let response = gateway
        .post_signed(&command("2001", "tok-start", "start"))
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(wait_for_requests(&discord, 4).await, 4);
}

#[tokio::test]
async fn redelivered_interaction_runs_once() {
    let discord = MockServer::start().await;
    mount_initial_reply(&discord, "Checking the server...", 1).await;
    mount_describe(&discord, 1, 1, 1).await;
    mount_update_reply(&discord, "tok-dup", "The server is up!", 1).await;
    let gateway = GatewayTestServer::start(test_config(&discord)).await;

    let payload = command("2002", "tok-dup", "status");
    let first = gateway.post_signed(&payload).await;
    let second = gateway.post_signed(&payload).await;

    assert_eq!(first.status(), StatusCode::ACCEPTED);
    assert_eq!(second.status(), StatusCode::ACCEPTED);
    wait_for_requests(&discord, 3).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(discord.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn component_interaction_is_rejected() {
    let discord = MockServer::start().await;
    let gateway = GatewayTestServer::start(test_config(&discord)).await;

    let response = gateway
        .post_signed(&json!({"type": 3, "id": "2003", "token": "t"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap_or_default(), "wut?");
}
