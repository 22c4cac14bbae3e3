#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use gamekeeper::config::Config;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const APP_ID: &str = "4242";
pub const ECS_TARGET: &str = "AmazonEC2ContainerServiceV20141113";

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[11u8; 32])
}

/// Config pointing both the Discord API and ECS at `server`.
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.service.cluster = "games".into();
    config.service.service = "valheim".into();
    config.service.endpoint = Some(server.uri());
    config.aws.access_key_id = Some("AKIDEXAMPLE".into());
    config.aws.secret_access_key = Some("test-secret".into());
    config.discord.application_id = Some(APP_ID.into());
    config.discord.authorization = Some("Bot test-token".into());
    config.discord.public_key = Some(hex::encode(signing_key().verifying_key().to_bytes()));
    config.discord.api_base = server.uri();
    config
}

fn service_body(running: u32, desired: u32) -> serde_json::Value {
    json!({
        "serviceName": "valheim",
        "status": "ACTIVE",
        "runningCount": running,
        "desiredCount": desired
    })
}

pub async fn mount_describe(server: &MockServer, running: u32, desired: u32, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(
            "x-amz-target",
            format!("{ECS_TARGET}.DescribeServices").as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": [service_body(running, desired)],
            "failures": []
        })))
        .expect(expect)
        .mount(server)
        .await;
}

pub async fn mount_update(server: &MockServer, desired: u32, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(
            "x-amz-target",
            format!("{ECS_TARGET}.UpdateService").as_str(),
        ))
        .and(body_partial_json(json!({
            "cluster": "games",
            "service": "valheim",
            "desiredCount": desired
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "service": service_body(0, desired) })),
        )
        .expect(expect)
        .mount(server)
        .await;
}

pub async fn mount_initial_reply(server: &MockServer, content: &str, expect: u64) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/interactions/[^/]+/[^/]+/callback$"))
        .and(body_partial_json(json!({
            "type": 4,
            "data": { "content": content }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(expect)
        .mount(server)
        .await;
}

pub async fn mount_update_reply(server: &MockServer, token: &str, content: &str, expect: u64) {
    Mock::given(method("PATCH"))
        .and(path(format!(
            "/webhooks/{APP_ID}/{token}/messages/@original"
        )))
        .and(body_partial_json(json!({ "content": content })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .expect(expect)
        .mount(server)
        .await;
}
