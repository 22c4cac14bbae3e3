use crate::harness::{mount_update, test_config};
use crate::test_server::GatewayTestServer;
use gamekeeper::config::Config;
use gamekeeper::transport::gateway::ALARM_SECRET_HEADER;
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALARM_SECRET: &str = "sns-shared-secret";
const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:valheim-idle";

fn idle_alarm(state: &str) -> Value {
    let alarm = json!({
        "AlarmName": "valheim-cpu-idle",
        "NewStateValue": state,
        "Trigger": {
            "MetricName": "CPUUtilization",
            "Dimensions": [
                {"name": "ClusterName", "value": "games"},
                {"name": "ServiceName", "value": "valheim"}
            ]
        }
    });
    json!({"Records": [{"Sns": {"TopicArn": TOPIC_ARN, "Message": alarm.to_string()}}]})
}

fn alarm_config(aws: &MockServer) -> Config {
    let mut config = test_config(aws);
    config.auto_shutdown.enabled = true;
    config.auto_shutdown.secret = Some(ALARM_SECRET.into());
    config.auto_shutdown.topic_arn = Some(TOPIC_ARN.into());
    config
}

async fn post_alarm(gateway: &GatewayTestServer, path: &str, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(gateway.url(path))
        .json(body)
        .send()
        .await
        .expect("alarm request should complete")
}

#[tokio::test]
async fn firing_alarm_scales_service_to_zero() {
    let aws = MockServer::start().await;
    mount_update(&aws, 0, 1).await;
    let gateway = GatewayTestServer::start(alarm_config(&aws)).await;

    let response = post_alarm(
        &gateway,
        &format!("/alarms?secret={ALARM_SECRET}"),
        &idle_alarm("ALARM"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("alarm report should be json");
    assert_eq!(body["scaled"], 1);
}

#[tokio::test]
async fn recovered_alarm_leaves_service_alone() {
    let aws = MockServer::start().await;
    mount_update(&aws, 0, 0).await;
    let gateway = GatewayTestServer::start(alarm_config(&aws)).await;

    let response = reqwest::Client::new()
        .post(gateway.url("/alarms"))
        .header(ALARM_SECRET_HEADER, ALARM_SECRET)
        .json(&idle_alarm("OK"))
        .send()
        .await
        .expect("alarm request should complete");

    let body: Value = response.json().await.expect("alarm report should be json");
    assert_eq!(body["ignored"], 1);
    assert_eq!(body["scaled"], 0);
}

#[tokio::test]
async fn alarm_without_secret_cannot_stop_the_server() {
    let aws = MockServer::start().await;
    mount_update(&aws, 0, 0).await;
    let gateway = GatewayTestServer::start(alarm_config(&aws)).await;

    let unsigned = json!({
        "Type": "Notification",
        "TopicArn": TOPIC_ARN,
        "Message": idle_alarm("ALARM")["Records"][0]["Sns"]["Message"].clone()
    });
    let missing = post_alarm(&gateway, "/alarms", &unsigned).await;
    let wrong = post_alarm(&gateway, "/alarms?secret=guess", &unsigned).await;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn alarm_from_another_topic_is_forbidden() {
    let aws = MockServer::start().await;
    mount_update(&aws, 0, 0).await;
    let gateway = GatewayTestServer::start(alarm_config(&aws)).await;

    let mut body = idle_alarm("ALARM");
    body["Records"][0]["Sns"]["TopicArn"] = json!("arn:aws:sns:us-east-1:999999999999:other");
    let response = post_alarm(&gateway, &format!("/alarms?secret={ALARM_SECRET}"), &body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn confirmation_is_not_fetched_outside_sns() {
    let aws = MockServer::start().await;
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&internal)
        .await;
    let gateway = GatewayTestServer::start(alarm_config(&aws)).await;

    let confirmation = json!({
        "Type": "SubscriptionConfirmation",
        "TopicArn": TOPIC_ARN,
        "SubscribeURL": format!("{}/latest/meta-data/", internal.uri())
    });
    let response = post_alarm(
        &gateway,
        &format!("/alarms?secret={ALARM_SECRET}"),
        &confirmation,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(internal.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn alarms_are_refused_when_auto_shutdown_is_off() {
    let aws = MockServer::start().await;
    let gateway = GatewayTestServer::start(test_config(&aws)).await;

    let response = post_alarm(&gateway, "/alarms", &idle_alarm("ALARM")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
