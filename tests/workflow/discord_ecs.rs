use crate::harness::{
    ECS_TARGET, mount_describe, mount_initial_reply, mount_update, mount_update_reply, test_config,
};
use gamekeeper::app::runtime::Runtime;
use gamekeeper::error::{ServiceError, WorkflowError};
use gamekeeper::workflow::{Interaction, Outcome, Path, RunReport};
use serde_json::json;
use wiremock::matchers::{header, header_regex, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn is_sigv4_authorization(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/") else {
        return false;
    };
    let mut parts = rest.split(", ");
    let scope_ok = parts
        .next()
        .is_some_and(|scope| scope.ends_with("/us-east-1/ecs/aws4_request"));
    let headers_ok = parts.next().is_some_and(|signed| {
        signed.starts_with("SignedHeaders=") && signed.contains("x-amz-target")
    });
    let signature_ok = parts.next().is_some_and(|sig| {
        sig.strip_prefix("Signature=")
            .is_some_and(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
    });
    scope_ok && headers_ok && signature_ok
}

async fn run(server: &MockServer, sub_command: &str) -> Result<RunReport, WorkflowError> {
    let runtime = Runtime::build(test_config(server))
        .await
        .expect("runtime should build against the mock server");
    let runner = runtime.workflow_runner().expect("runner should build");
    runner
        .run(&Interaction::new("1001", "tok", sub_command))
        .await
}

#[tokio::test]
async fn start_scales_up_then_describes_once() {
    let server = MockServer::start().await;
    mount_initial_reply(&server, "Starting the server...", 1).await;
    mount_update(&server, 1, 1).await;
    mount_describe(&server, 0, 1, 1).await;
    mount_update_reply(
        &server,
        "tok",
        "The server is starting, try again in a minute or two.",
        1,
    )
    .await;

    let report = run(&server, "start").await.unwrap();

    assert_eq!(report.path, Path::Start);
    assert_eq!(report.outcome, Some(Outcome::Starting));
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn stop_scales_to_zero_and_reports_down() {
    let server = MockServer::start().await;
    mount_initial_reply(&server, "Stopping the server...", 1).await;
    mount_update(&server, 0, 1).await;
    mount_describe(&server, 0, 0, 1).await;
    mount_update_reply(&server, "tok", "The server is down.", 1).await;

    let report = run(&server, "stop").await.unwrap();

    assert_eq!(report.outcome, Some(Outcome::Down));
}

#[tokio::test]
async fn status_never_changes_desired_count() {
    let server = MockServer::start().await;
    mount_initial_reply(&server, "Checking the server...", 1).await;
    mount_update(&server, 0, 0).await;
    mount_update(&server, 1, 0).await;
    mount_describe(&server, 1, 1, 1).await;
    mount_update_reply(&server, "tok", "The server is up!", 1).await;

    let report = run(&server, "status").await.unwrap();

    assert_eq!(report.outcome, Some(Outcome::Up));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn unknown_sub_command_only_acknowledges() {
    let server = MockServer::start().await;
    mount_initial_reply(&server, "Wut?", 1).await;

    let report = run(&server, "Start").await.unwrap();

    assert_eq!(report.path, Path::Fallback);
    assert!(report.update.is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_service_sends_error_update_and_fails() {
    let server = MockServer::start().await;
    mount_initial_reply(&server, "Checking the server...", 1).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(
            "x-amz-target",
            format!("{ECS_TARGET}.DescribeServices").as_str(),
        ))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "ServiceNotFoundException",
            "message": "Service not found."
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_update_reply(
        &server,
        "tok",
        "Something went wrong talking to the server.",
        1,
    )
    .await;

    let err = run(&server, "status").await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Service(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn failed_acknowledgement_stops_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let err = run(&server, "start").await.unwrap_err();

    assert!(matches!(err, WorkflowError::Notify(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn ecs_requests_are_sigv4_signed() {
    let server = MockServer::start().await;
    mount_initial_reply(&server, "Checking the server...", 1).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(header_regex("x-amz-date", r"^\d{8}T\d{6}Z$"))
        .and(|request: &Request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .is_some_and(is_sigv4_authorization)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": [{
                "serviceName": "valheim",
                "status": "ACTIVE",
                "runningCount": 1,
                "desiredCount": 1
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_update_reply(&server, "tok", "The server is up!", 1).await;

    run(&server, "status").await.unwrap();
}
