use crate::error::{GamekeeperError, WebhookError};
use crate::transport::discord::extract_sub_command;
use crate::transport::discord::types::{
    InteractionCallbackType, InteractionType, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::transport::discord::verify_interaction_signature;
use crate::workflow::Interaction;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;

/// Header carrying the `/alarms` shared secret.
pub const ALARM_SECRET_HEADER: &str = "X-Webhook-Secret";

/// SNS cannot set headers, so the subscription URL carries `?secret=`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct AlarmQuery {
    #[serde(default)]
    secret: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn unknown_interaction_response() -> Response {
    (StatusCode::BAD_REQUEST, "wut?").into_response()
}

/// GET /health
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /interactions: Discord's outgoing webhook for slash commands.
pub(super) async fn handle_interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);
    if verify_interaction_signature(&state.public_key, signature, timestamp, &body).is_err() {
        tracing::warn!("rejected interaction with invalid signature");
        return (StatusCode::UNAUTHORIZED, "Invalid request signature").into_response();
    }

    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(&body) else {
        return unknown_interaction_response();
    };
    let kind = payload
        .get("type")
        .and_then(serde_json::Value::as_u64)
        .and_then(InteractionType::from_u64);

    match kind {
        Some(InteractionType::Ping) => {
            Json(serde_json::json!({ "type": InteractionCallbackType::Pong as u8 }))
                .into_response()
        }
        Some(InteractionType::ApplicationCommand) => start_run(&state, &payload),
        _ => unknown_interaction_response(),
    }
}

fn start_run(state: &AppState, payload: &serde_json::Value) -> Response {
    let id = payload.get("id").and_then(serde_json::Value::as_str);
    let token = payload.get("token").and_then(serde_json::Value::as_str);
    let (Some(id), Some(token)) = (id, token) else {
        return unknown_interaction_response();
    };

    if !state.interactions.check_and_record(id) {
        tracing::info!(interaction_id = id, "duplicate interaction delivery ignored");
        return StatusCode::ACCEPTED.into_response();
    }

    let interaction = Interaction::new(id, token, extract_sub_command(payload.get("data")));
    let runner = Arc::clone(&state.runner);
    tokio::spawn(async move {
        match runner.run(&interaction).await {
            Ok(report) => {
                tracing::info!(run_id = %report.run_id, outcome = ?report.outcome, "run finished");
            }
            Err(error) => {
                tracing::error!(interaction_id = %interaction.interaction_id, "run failed: {error}");
            }
        }
    });

    StatusCode::ACCEPTED.into_response()
}

/// POST /alarms: SNS deliveries of the idle-CPU alarm.
pub(super) async fn handle_alarms(
    State(state): State<AppState>,
    Query(query): Query<AlarmQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(alarms) = state.alarms.as_ref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "auto-shutdown is disabled" })),
        )
            .into_response();
    };

    let provided = headers
        .get(ALARM_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(query.secret.as_deref());
    if !alarms.authorize(provided) {
        tracing::warn!("rejected alarm delivery without a valid secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "invalid or missing X-Webhook-Secret header or secret query parameter"
            })),
        )
            .into_response();
    }

    match alarms.handle(&body).await {
        Ok(report) => Json(serde_json::json!({
            "scaled": report.scaled,
            "ignored": report.ignored,
            "confirmed": report.confirmed,
        }))
        .into_response(),
        Err(GamekeeperError::Webhook(error @ WebhookError::Forbidden(_))) => {
            tracing::warn!("refused alarm delivery: {error}");
            (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "error": error.to_string() })),
            )
                .into_response()
        }
        Err(GamekeeperError::Webhook(error)) => {
            tracing::warn!("rejected alarm payload: {error}");
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": error.to_string() })),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("alarm handling failed: {error}");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    }
}
