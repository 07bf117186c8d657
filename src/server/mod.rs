//! HTTP surface for one agent
//!
//! Two inbound faces share the port: the agent-to-agent protocol
//! (`/receive-message`), and the operator surface (`/take-turn`, `/api/*`).
//! Handlers hold no state of their own; everything routes through the shared
//! `RaceAgent`.

use crate::agent::RaceAgent;
use crate::errors::AgentError;
use crate::store::types::MessageType;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Build the router for a single agent
pub fn router(agent: Arc<RaceAgent>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/take-turn", post(take_turn))
        .route("/receive-message", post(receive_message))
        .route("/api/messages", get(api_messages))
        .route("/api/state", get(api_state))
        .route("/api/trust", get(api_trust))
        .route("/api/reset", post(api_reset))
        .with_state(agent)
}

/// Map an agent failure onto a status code. The day counter only moves on a
/// completed turn, so every non-200 here means "nothing happened".
fn error_response(err: AgentError) -> Response {
    let status = match &err {
        AgentError::TurnInProgress { .. } => StatusCode::CONFLICT,
        AgentError::OracleError(_)
        | AgentError::DecisionParse { .. }
        | AgentError::HttpError(_) => StatusCode::BAD_GATEWAY,
        AgentError::UnknownRace(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        warn!(error = %err, "request rejected");
    }
    (
        status,
        Json(json!({
            "success": false,
            "error": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
        .into_response()
}

async fn health(State(agent): State<Arc<RaceAgent>>) -> Response {
    match agent.current_day() {
        Ok(day) => Json(json!({
            "status": "ok",
            "race": agent.race_id(),
            "currentDay": day,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn take_turn(State(agent): State<Arc<RaceAgent>>) -> Response {
    match agent.take_turn().await {
        Ok(outcome) => Json(json!({
            "success": true,
            "race": agent.race_id(),
            "day": outcome.day,
            "messagesSent": outcome.report.messages_sent,
            "codeResolutions": outcome.report.code_resolutions,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Inbound wire format. Fields are optional so malformed bodies surface as a
/// clean 400 instead of a deserializer rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiveMessageBody {
    from_race: Option<String>,
    message_type: Option<String>,
    content: Option<String>,
    code: Option<String>,
}

async fn receive_message(
    State(agent): State<Arc<RaceAgent>>,
    Json(body): Json<ReceiveMessageBody>,
) -> Response {
    let (Some(from), Some(kind), Some(content)) =
        (&body.from_race, &body.message_type, &body.content)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "fromRace, messageType and content are required",
            })),
        )
            .into_response();
    };
    let Some(message_type) = MessageType::parse(kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": format!("invalid messageType: {kind}"),
            })),
        )
            .into_response();
    };

    match agent.receive_message(from, message_type, content, body.code.as_deref()) {
        Ok(id) => Json(json!({ "success": true, "messageId": id })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn api_messages(State(agent): State<Arc<RaceAgent>>) -> Response {
    match agent.message_log() {
        Ok((outgoing, incoming)) => Json(json!({
            "outgoing": outgoing,
            "incoming": incoming,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn api_state(State(agent): State<Arc<RaceAgent>>) -> Response {
    let state = || -> crate::errors::Result<_> {
        Ok(json!({
            "raceId": agent.race_id(),
            "currentDay": agent.current_day()?,
            "lastTurnAt": agent.last_turn_at()?,
            "resources": agent.resources()?,
            "personality": agent.personality()?,
            "secrets": agent.secrets()?,
        }))
    };
    match state() {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e),
    }
}

/// Trust rows as an array: consumers iterate them and read
/// `race_id`/`trust_level`/`is_ally`/`is_enemy` per row.
async fn api_trust(State(agent): State<Arc<RaceAgent>>) -> Response {
    match agent.relationships() {
        Ok(rels) => Json(json!({
            "raceId": agent.race_id(),
            "trustLevels": rels,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn api_reset(State(agent): State<Arc<RaceAgent>>) -> Response {
    match agent.reset() {
        Ok(()) => Json(json!({ "success": true, "race": agent.race_id() })).into_response(),
        Err(e) => error_response(e),
    }
}
