//! Page-view tracking endpoint

use crate::events::{client_ip, user_agent, EventKind, EventRecord};
use crate::server::{ApiError, ApiResult, AppState};

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackResponse {
    pub success: bool,
    pub logged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TrackResponse {
    fn skipped(reason: &str) -> Self {
        Self {
            success: true,
            logged: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// `POST /api/track`
///
/// Store failures are reported in the body, never as an error status.
pub async fn track(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> ApiResult<Json<TrackResponse>> {
    if !state.config.events.page_logging {
        return Ok(Json(TrackResponse::skipped("Page logging disabled")));
    }

    let session_id = request
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing sessionId"))?;

    let kind = match request.event_type.as_deref() {
        None | Some("") => EventKind::PageView,
        Some(name) => EventKind::parse(name)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid eventType: {}", name)))?,
    };

    let timestamp = request
        .timestamp
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let mut event = EventRecord::page_view(session_id, request.path, request.title)
        .at(timestamp)
        .with_client(client_ip(&headers, connect.map(|c| c.0)), user_agent(&headers));
    event.kind = kind;

    match state
        .events
        .append(&state.config.events.prefix, &event, state.session_ttl())
        .await
    {
        Ok(()) => {
            tracing::debug!(session_id = %event.session_id, path = event.path.as_deref().unwrap_or(""), "Tracked event");
            Ok(Json(TrackResponse {
                success: true,
                logged: true,
                reason: None,
            }))
        }
        Err(e) => {
            tracing::warn!("Failed to track event: {:#}", e);
            Ok(Json(TrackResponse::skipped("Event store unavailable")))
        }
    }
}
