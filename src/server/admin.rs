//! Password-gated admin API over the event log

use crate::events::{EventRecord, SessionsReport};
use crate::server::maintenance::secret_matches;
use crate::server::{ApiError, ApiResult, AppState};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::json;

/// Events read for `/api/messages`
pub const MESSAGES_LIMIT: usize = 1000;

/// Events read per prefix, and kept after merging, for `/api/all-messages`
pub const ALL_MESSAGES_LIMIT: usize = 10_000;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(' ').nth(1))
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    if secret_matches(state.config.admin.password.as_deref(), bearer_token(headers)) {
        Ok(())
    } else {
        tracing::warn!("Admin request rejected");
        Err(ApiError::unauthorized())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default)]
    pub session_ids: Vec<String>,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllMessagesQuery {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub list_prefixes: Option<String>,
}

async fn delete_sessions(state: &AppState, prefix: &str, session_ids: &[String]) -> ApiResult<Response> {
    if session_ids.is_empty() {
        return Err(ApiError::bad_request("Invalid sessionIds"));
    }
    tracing::info!(prefix, sessions = session_ids.len(), "Deleting sessions");
    let deleted = state.events.delete_sessions(prefix, session_ids).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })).into_response())
}

/// `GET /api/messages`: recent sessions of the site's own prefix
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionsReport>> {
    require_admin(&state, &headers)?;
    let prefix = state.config.events.prefix.clone();
    let events = state.events.recent(&prefix, MESSAGES_LIMIT).await?;
    Ok(Json(SessionsReport::build(events, prefix)))
}

/// `DELETE /api/messages`
pub async fn delete_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Response> {
    require_admin(&state, &headers)?;
    delete_sessions(&state, &state.config.events.prefix, &request.session_ids).await
}

/// `GET /api/all-messages`
///
/// With `listPrefixes=true` lists prefixes. With `prefix` reads that prefix.
/// Otherwise merges every prefix, newest first.
pub async fn list_all_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AllMessagesQuery>,
) -> ApiResult<Response> {
    require_admin(&state, &headers)?;

    if query.list_prefixes.as_deref() == Some("true") {
        let prefixes = state.events.prefixes().await?;
        return Ok(Json(json!({ "prefixes": prefixes })).into_response());
    }

    let report = match query.prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => {
            let events = state.events.recent(&prefix, ALL_MESSAGES_LIMIT).await?;
            SessionsReport::build(events, prefix)
        }
        None => {
            let prefixes = state.events.prefixes().await?;
            let reads = prefixes
                .iter()
                .map(|prefix| state.events.recent(prefix, ALL_MESSAGES_LIMIT));
            let mut events: Vec<EventRecord> = try_join_all(reads)
                .await?
                .into_iter()
                .flatten()
                .collect();
            events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            events.truncate(ALL_MESSAGES_LIMIT);
            SessionsReport::build(events, "all")
        }
    };

    Ok(Json(report).into_response())
}

/// `DELETE /api/all-messages`: body `prefix`, else query `prefix`, else the
/// site's own prefix
pub async fn delete_all_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AllMessagesQuery>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Response> {
    require_admin(&state, &headers)?;
    let prefix = request
        .prefix
        .clone()
        .filter(|p| !p.is_empty())
        .or(query.prefix.filter(|p| !p.is_empty()))
        .unwrap_or_else(|| state.config.events.prefix.clone());
    delete_sessions(&state, &prefix, &request.session_ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer pw"));
        assert_eq!(bearer_token(&headers), Some("pw"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("pw"));
        assert_eq!(bearer_token(&headers), None);
    }
}
