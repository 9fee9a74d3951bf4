//! Writing-assistant endpoint
//!
//! A password login hands out a random session token in an HttpOnly cookie.
//! Tokens live in memory for 24 hours and do not survive a restart.

use crate::chat::prompts::writing_prompt;
use crate::chat::{extract_draft, ChatMessage};
use crate::server::maintenance::secret_matches;
use crate::server::{ApiError, ApiResult, AppState, WRITE_SESSION_TTL};

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Cookie carrying the writing session token
pub const SESSION_COOKIE: &str = "write_session";

const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub action: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub current_draft: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WriteChatResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_draft: Option<String>,
}

fn new_token() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Value of a named cookie from the request headers
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn is_authenticated(state: &AppState, headers: &HeaderMap) -> bool {
    cookie_value(headers, SESSION_COOKIE)
        .filter(|token| !token.is_empty())
        .is_some_and(|token| state.write_sessions.get(&token.to_string()).is_some())
}

/// `POST /api/write-chat`
///
/// Actions: `authenticate`, `check_auth`, `chat`.
pub async fn write_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WriteRequest>,
) -> ApiResult<Response> {
    match request.action.as_str() {
        "authenticate" => authenticate(&state, request.password.as_deref()),
        "check_auth" => {
            let authenticated = is_authenticated(&state, &headers);
            let status = if authenticated {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };
            Ok((status, Json(json!({ "authenticated": authenticated }))).into_response())
        }
        action => {
            if !is_authenticated(&state, &headers) {
                return Err(ApiError::unauthorized());
            }
            if action != "chat" {
                return Err(ApiError::bad_request("Invalid action"));
            }
            let response = writing_chat(&state, &request).await?;
            Ok(Json(response).into_response())
        }
    }
}

fn authenticate(state: &AppState, password: Option<&str>) -> ApiResult<Response> {
    if !secret_matches(state.config.admin.write_password.as_deref(), password) {
        tracing::warn!("Writing assistant login rejected");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid password"));
    }

    let token = new_token();
    state.write_sessions.insert(token.clone(), ());
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE,
        token,
        WRITE_SESSION_TTL.as_secs()
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal(format!("Invalid session cookie: {}", e)))?;

    tracing::info!("Writing assistant session started");
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "success": true }))).into_response())
}

async fn writing_chat(state: &AppState, request: &WriteRequest) -> ApiResult<WriteChatResponse> {
    if request.messages.is_empty() {
        return Err(ApiError::bad_request("messages must not be empty"));
    }
    let Some(generator) = state.generator.as_ref() else {
        tracing::error!("Writing assistant requested but no generator is configured");
        return Err(ApiError::internal("Internal server error"));
    };

    let system = writing_prompt(&state.knowledge, request.current_draft.as_deref());
    let reply = generator
        .generate(&system, &request.messages)
        .await
        .map_err(|e| {
            tracing::error!("Writing assistant generation failed: {:#}", e);
            ApiError::internal("Internal server error")
        })?;

    let updated_draft = extract_draft(&reply);
    tracing::info!(draft_updated = updated_draft.is_some(), "Writing assistant replied");
    Ok(WriteChatResponse {
        message: reply,
        updated_draft,
    })
}
