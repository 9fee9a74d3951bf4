//! Visitor chat and knowledge snapshot endpoints

use crate::chat::{last_user_message, split_navigation, ChatMessage, Navigation};
use crate::content::Knowledge;
use crate::events::{client_ip, user_agent, EventRecord};
use crate::server::{ApiError, ApiResult, AppState};

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate: Option<Navigation>,
}

/// `POST /api/chat`
///
/// Logs the visitor's message when chat logging is on, then asks the model.
/// A model failure still answers 200 with the configured fallback reply.
pub async fn chat(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if request.messages.is_empty() {
        return Err(ApiError::bad_request("messages must not be empty"));
    }

    tracing::info!(
        messages = request.messages.len(),
        session_id = request.session_id.as_deref().unwrap_or(""),
        "Chat request"
    );

    if state.config.events.chat_logging {
        log_chat_message(&state, &request, &headers, connect.map(|c| c.0)).await;
    }

    let Some(generator) = state.generator.as_ref() else {
        tracing::warn!("Chat requested but no generator is configured");
        return Ok(Json(fallback(&state)));
    };

    match generator.generate(&state.system_prompt, &request.messages).await {
        Ok(reply) => {
            let (message, navigate) = split_navigation(&reply);
            if let Some(nav) = &navigate {
                tracing::info!(url = %nav.url, "Chat reply navigates");
            }
            Ok(Json(ChatResponse { message, navigate }))
        }
        Err(e) => {
            tracing::error!("Chat generation failed: {:#}", e);
            Ok(Json(fallback(&state)))
        }
    }
}

fn fallback(state: &AppState) -> ChatResponse {
    ChatResponse {
        message: state.config.chat.fallback_reply.clone(),
        navigate: None,
    }
}

async fn log_chat_message(
    state: &AppState,
    request: &ChatRequest,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) {
    let Some(message) = last_user_message(&request.messages) else {
        return;
    };
    let Some(session_id) = request.session_id.as_deref().filter(|s| !s.is_empty()) else {
        tracing::warn!("No sessionId provided, skipping chat logging");
        return;
    };

    let event = EventRecord::chat_message(session_id, message.content.clone())
        .with_client(client_ip(headers, peer), user_agent(headers));
    let prefix = &state.config.events.prefix;

    match state.events.append(prefix, &event, state.session_ttl()).await {
        Ok(()) => tracing::debug!(session_id, "Chat message logged"),
        Err(e) => tracing::warn!(session_id, "Failed to log chat message: {:#}", e),
    }
}

/// `GET /api/knowledge`
pub async fn knowledge(State(state): State<AppState>) -> Json<Knowledge> {
    Json(Knowledge::clone(&state.knowledge))
}

/// Writes to `/api/knowledge`
pub async fn knowledge_readonly() -> ApiError {
    ApiError::forbidden("Knowledge base is read-only")
}
