//! Cache revalidation and deploy-hook endpoints

use crate::server::{ApiError, ApiResult, AppState};

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

/// Whether `provided` matches a configured secret
///
/// An unset or empty secret rejects everything.
pub(crate) fn secret_matches(configured: Option<&str>, provided: Option<&str>) -> bool {
    match (configured.map(str::trim), provided.map(str::trim)) {
        (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
        _ => false,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateQuery {
    secret: Option<String>,
    page_id: Option<String>,
    path: Option<String>,
}

/// `POST /api/revalidate`
///
/// Evicts one page from the page cache. `pageId` is resolved to its path
/// first; otherwise `path` is used, else the root. Revalidating the root also
/// drops the slug table.
pub async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RevalidateQuery>,
) -> ApiResult<Json<Value>> {
    let provided = query
        .secret
        .as_deref()
        .or_else(|| header_str(&headers, "x-revalidate-secret"));
    if !secret_matches(state.config.admin.revalidate_secret.as_deref(), provided) {
        tracing::warn!("Revalidate rejected: invalid secret");
        return Err(ApiError::new(axum::http::StatusCode::UNAUTHORIZED, "Invalid token"));
    }

    let path = if let Some(page_id) = query.page_id.filter(|id| !id.is_empty()) {
        let table = state.slugs.table().await;
        let Some(slug) = table.slug_for(&page_id) else {
            return Err(ApiError::not_found("Page not found"));
        };
        state.evict_page(&page_id);
        format!("/{}", slug)
    } else {
        let path = query
            .path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string());
        let slug = path.trim_matches('/');
        if slug.is_empty() {
            state.evict_page(&state.config.site.root_page_id);
            state.slugs.invalidate();
        } else if let Some(page_id) = state.slugs.table().await.page_id_for(slug) {
            state.evict_page(page_id);
        } else if state.config.site.page_id_urls {
            state.evict_page(slug);
        }
        path
    };

    tracing::info!(path = %path, "Revalidated");
    Ok(Json(json!({
        "revalidated": true,
        "path": path,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct RebuildQuery {
    token: Option<String>,
}

/// `POST /api/rebuild`: trigger the configured deploy hook
pub async fn rebuild(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RebuildQuery>,
) -> ApiResult<Json<Value>> {
    let provided = header_str(&headers, "x-rebuild-token").or(query.token.as_deref());
    if !secret_matches(state.config.admin.rebuild_token.as_deref(), provided) {
        tracing::warn!("Rebuild rejected: invalid token");
        return Err(ApiError::new(
            axum::http::StatusCode::UNAUTHORIZED,
            "Invalid or missing token",
        ));
    }

    let Some(hook) = state
        .config
        .admin
        .deploy_hook_url
        .as_deref()
        .filter(|u| !u.is_empty())
    else {
        return Err(ApiError::internal("Deploy hook URL not configured"));
    };

    let response = state.http.post(hook).send().await.map_err(|e| {
        tracing::error!("Deploy hook request failed: {}", e);
        ApiError::internal(format!("Failed to trigger rebuild: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("Deploy hook returned {}", status);
        return Err(ApiError::internal(format!(
            "Failed to trigger rebuild: deploy hook returned {}",
            status
        )));
    }

    tracing::info!("Rebuild triggered");
    Ok(Json(json!({
        "message": "Rebuild triggered successfully",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
