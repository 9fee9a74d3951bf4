//! Page mirroring endpoints

use crate::error::FolioError;
use crate::notion::{normalize_id, RecordMap};
use crate::server::{ApiError, ApiResult, AppState};
use crate::slugs::{render_sitemap, SlugTable};

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    page_id: Option<String>,
}

/// `GET /api/page?pageId=...`: raw record map, uncached
pub async fn api_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<RecordMap>> {
    let page_id = query
        .page_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing or invalid pageId"))?;

    match state.source.get_page(&page_id).await {
        Ok(map) => Ok(Json(map)),
        Err(e) => match e.downcast_ref::<FolioError>() {
            Some(FolioError::NotFound(_)) => Err(ApiError::not_found("Page not found")),
            _ => {
                tracing::error!(page_id = %page_id, "Failed to fetch Notion page: {}", e);
                Err(ApiError::new(
                    axum::http::StatusCode::BAD_GATEWAY,
                    "Failed to fetch Notion page",
                ))
            }
        },
    }
}

/// Page payload handed to the front-end renderer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub page_id: String,
    /// Path without leading slash; empty for the root
    pub slug: String,
    pub title: String,
    /// `<title> - <site name>`
    pub document_title: String,
    pub parent_slug: Option<String>,
    /// Link target of every page block in `record_map`, keyed by block ID
    pub page_urls: BTreeMap<String, String>,
    pub record_map: RecordMap,
}

/// `GET /`
pub async fn root_page(State(state): State<AppState>) -> ApiResult<Response> {
    serve_path(&state, "").await
}

/// `GET /*path`
pub async fn page_by_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    serve_path(&state, &path).await
}

async fn serve_path(state: &AppState, raw_path: &str) -> ApiResult<Response> {
    let path = raw_path.trim_matches('/');
    let request_path = format!("/{}", path);

    if let Some(redirect) = state
        .config
        .site
        .redirects
        .iter()
        .find(|r| r.source.trim_end_matches('/') == request_path.trim_end_matches('/'))
    {
        tracing::info!(from = %request_path, to = %redirect.destination, "Redirecting");
        return Ok(if redirect.permanent {
            Redirect::permanent(&redirect.destination).into_response()
        } else {
            Redirect::temporary(&redirect.destination).into_response()
        });
    }

    let root_id = state.config.site.root_page_id.clone();
    let page_id_urls = state.config.site.page_id_urls;

    let table = if page_id_urls {
        None
    } else {
        Some(state.slugs.table().await)
    };

    let (page_id, mapping) = if path.is_empty() {
        (root_id.clone(), None)
    } else if let Some(table) = table.as_deref() {
        match table.by_slug(path) {
            Some(mapping) => (mapping.page_id.clone(), Some(mapping.clone())),
            None => {
                tracing::debug!(path = %request_path, "No page mapped to path");
                return Err(ApiError::not_found("Page not found"));
            }
        }
    } else {
        (path.replace('/', ""), None)
    };

    let record_map = match state.page(&page_id).await {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = %request_path, page_id = %page_id, "Failed to load page: {}", e);
            return Err(ApiError::not_found("Page not found"));
        }
    };

    let is_root = normalize_id(&page_id) == normalize_id(&root_id);
    let title = mapping
        .as_ref()
        .map(|m| m.title.clone())
        .or_else(|| record_map.page_title(&page_id))
        .unwrap_or_else(|| if is_root { "Home" } else { "Untitled" }.to_string());

    let response = PageResponse {
        document_title: format!("{} - {}", title, state.config.site.name),
        slug: mapping.as_ref().map(|m| m.slug.clone()).unwrap_or_else(|| {
            if is_root {
                String::new()
            } else {
                path.to_string()
            }
        }),
        parent_slug: mapping.and_then(|m| m.parent_slug),
        page_urls: page_urls(&record_map, &root_id, table.as_deref()),
        page_id,
        title,
        record_map,
    };

    tracing::info!(path = %request_path, page_id = %response.page_id, "Served page");
    Ok(Json(response).into_response())
}

/// Site URL of every page block in a record map
///
/// The root links to `/`, mapped pages to their path, anything else to its
/// page ID.
fn page_urls(record_map: &RecordMap, root_id: &str, table: Option<&SlugTable>) -> BTreeMap<String, String> {
    let root = normalize_id(root_id);
    record_map
        .blocks()
        .filter(|b| b.is_page())
        .map(|block| {
            let clean = normalize_id(&block.id);
            let url = if clean == root {
                "/".to_string()
            } else if let Some(slug) = table.and_then(|t| t.slug_for(&clean)) {
                format!("/{}", slug)
            } else {
                format!("/{}", clean)
            };
            (block.id, url)
        })
        .collect()
}

/// `GET /sitemap.xml`
pub async fn sitemap(State(state): State<AppState>) -> impl IntoResponse {
    let table = state.slugs.table().await;
    let xml = render_sitemap(&state.config.site.base_url, &table);
    ([(header::CONTENT_TYPE, "text/xml")], xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slugs::{build_mappings, PageNode};
    use serde_json::json;

    #[test]
    fn test_page_urls_cover_root_mapped_and_unmapped() {
        let map: RecordMap = serde_json::from_value(json!({"block": {
            "root": {"value": {"id": "root", "type": "page"}},
            "about": {"value": {"id": "about", "type": "page"}},
            "orphan": {"value": {"id": "orphan", "type": "page"}},
            "text": {"value": {"id": "text", "type": "text"}}
        }}))
        .unwrap();
        let table = SlugTable::from_mappings(build_mappings(&[PageNode::new("about", "About Me", None)]));

        let urls = page_urls(&map, "root", Some(&table));
        assert_eq!(urls.len(), 3);
        assert_eq!(urls["root"], "/");
        assert_eq!(urls["about"], "/about-me");
        assert_eq!(urls["orphan"], "/orphan");
    }
}
