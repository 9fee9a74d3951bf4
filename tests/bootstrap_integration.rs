//! Building the application from a config file on disk

mod common;

use axum::http::StatusCode;
use common::{get, json_request, send, temp_config_file};
use folio::cli::Cli;
use folio::config::Config;
use folio::content::{write_page_content, PageContent};
use folio::server::{build_router, AppState};
use serde_json::json;

const CONFIG: &str = r#"
site:
  root_page_id: "1a7e021d4ed242e1ab769b9e92308bb0"
  base_url: "https://example.com"
  name: "Jane Doe"
  redirects:
    - source: "/resume"
      destination: "/about"
      permanent: true
chat:
  fallback_reply: "Try again later."
events:
  prefix: "site"
  page_logging: true
"#;

fn load(contents: &str) -> (tempfile::TempDir, Config) {
    let (dir, path) = temp_config_file(contents);
    let mut config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    config.chat.knowledge_path = dir.path().join("page-content.json");
    config.chat.api_key = None;
    config.events.redis_url = None;
    (dir, config)
}

#[tokio::test]
async fn test_config_file_drives_router() {
    let (_dir, config) = load(CONFIG);
    config.validate().unwrap();
    assert_eq!(config.site.redirects.len(), 1);

    let state = AppState::from_config(config).unwrap();
    assert!(state.generator.is_none());
    let router = build_router(state);

    let redirect = send(&router, get("/resume")).await;
    assert_eq!(redirect.status, StatusCode::PERMANENT_REDIRECT);

    let chat = send(
        &router,
        json_request(
            "POST",
            "/api/chat",
            &json!({"messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;
    assert_eq!(chat.status, StatusCode::OK);
    assert_eq!(chat.json()["message"], "Try again later.");

    let track = send(
        &router,
        json_request("POST", "/api/track", &json!({"sessionId": "s1", "path": "/"})),
    )
    .await;
    assert_eq!(track.json()["logged"], true);
}

#[tokio::test]
async fn test_knowledge_file_is_served() {
    let (_dir, config) = load(CONFIG);
    write_page_content(
        &config.chat.knowledge_path,
        &[PageContent {
            page_id: "1a7e021d4ed242e1ab769b9e92308bb0".to_string(),
            slug: "/".to_string(),
            title: "Home".to_string(),
            content: "Welcome to my site".to_string(),
        }],
    )
    .unwrap();

    let router = build_router(AppState::from_config(config).unwrap());
    let response = send(&router, get("/api/knowledge")).await;
    let body = response.json();
    assert_eq!(body["pages"][0]["content"], "Welcome to my site");
    assert_eq!(body["pageUrls"]["home"], "/");
    assert!(body["systemPrompt"].as_str().unwrap().contains("Jane Doe"));
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let (_dir, path) = temp_config_file("site: [unclosed");
    let err = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}
