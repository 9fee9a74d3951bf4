use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use folio::chat::prompts::persona_prompt;
use folio::chat::ScriptedGenerator;
use folio::config::Config;
use folio::content::{Knowledge, PageContent};
use folio::events::MemoryEventStore;
use folio::notion::FakeSource;
use folio::server::{build_router, AppState};

pub const ADMIN_PASSWORD: &str = "admin-pw";
pub const WRITE_PASSWORD: &str = "write-pw";
pub const PREFIX: &str = "test";

/// Router over fakes, with handles to inspect them
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub source: Arc<FakeSource>,
    pub generator: Arc<ScriptedGenerator>,
    pub events: Arc<MemoryEventStore>,
}

/// Response pieces
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.site.root_page_id = "root".to_string();
    config.site.base_url = "https://example.com".to_string();
    config.site.name = "Test Owner".to_string();
    config.events.prefix = PREFIX.to_string();
    config.admin.password = Some(ADMIN_PASSWORD.to_string());
    config.admin.write_password = Some(WRITE_PASSWORD.to_string());
    config.admin.revalidate_secret = Some("reval".to_string());
    config.admin.rebuild_token = Some("rebuild".to_string());
    config
}

/// Home
/// ├── Reading
/// │   ├── Google Cardboard
/// │   ├── My Trip
/// │   └── My Trip
/// └── About
#[allow(dead_code)]
pub fn site_source() -> FakeSource {
    let source = FakeSource::new();
    source.add_page("root", "Home", &[("reading", "Reading"), ("about", "About")]);
    source.add_page(
        "reading",
        "Reading",
        &[
            ("cardboard", "Google Cardboard"),
            ("trip1", "My Trip"),
            ("trip2", "My Trip"),
        ],
    );
    source.add_page("about", "About", &[]);
    source.add_page("cardboard", "Google Cardboard", &[]);
    source.add_page("trip1", "My Trip", &[]);
    source.add_page("trip2", "My Trip", &[]);
    source
}

#[allow(dead_code)]
pub fn test_knowledge() -> Knowledge {
    Knowledge::new(
        persona_prompt("Test Owner"),
        vec![PageContent {
            page_id: "cardboard".to_string(),
            slug: "reading/google-cardboard".to_string(),
            title: "Google Cardboard".to_string(),
            content: "Cardboard is a VR viewer".to_string(),
        }],
    )
}

#[allow(dead_code)]
pub fn app_with(config: Config, source: FakeSource) -> TestApp {
    let source = Arc::new(source);
    let generator = Arc::new(ScriptedGenerator::new());
    let events = Arc::new(MemoryEventStore::new());
    let state = AppState::new(
        config,
        source.clone(),
        Some(generator.clone()),
        events.clone(),
        test_knowledge(),
    )
    .expect("state builds");
    TestApp {
        router: build_router(state.clone()),
        state,
        source,
        generator,
        events,
    }
}

#[allow(dead_code)]
pub fn app() -> TestApp {
    app_with(test_config(), site_source())
}

#[allow(dead_code)]
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable")
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn with_header(mut request: Request<Body>, name: &'static str, value: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(name, value.parse().expect("valid header value"));
    request
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
