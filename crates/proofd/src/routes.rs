use crate::store::SettingsStore;
use hyper::body::{Body, HttpBody};
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use proofd_core::api::{self, ErrorBody, HealthResponse, SaveResponse};
use proofd_core::config::Config;
use proofd_core::event;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Largest settings document accepted by `POST /api/settings`.
pub const MAX_SETTINGS_BYTES: usize = 64 * 1024;

/// State shared by every connection.
pub struct AppState {
    store: Mutex<SettingsStore>,
}

impl AppState {
    pub fn new(store: SettingsStore) -> Self {
        Self { store: Mutex::new(store) }
    }
}

/// Top-level service: dispatch on method and path.
pub async fn handle(req: Request<Body>, state: Arc<AppState>) -> Result<Response<Body>, Infallible> {
    debug!(method = %req.method(), path = %req.uri().path(), "request");

    if req.method() == Method::OPTIONS {
        return Ok(preflight());
    }

    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();
    let response = match (&method, path.as_str()) {
        (&Method::GET, api::PATH_HEALTH) => json(
            StatusCode::OK,
            &HealthResponse { status: "healthy".into() },
        ),
        (&Method::GET, api::PATH_CONFIG) | (&Method::GET, api::PATH_SETTINGS) => {
            let config = state.store.lock().await.get();
            json(StatusCode::OK, &config)
        }
        (&Method::POST, api::PATH_SETTINGS) => save_settings(req, &state).await,
        (&Method::GET, api::PATH_MOCK_PURCHASE) => json(StatusCode::OK, &event::random_purchase()),
        (&Method::GET, p) if p.starts_with(api::PATH_MOCK_PURCHASES) => {
            match p[api::PATH_MOCK_PURCHASES.len()..].strip_prefix('/') {
                Some(segment) if !segment.contains('/') => {
                    let count = api::parse_mock_count(segment);
                    json(StatusCode::OK, &event::random_purchases(count))
                }
                _ => not_found(),
            }
        }
        _ => not_found(),
    };
    Ok(response)
}

async fn save_settings(req: Request<Body>, state: &AppState) -> Response<Body> {
    let body = match read_limited(req, MAX_SETTINGS_BYTES).await {
        Ok(body) => body,
        Err(details) => return save_failed(details),
    };
    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(e) => return save_failed(e.to_string()),
    };
    let config = match Config::from_json(text) {
        Ok(config) => config,
        Err(e) => return save_failed(e.to_string()),
    };

    match state.store.lock().await.put(&config) {
        Ok(()) => json(StatusCode::OK, &SaveResponse { success: true }),
        Err(e) => save_failed(e.to_string()),
    }
}

/// Collect a request body, giving up once it grows past `limit` bytes.
async fn read_limited(req: Request<Body>, limit: usize) -> Result<Vec<u8>, String> {
    let too_large = || format!("settings document exceeds {limit} bytes");

    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(too_large());
    }

    let mut body = req.into_body();
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        if bytes.len() + chunk.len() > limit {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn save_failed(details: String) -> Response<Body> {
    warn!(details = %details, "rejected settings");
    json(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorBody {
            error: "Failed to save settings".into(),
            details: Some(details),
        },
    )
}

fn not_found() -> Response<Body> {
    json(
        StatusCode::NOT_FOUND,
        &ErrorBody { error: "Not Found".into(), details: None },
    )
}

fn preflight() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    response
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    let (status, body, content_type) = match serde_json::to_vec(value) {
        Ok(bytes) => (status, bytes, "application/json"),
        Err(e) => {
            warn!(error = %e, "failed to encode response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                b"internal error".to_vec(),
                "text/plain",
            )
        }
    };
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofd_core::event::PurchaseEvent;
    use proofd_core::position::Position;

    fn state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        (dir, Arc::new(AppState::new(store)))
    }

    async fn call(state: &Arc<AppState>, method: Method, path: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = handle(req, Arc::clone(state)).await.unwrap();
        let status = resp.status();
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    // --- health ---

    #[tokio::test]
    async fn health_reports_healthy() {
        let (_dir, state) = state();
        let (status, body) = call(&state, Method::GET, "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    // --- settings ---

    #[tokio::test]
    async fn config_and_settings_serve_defaults_when_storage_missing() {
        let (_dir, state) = state();
        for path in ["/api/config", "/api/settings"] {
            let (status, body) = call(&state, Method::GET, path, "").await;
            assert_eq!(status, StatusCode::OK);
            let config: Config = serde_json::from_value(body).unwrap();
            assert_eq!(config, Config::default());
        }
    }

    #[tokio::test]
    async fn post_settings_persists() {
        let (_dir, state) = state();
        let mut config = Config::default();
        config.display.position = Position::BottomRight;
        let json_body = serde_json::to_string(&config).unwrap();

        let (status, body) = call(&state, Method::POST, "/api/settings", &json_body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = call(&state, Method::GET, "/api/settings", "").await;
        assert_eq!(body["display"]["position"], "bottom-right");
    }

    #[tokio::test]
    async fn post_settings_rejects_malformed_color() {
        let (_dir, state) = state();
        let body = r#"{ "style": { "textColor": { "hue": 0, "saturation": 0 } } }"#;
        let (status, body) = call(&state, Method::POST, "/api/settings", body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to save settings");
        assert!(body["details"].as_str().unwrap().contains("invalid settings"));
    }

    #[tokio::test]
    async fn post_settings_rejects_out_of_range_color() {
        let (_dir, state) = state();
        let body = r#"{ "style": { "backgroundColor": { "hue": 0, "saturation": 0, "brightness": 3, "alpha": 1 } } }"#;
        let (status, body) = call(&state, Method::POST, "/api/settings", body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["details"].as_str().unwrap().contains("style.backgroundColor.brightness"));
    }

    #[tokio::test]
    async fn post_settings_rejects_oversized_body() {
        let (_dir, state) = state();
        let padding = " ".repeat(MAX_SETTINGS_BYTES);
        let (status, body) = call(&state, Method::POST, "/api/settings", &format!("{{}}{padding}")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["details"].as_str().unwrap().contains("exceeds"));

        let (_, body) = call(&state, Method::GET, "/api/settings", "").await;
        let config: Config = serde_json::from_value(body).unwrap();
        assert_eq!(config, Config::default(), "nothing was stored");
    }

    #[tokio::test]
    async fn oversized_content_length_rejected_up_front() {
        let (_dir, state) = state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/settings")
            .header(CONTENT_LENGTH, MAX_SETTINGS_BYTES + 1)
            .body(Body::from("{}"))
            .unwrap();
        let resp = handle(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // --- mock purchases ---

    #[tokio::test]
    async fn mock_purchase_is_an_event() {
        let (_dir, state) = state();
        let (status, body) = call(&state, Method::GET, "/api/mock-purchase", "").await;
        assert_eq!(status, StatusCode::OK);
        let event: PurchaseEvent = serde_json::from_value(body).unwrap();
        assert!(event.price > 0.0);
    }

    #[tokio::test]
    async fn mock_purchases_honours_count() {
        let (_dir, state) = state();
        let (_, body) = call(&state, Method::GET, "/api/mock-purchases/3", "").await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mock_purchases_defaults_to_five() {
        let (_dir, state) = state();
        let (_, body) = call(&state, Method::GET, "/api/mock-purchases/lots", "").await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    // --- routing ---

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (_dir, state) = state();
        let (status, body) = call(&state, Method::GET, "/api/nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn options_is_a_cors_preflight() {
        let (_dir, state) = state();
        let (status, body) = call(&state, Method::OPTIONS, "/api/settings", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }
}
