use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers;
use crate::services::{FilesystemBackend, RecordService, UploadStore};
use crate::view::EntityKind;

/// Shared handler state; cloning is cheap (pool and store are handles)
#[derive(Clone)]
pub struct AppState {
    pub records: RecordService,
}

impl AppState {
    /// Open the database and upload directory described by `config`
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = DatabaseManager::connect(&config.database).await?;

        let backend = FilesystemBackend::new(&config.storage.upload_dir);
        backend.ensure_dir().await?;
        info!("Storing uploads in {}", config.storage.upload_dir.display());

        Ok(Self {
            records: RecordService::new(pool, UploadStore::new(Arc::new(backend))),
        })
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health::get))
        .merge(api_routes())
        .merge(upload_routes())
        .fallback_service(ServeDir::new(&config.storage.public_dir))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn api_routes() -> Router<AppState> {
    use handlers::{clients, listing, policies};

    Router::new()
        .route("/api/policy-clients", get(listing::get))
        .route(EntityKind::Policy.collection_path(), axum::routing::post(policies::post))
        .route(EntityKind::Policy.item_route(), get(policies::get).put(policies::put))
        .route(EntityKind::Client.collection_path(), axum::routing::post(clients::post))
        .route(EntityKind::Client.item_route(), get(clients::get).put(clients::put))
}

fn upload_routes() -> Router<AppState> {
    Router::new().route("/uploads/:file", get(handlers::uploads::get))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config).await?;
    let router = app(state, config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("policy-desk listening on http://{}", bind_addr);

    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app(label: &str) -> (Router, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("policy-desk-app-{}-{}", label, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("public")).unwrap();
        std::fs::write(dir.join("public/index.html"), "<h1>policy desk</h1>").unwrap();

        let mut config = AppConfig::development();
        config.storage.upload_dir = dir.join("uploads");
        config.storage.public_dir = dir.join("public");
        config.api.max_request_size_bytes = 1024;
        config.api.enable_request_logging = false;

        let backend = FilesystemBackend::new(&config.storage.upload_dir);
        backend.ensure_dir().await.unwrap();
        let pool = DatabaseManager::in_memory().await.unwrap();
        let state = AppState {
            records: RecordService::new(pool, UploadStore::new(Arc::new(backend))),
        };
        (app(state, &config), dir)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_then_fetch_policy() {
        let (app, dir) = test_app("policy").await;

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/policies", json!({ "policy_number": "POL-1", "attended": true })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await, json!({ "id": 1 }));

        let response = app
            .oneshot(Request::get("/api/policies/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let policy = body_json(response).await;
        assert_eq!(policy["policy_number"], "POL-1");
        assert_eq!(policy["attended"], 1);
        assert!(policy["claim_number"].is_null());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let (app, dir) = test_app("limit").await;
        let padding = "x".repeat(4096);

        let response = app
            .oneshot(json_request(Method::POST, "/api/policies", json!({ "policy_number": padding })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn non_numeric_id_is_json_400() {
        let (app, dir) = test_app("bad-id").await;

        for uri in ["/api/policies/abc", "/api/clients/1x"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let content_type = response.headers().get("content-type").cloned();
            assert_eq!(content_type.as_ref().and_then(|v| v.to_str().ok()), Some("application/json"));
            let body = body_json(response).await;
            assert_eq!(body["error"], true);
            assert_eq!(body["code"], "BAD_REQUEST");
        }

        let response = app
            .oneshot(json_request(Method::PUT, "/api/policies/abc", json!({ "policy_number": "POL-1" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn static_root_serves_index() {
        let (app, dir) = test_app("static").await;

        let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>policy desk</h1>");

        let _ = std::fs::remove_dir_all(dir);
    }
}
