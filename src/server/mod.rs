//! # HTTP Export Endpoint
//!
//! A thin axum layer over the export engine and batch driver.
//!
//! ## Usage
//!
//! ```bash
//! labelpress serve --listen 0.0.0.0:8080 --token s3cret
//! ```
//!
//! ## Routes
//!
//! | Method | Path                  | Description                          |
//! |--------|-----------------------|--------------------------------------|
//! | GET    | `/health`             | Liveness                             |
//! | GET    | `/api/labels`         | Label catalog                        |
//! | GET    | `/api/labels/:id`     | One label                            |
//! | POST   | `/api/export`         | Design → PDF/PNG/JPEG attachment     |
//! | POST   | `/api/preview`        | Design → inline PNG                  |
//! | POST   | `/api/batch`          | Template + rows → persisted artifacts|
//! | GET    | `/api/artifacts/:id`  | Download a persisted artifact        |

pub mod auth;
mod handlers;
mod state;

pub use handlers::ApiError;
pub use state::{AppState, IMAGE_CACHE_TTL_SECS, ServerConfig};

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use crate::error::LabelError;

/// Request bodies carry whole designs; allow up to 10MB.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/labels", get(handlers::labels::list))
        .route("/api/labels/:id", get(handlers::labels::get))
        .route("/api/export", post(handlers::export::export))
        .route("/api/preview", post(handlers::export::preview))
        .route("/api/batch", post(handlers::batch::run))
        .route("/api/artifacts/:id", get(handlers::artifacts::download))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use labelpress::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), labelpress::LabelError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), LabelError> {
    let state = Arc::new(AppState::new(config.clone())?);

    tokio::spawn(cleanup_caches(state.clone()));

    let app = router(state);

    log::info!("labelpress HTTP server listening on {}", config.listen_addr);
    if config.tokens.is_empty() {
        log::warn!("no API tokens configured; accepting anonymous requests");
    }

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| LabelError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| LabelError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task dropping decoded images nobody has used in a while and
/// batch artifacts past their TTL.
async fn cleanup_caches(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));

    loop {
        interval.tick().await;
        sweep_expired(&state, Utc::now()).await;
    }
}

/// One cleanup pass. Returns `(images, artifacts)` removed.
async fn sweep_expired(state: &AppState, now: DateTime<Utc>) -> (usize, usize) {
    let images = &state.engine.assets().images;
    let removed_images = images.evict_older_than(Duration::from_secs(IMAGE_CACHE_TTL_SECS));
    if removed_images > 0 {
        log::info!(
            "cleaned up {} expired image cache entries ({} remaining)",
            removed_images,
            images.len()
        );
    }

    let ttl = chrono::Duration::seconds(state.config.artifact_ttl_secs.min(i32::MAX as u64) as i64);
    let cutoff = now.checked_sub_signed(ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let removed_artifacts = match state.store.evict_artifacts_before(cutoff).await {
        Ok(n) => n,
        Err(e) => {
            log::warn!("artifact cleanup failed: {}", e);
            0
        }
    };
    if removed_artifacts > 0 {
        log::info!("cleaned up {} expired batch artifacts", removed_artifacts);
    }
    (removed_images, removed_artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetContext, BarcodeSymbols, MemoryImageSource};
    use crate::document::{Document, Element};
    use crate::export::ExportEngine;
    use crate::store::{DesignStore, MemoryStore};
    use auth::{AllowAnonymous, StaticTokens};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn engine() -> ExportEngine {
        ExportEngine::new(AssetContext::new(
            Arc::new(MemoryImageSource::new()),
            Arc::new(BarcodeSymbols),
        ))
    }

    fn app_with(store: MemoryStore, tokens: &[&str]) -> Router {
        let sessions: Arc<dyn auth::SessionProvider> = if tokens.is_empty() {
            Arc::new(AllowAnonymous)
        } else {
            Arc::new(StaticTokens::new(tokens.iter().map(|t| t.to_string())))
        };
        let state = AppState::with_parts(
            ServerConfig {
                max_batch_rows: 5,
                ..Default::default()
            },
            engine(),
            Arc::new(store),
            sessions,
        );
        router(Arc::new(state))
    }

    fn app() -> Router {
        app_with(MemoryStore::new(), &[])
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn inline_design() -> Value {
        json!({
            "width_px": 406, "height_px": 203,
            "elements": [
                { "type": "text", "x": 10, "y": 10, "width": 200, "height": 30,
                  "properties": { "content": "Hello" } }
            ]
        })
    }

    #[tokio::test]
    async fn test_sweep_expires_batch_artifacts() {
        let store = MemoryStore::new();
        let state = AppState::with_parts(
            ServerConfig {
                artifact_ttl_secs: 600,
                ..Default::default()
            },
            engine(),
            Arc::new(store.clone()),
            Arc::new(AllowAnonymous),
        );
        let saved = store.save_artifact("a.png", "image/png", vec![1, 2, 3]).await.unwrap();

        assert_eq!(sweep_expired(&state, Utc::now()).await, (0, 0));
        assert!(store.load_artifact(&saved.id).await.is_ok());

        let later = Utc::now() + chrono::Duration::seconds(601);
        assert_eq!(sweep_expired(&state, later).await, (0, 1));
        assert_eq!(store.artifact_count().await, 0);
    }

    #[tokio::test]
    async fn test_file_urls_never_reach_the_disk() {
        let path = std::env::temp_dir().join(format!("labelpress-server-{}.png", std::process::id()));
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        let app = router(Arc::new(AppState::new(ServerConfig::default()).unwrap()));

        let body = json!({
            "width_px": 100, "height_px": 100, "format": "png",
            "elements": [
                { "type": "image", "x": 10, "y": 10, "width": 40, "height": 40,
                  "properties": { "src": format!("file://{}", path.display()) } }
            ]
        });
        let response = app.oneshot(post_json("/api/export", body)).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-degraded-elements"], "1");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let png = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_ne!(png.get_pixel(30, 30), &image::Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_labels() {
        let response = app()
            .oneshot(Request::get("/api/labels/4x6").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let label = json_body(response).await;
        assert_eq!(label["id"], "4x6");

        let response = app()
            .oneshot(Request::get("/api/labels/9x9").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_export_pdf_attachment() {
        let mut body = inline_design();
        body["format"] = json!("pdf");
        body["dpi"] = json!(300);
        body["name"] = json!("Shelf tag");
        let response = app().oneshot(post_json("/api/export", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Shelf-tag.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_missing_elements() {
        let body = json!({ "width_px": 406, "height_px": 203, "format": "png" });
        let response = app().oneshot(post_json("/api/export", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "InvalidDesignData");
    }

    #[tokio::test]
    async fn test_export_unknown_element_type() {
        let body = json!({
            "width_px": 406, "height_px": 203,
            "elements": [{ "type": "sticker", "x": 0, "y": 0, "width": 5, "height": 5 }]
        });
        let response = app().oneshot(post_json("/api/export", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "InvalidDesignData");
    }

    #[tokio::test]
    async fn test_export_unsupported_format_and_dpi() {
        let mut body = inline_design();
        body["format"] = json!("svg");
        let response = app().oneshot(post_json("/api/export", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "UnsupportedFormat");

        let mut body = inline_design();
        body["dpi"] = json!(600);
        let response = app().oneshot(post_json("/api/export", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "UnsupportedDpi");
    }

    #[tokio::test]
    async fn test_export_requires_token_when_configured() {
        let app = app_with(MemoryStore::new(), &["s3cret"]);
        let response = app
            .clone()
            .oneshot(post_json("/api/export", inline_design()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthorized");

        let mut request = post_json("/api/export", inline_design());
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_export_stored_document() {
        let store = MemoryStore::new();
        let doc = Document {
            label_id: Some("2x1".into()),
            ..Default::default()
        }
        .with_element(Element::text(0.0, 0.0, 100.0, 20.0, "stored"));
        store.put_document("doc-1", doc).await;
        let app = app_with(store, &[]);

        let response = app
            .clone()
            .oneshot(post_json("/api/preview", json!({ "document_id": "doc-1", "dpi": 203 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let response = app
            .oneshot(post_json("/api/export", json!({ "document_id": "missing" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_persists_artifacts() {
        let app = app();
        let body = json!({
            "template": {
                "label_id": "2x1",
                "elements": [
                    { "type": "text", "x": 5, "y": 5, "width": 200, "height": 30,
                      "properties": { "content": "{{sku}}" } },
                    { "type": "image", "x": 5, "y": 40, "width": 40, "height": 40,
                      "properties": { "src": "{{img}}" } }
                ]
            },
            "rows": [
                { "sku": "A-1", "img": "" },
                { "sku": "A-2", "img": "https://nowhere/x.png" }
            ],
            "format": "png"
        });
        let response = app.clone().oneshot(post_json("/api/batch", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = json_body(response).await;
        assert_eq!(summary["total"], 2);
        assert_eq!(summary["status"], "failed");
        assert_eq!(summary["rows"][1]["error"], "AssetUnresolved");
    }

    #[tokio::test]
    async fn test_batch_row_limit() {
        let rows: Vec<Value> = (0..6).map(|i| json!({ "n": i })).collect();
        let body = json!({ "template": inline_design(), "rows": rows });
        let response = app().oneshot(post_json("/api/batch", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "BatchTooLarge");
    }

    #[tokio::test]
    async fn test_batch_then_download() {
        let app = app();
        let body = json!({
            "template": inline_design(),
            "rows": [{ "n": 1 }],
            "format": "png"
        });
        let response = app.clone().oneshot(post_json("/api/batch", body)).await.unwrap();
        let summary = json_body(response).await;
        assert_eq!(summary["status"], "success");
        let id = summary["rows"][0]["artifact"]["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::get(format!("/api/artifacts/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }
}
