//! HTTP API.
//!
//! JSON endpoints for ingesting videos, chatting about them and managing users.

mod error;
mod handlers;

pub use error::{status_for, ApiError};

use crate::orchestrator::Orchestrator;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state.
pub type AppState = Arc<Orchestrator>;

/// Build the router with CORS and request tracing.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/url", post(handlers::ingest))
        .route("/get-url/{user_id}", get(handlers::list_videos))
        .route("/chat/{user_id}/{video_id}", post(handlers::chat))
        .route("/chat-history/{user_id}/{video_id}", get(handlers::chat_history))
        .route("/users", post(handlers::create_user).get(handlers::list_users))
        .route("/users/{id}", get(handlers::get_user))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Serve the API until Ctrl+C.
pub async fn serve(state: AppState, host: &str, port: u16) -> crate::error::Result<()> {
    let app = router(state.clone(), &state.settings().server.cors_origins);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{test_orchestrator, OTHER_VIDEO, VIDEO};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = Arc::new(test_orchestrator(Arc::default()));
        router(state, &["http://localhost:5173".to_string()])
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create_user(app: &Router, email: &str) -> i64 {
        let (status, body) = send(
            app,
            Method::POST,
            "/users",
            Some(json!({ "name": "Ada", "email": email, "password": "hunter2hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_user_endpoints() {
        let app = app();
        let id = create_user(&app, "ada@example.com").await;

        let (status, body) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("password_hash").is_none());

        let (status, body) = send(
            &app,
            Method::POST,
            "/users",
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "hunter2hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "already_exists");

        let (status, body) = send(&app, Method::GET, "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, Method::GET, "/users/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "user_not_found");
    }

    #[tokio::test]
    async fn test_ingest_then_chat() {
        let app = app();
        let id = create_user(&app, "ada@example.com").await;
        let url = format!("https://www.youtube.com/watch?v={}", VIDEO);

        let (status, body) = send(&app, Method::POST, "/url", Some(json!({ "URL": url, "Id": id }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video_info"]["video_id"], VIDEO);
        assert_eq!(body["video_info"]["user_id"], id);
        assert!(body.get("message").is_none());

        let (status, body) = send(&app, Method::POST, "/url", Some(json!({ "url": url, "id": id }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Video already exists");

        let (status, body) = send(&app, Method::GET, &format!("/get-url/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let chat_uri = format!("/chat/{}/{}", id, VIDEO);
        let (status, body) = send(&app, Method::POST, &chat_uri, Some(json!({ "Query": "What is it about?" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "It is about never giving you up.");

        let history_uri = format!("/chat-history/{}/{}", id, VIDEO);
        let (status, body) = send(&app, Method::GET, &history_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let messages = body.as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "What is it about?");
        assert_eq!(messages[1]["role"], "assistant");
        assert!(messages[1].get("created_at").is_some());
    }

    #[tokio::test]
    async fn test_error_responses() {
        let app = app();
        let id = create_user(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/url",
            Some(json!({ "URL": "https://vimeo.com/12345", "Id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_url");

        let (status, body) = send(&app, Method::POST, "/url", Some(json!({ "URL": OTHER_VIDEO, "Id": id }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "transcript_unavailable");

        let (status, body) = send(&app, Method::POST, "/url", Some(json!({ "URL": VIDEO }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/chat/{}/{}", id, VIDEO),
            Some(json!({ "Query": "Hello?" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "video_not_found");

        let (status, body) = send(&app, Method::GET, "/get-url/not-a-number", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }
}
