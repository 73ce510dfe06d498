use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chirp_realtime::{BroadcastRouter, ConnectionRegistry};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use crate::config::ServerConfig;
use crate::db::{Database, FriendStore, MigrationRunner, UserStore};

mod routes;

/// Server application state
pub struct AppState {
    /// Shared database handle
    pub db: Database,
    /// User credential store
    pub users: UserStore,
    /// Friend-list store
    pub friends: FriendStore,
    /// Active chat connections
    pub registry: Arc<ConnectionRegistry>,
    /// Fan-out router over the registry
    pub broadcast: BroadcastRouter,
}

impl AppState {
    pub fn new(db: Database, max_connections: usize) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(max_connections));
        let broadcast = BroadcastRouter::new(Arc::clone(&registry));
        Self {
            users: UserStore::new(db.clone()),
            friends: FriendStore::new(db.clone()),
            db,
            registry,
            broadcast,
        }
    }
}

/// Start the HTTP/WebSocket server
pub async fn start(config: ServerConfig) -> Result<()> {
    let db = match &config.db_path {
        Some(path) => Database::open_local("chirp", path).await?,
        None => Database::in_memory("chirp").await?,
    };
    MigrationRunner::schema().run(&db).await?;

    let state = Arc::new(AppState::new(db, config.max_connections));
    let app = create_router(state);

    info!("Starting Axum HTTP server on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

/// Create the Axum router with all routes and middleware
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .merge(routes::auth::router(state.clone()))
        .merge(routes::users::router(state.clone()))
        .merge(routes::friends::router(state.clone()))
        .merge(routes::websocket::router(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

/// GET / - liveness banner
async fn root_handler() -> &'static str {
    "Chirp backend is alive"
}

/// Health check endpoint (for load balancers)
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "service": "chirp-server",
                "version": env!("CARGO_PKG_VERSION"),
                "connections": state.registry.connection_count(),
            })),
        ),
        Ok(false) => {
            warn!("Health check: database unhealthy");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "chirp-server",
                    "version": env!("CARGO_PKG_VERSION"),
                    "error": "database unhealthy"
                })),
            )
        }
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "chirp-server",
                    "version": env!("CARGO_PKG_VERSION"),
                    "error": format!("database error: {}", e)
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    pub(crate) async fn create_test_state() -> Arc<AppState> {
        let db = Database::in_memory("test").await.unwrap();
        MigrationRunner::schema().run(&db).await.unwrap();
        Arc::new(AppState::new(db, 64))
    }

    pub(crate) fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub(crate) async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let state = create_test_state().await;
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Chirp backend is alive");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = create_test_state().await;
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "chirp-server");
        assert_eq!(json["connections"], 0);
    }

    #[tokio::test]
    async fn test_signup_login_search_friends_flow() {
        let state = create_test_state().await;
        let app = create_router(state);

        // Signup two users
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/signup",
                serde_json::json!({"username": "alice", "password": "hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/signup",
                serde_json::json!({"username": "bob", "password": "pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Login
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/login",
                serde_json::json!({"username": "alice", "password": "hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["username"], "alice");

        // Search
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/users/search?q=AL")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["users"][0]["username"], "alice");

        // Add and list friends
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/friends",
                serde_json::json!({"username": "alice", "friend": "bob"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/friends/alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["friends"], serde_json::json!(["bob"]));
    }
}
