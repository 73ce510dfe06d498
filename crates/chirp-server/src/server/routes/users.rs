//! Username search route.
//!
//! - GET /api/users/search?q= - Case-insensitive substring search, at most
//!   10 results. An empty (or missing) query matches everyone.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use super::ErrorResponse;
use crate::server::AppState;

/// Create the users router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/users/search", get(search_handler))
        .with_state(state)
}

/// Query parameters for the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring to match against usernames
    #[serde(default)]
    pub q: String,
}

/// A user as returned by search
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

/// Response for the search endpoint
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub users: Vec<UserSummary>,
    pub total: usize,
}

/// GET /api/users/search
#[instrument(skip(state), fields(query = %params.q))]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> impl IntoResponse {
    match state.users.search_users(&params.q).await {
        Ok(users) => {
            let users: Vec<UserSummary> = users
                .into_iter()
                .map(|u| UserSummary {
                    id: u.id,
                    username: u.username,
                })
                .collect();
            let total = users.len();
            (StatusCode::OK, Json(SearchResponse { users, total })).into_response()
        }
        Err(e) => {
            error!(error = %e, "Search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("database_error", &e.to_string())),
            )
                .into_response()
        }
    }
}
