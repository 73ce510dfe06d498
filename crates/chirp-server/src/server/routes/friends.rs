//! Friend-list routes.
//!
//! - POST /api/friends - Add a friend link and return the updated list
//! - GET /api/friends/:username - List a user's friends

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use super::ErrorResponse;
use crate::db::FriendStoreError;
use crate::server::AppState;

/// Create the friends router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/friends", post(add_friend_handler))
        .route("/api/friends/:username", get(list_friends_handler))
        .with_state(state)
}

/// Request body for adding a friend
#[derive(Debug, Deserialize)]
pub struct AddFriendRequest {
    /// The user whose list is being extended
    pub username: String,
    /// The username to add
    pub friend: String,
}

/// Response carrying a friend list
#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<String>,
    pub total: usize,
}

fn friend_error_to_response(err: FriendStoreError) -> (StatusCode, Json<ErrorResponse>) {
    match &err {
        FriendStoreError::UnknownUser(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("user_not_found", &err.to_string())),
        ),
        FriendStoreError::QueryFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("database_error", &err.to_string())),
        ),
    }
}

/// POST /api/friends
#[instrument(skip(state, request), fields(user = %request.username, friend = %request.friend))]
pub async fn add_friend_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddFriendRequest>,
) -> impl IntoResponse {
    if let Err(e) = state
        .friends
        .add_friend(&request.username, &request.friend)
        .await
    {
        warn!(error = %e, "Add friend rejected");
        return friend_error_to_response(e).into_response();
    }

    match state.friends.list_friends(&request.username).await {
        Ok(friends) => {
            info!(total = friends.len(), "Friend added");
            let total = friends.len();
            (StatusCode::OK, Json(FriendsResponse { friends, total })).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to read back friend list");
            friend_error_to_response(e).into_response()
        }
    }
}

/// GET /api/friends/:username
#[instrument(skip(state), fields(user = %username))]
pub async fn list_friends_handler(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    match state.friends.list_friends(&username).await {
        Ok(friends) => {
            let total = friends.len();
            (StatusCode::OK, Json(FriendsResponse { friends, total })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "List friends rejected");
            friend_error_to_response(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::tests::{create_test_state, json_request, response_json};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_add_then_list() {
        let state = create_test_state().await;
        state.users.create_user("alice", "x").await.unwrap();
        state.users.create_user("bob", "x").await.unwrap();
        let app = router(state);

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
        let json = response_json(response).await;
        assert_eq!(json["friends"], serde_json::json!(["bob"]));
        assert_eq!(json["total"], 1);

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

    #[tokio::test]
    async fn test_unknown_user_is_404() {
        let state = create_test_state().await;
        state.users.create_user("alice", "x").await.unwrap();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/friends",
                serde_json::json!({"username": "alice", "friend": "ghost"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["error"], "user_not_found");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/friends/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
