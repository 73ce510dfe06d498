//! Signup and login routes.
//!
//! - POST /api/signup - Create an account
//! - POST /api/login - Check credentials
//!
//! Credentials are compared verbatim against the store; there is no
//! hashing and no session is issued on login.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use super::ErrorResponse;
use crate::db::UserStoreError;
use crate::server::AppState;

/// Create the auth router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/signup", post(signup_handler))
        .route("/api/login", post(login_handler))
        .with_state(state)
}

/// Request body for signup and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Response for a successful signup or login
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// User ID
    pub id: String,
    /// Username as stored
    pub username: String,
}

/// POST /api/signup
///
/// Create a new account. Fails with 409 when the username is taken.
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> impl IntoResponse {
    match state
        .users
        .create_user(&request.username, &request.password)
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, "User signed up");
            (
                StatusCode::CREATED,
                Json(AccountResponse {
                    id: user.id,
                    username: user.username,
                }),
            )
                .into_response()
        }
        Err(UserStoreError::UsernameTaken(name)) => {
            warn!("Signup rejected: username taken");
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new(
                    "username_taken",
                    &format!("username already taken: {}", name),
                )),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Signup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("database_error", &e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/login
///
/// Check a username/password pair. Returns 401 for unknown usernames and
/// wrong passwords alike.
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> impl IntoResponse {
    match state
        .users
        .verify_credentials(&request.username, &request.password)
        .await
    {
        Ok(Some(user)) => {
            info!(user_id = %user.id, "User logged in");
            (
                StatusCode::OK,
                Json(AccountResponse {
                    id: user.id,
                    username: user.username,
                }),
            )
                .into_response()
        }
        Ok(None) => {
            warn!("Login rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "invalid_credentials",
                    "unknown username or wrong password",
                )),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Login failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("database_error", &e.to_string())),
            )
                .into_response()
        }
    }
}
