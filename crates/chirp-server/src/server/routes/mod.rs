// Route modules for the Chirp Server API
pub mod auth; // signup/login against the credential store
pub mod friends; // friend-list add/list
pub mod users; // username search
pub mod websocket; // broadcast chat channel

use serde::Serialize;

/// Error response shape shared by all JSON routes
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}
