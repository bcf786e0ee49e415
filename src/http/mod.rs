//! HTTP surface: server assembly, admission middleware, auth endpoints.

mod admission;
mod auth;
mod server;

pub use admission::{derive_client_id, EXEMPT_PATHS};
pub use auth::CurrentUser;
pub use server::{AppState, HttpServer};

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::DoormanError;

impl IntoResponse for DoormanError {
    fn into_response(self) -> Response {
        match self {
            DoormanError::QuotaExceeded {
                limit,
                retry_after_secs,
            } => {
                let body = json!({
                    "detail": "Rate limit exceeded. Please try again later."
                });
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert("x-ratelimit-limit", limit.into());
                headers.insert("x-ratelimit-remaining", 0u32.into());
                headers.insert("x-ratelimit-reset", retry_after_secs.into());
                headers.insert(header::RETRY_AFTER, retry_after_secs.into());
                response
            }
            // Credential and identity failures are deliberately
            // indistinguishable on the wire.
            DoormanError::InvalidCredential
            | DoormanError::IdentityNotFound
            | DoormanError::IdentityInactive => {
                let body = json!({ "detail": "Could not validate credentials" });
                (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Bearer")],
                    Json(body),
                )
                    .into_response()
            }
            DoormanError::Config(_) | DoormanError::Io(_) => {
                let body = json!({ "detail": "Internal server error" });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
