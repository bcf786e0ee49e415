//! Authentication endpoints and the bearer-token extractor.

use axum::extract::{FromRequestParts, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Role, SessionTokens, TokenClaims};
use crate::error::DoormanError;

use super::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Wire shape for both login and refresh responses.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl From<SessionTokens> for TokenResponse {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "bearer",
        }
    }
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, DoormanError> {
    let identity = state
        .sessions
        .authenticate(&body.email, &body.password)
        .await?
        .ok_or_else(|| {
            warn!("Login rejected");
            DoormanError::InvalidCredential
        })?;

    let tokens = state.sessions.issue_session(&identity)?;
    info!(user_id = %identity.id, "Login succeeded");
    Ok(Json(tokens.into()))
}

/// `POST /api/v1/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, DoormanError> {
    let tokens = state.sessions.renew_session(&body.refresh_token).await?;
    Ok(Json(tokens.into()))
}

/// Authenticated caller, extracted from the `Authorization` header.
///
/// Verification is stateless: the claims carry everything a handler needs,
/// so no storage lookup happens per request.
pub struct CurrentUser(pub TokenClaims);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = DoormanError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(DoormanError::InvalidCredential)?;

        let claims = state.sessions.verify_access(token)?;
        Ok(CurrentUser(claims))
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// `GET /api/v1/auth/me`
pub async fn me(CurrentUser(claims): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}
