//! jwtgate HTTP surface
//!
//! - `POST /authorise` trades a credential for a token (public)
//! - `GET  /health`    liveness (public)
//! - `GET  /me`        the authenticated principal
//! - anything else     bearer-gated, then 404
//!
//! Every protected path, including unknown ones, passes the bearer gate
//! first, so a missing token on a missing route is a 401, not a 404.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::AUTHORIZATION, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{AuthService, AuthenticationError, Credential, Error, Principal};

pub const MALFORMED_BODY: &str = "Malformed request body";
pub const RESOURCE_NOT_FOUND: &str = "Resource not found";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotFoundResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `{"message": ...}` with a fixed status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageResponse { message: self.message })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError::new(status, e.to_string())
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(e: AuthenticationError) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, e.to_string())
    }
}

// ============================================================================
// App State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth: AuthService) -> Self {
        AppState { auth: Arc::new(auth) }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn authorise(
    State(state): State<AppState>,
    payload: Result<Json<Credential>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(credential) = payload.map_err(|e| {
        tracing::debug!(error = %e, "unreadable authorise body");
        ApiError::new(StatusCode::BAD_REQUEST, MALFORMED_BODY)
    })?;
    let issued = state.auth.authorize(&credential).await?;
    Ok(Json(TokenResponse { token: issued.token }))
}

async fn me(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<NotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            status: StatusCode::NOT_FOUND.as_u16(),
            error: "Not Found".to_string(),
            message: RESOURCE_NOT_FOUND.to_string(),
            path: uri.path().to_string(),
        }),
    )
}

// ============================================================================
// Bearer gate
// ============================================================================

/// Verify the bearer token and attach the [`Principal`] to the request.
async fn require_token(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthenticationError::TokenInvalid))
        .transpose()?;
    let principal = state.auth.authenticate(header)?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(me))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health))
        .route("/authorise", post(authorise))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
