use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::{User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::services::auth::AuthService;
use crate::services::defaults::ensure_default_records;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/password", put(change_password))
        .route("/logout", post(logout))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account, seed its default records and hand back a token.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    if UserRepository::find_by_email(&state.db, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "This email is already registered".to_string(),
        ));
    }

    let password_hash = AuthService::hash_password(&request.password)?;
    let user = UserRepository::create(&state.db, &email, &password_hash).await?;

    ensure_default_records(&state.db, &user.id).await?;

    let token = AuthService::create_jwt(&state, &user.id)?;

    tracing::info!("Registered new user: {}", user.id);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Verify credentials and hand back a token.
///
/// Also tops up any missing default records, so accounts created before a
/// change to the default set pick it up on their next login.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&request.email);

    // Single indistinct failure path for unknown email and wrong password.
    let user = UserRepository::find_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !AuthService::verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    ensure_default_records(&state.db, &user.id).await?;

    let token = AuthService::create_jwt(&state, &user.id)?;

    tracing::debug!("User logged in: {}", user.id);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Get current user info
async fn me(
    State(_state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(user.into()))
}

/// Change the current user's password after re-verifying the current one.
async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if !AuthService::verify_password(&request.current_password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }
    if request.new_password.is_empty() {
        return Err(AppError::Validation(
            "New password must not be empty".to_string(),
        ));
    }

    let password_hash = AuthService::hash_password(&request.new_password)?;
    UserRepository::update_password(&state.db, &user.id, &password_hash).await?;

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

/// Logout - invalidate session
async fn logout(State(_state): State<Arc<AppState>>) -> AppResult<Json<serde_json::Value>> {
    // Auth is stateless JWT; there is no server-side session to clear. The
    // endpoint exists so the frontend can call it without 404s and gives a
    // place to implement server-side invalidation (e.g. a token blacklist)
    // later if needed.
    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}

// ============================================================================
// Helper functions
// ============================================================================

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ============================================================================
// Auth Middleware / Extractor
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for authenticated user
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header (Bearer token)
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let user = AuthService::get_user_from_token(state, token)
            .await
            .map_err(|e| {
                tracing::debug!("Failed to get user from token: {:?}", e);
                e
            })?;

        Ok(AuthUser(user))
    }
}
