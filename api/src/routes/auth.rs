use std::sync::LazyLock;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stacktutor_core::auth;

use crate::error::{AppError, on_unique_violation};
use crate::state::AppState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub fn register_router() -> Router<AppState> {
    Router::new().route("/api/v1/auth/register", post(register))
}

pub fn login_router() -> Router<AppState> {
    Router::new().route("/api/v1/auth/login", post(login))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Validation error or email already registered", body = stacktutor_core::error::ApiError)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !EMAIL_RE.is_match(&req.email) {
        return Err(AppError::Validation {
            message: "email is not a valid address".to_string(),
            field: Some("email".to_string()),
            received: Some(serde_json::Value::String(req.email.clone())),
            docs_hint: None,
        });
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation {
            message: "password must be at least 8 characters".to_string(),
            field: Some("password".to_string()),
            received: None,
            docs_hint: None,
        });
    }

    let password_hash = auth::hash_password(&req.password).map_err(AppError::Internal)?;
    let user_id = Uuid::now_v7();

    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&req.email)
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(|e| {
            on_unique_violation(
                e,
                AppError::Conflict {
                    message: format!("Email '{}' is already registered", req.email),
                    field: Some("email".to_string()),
                    docs_hint: Some("Use a different email address, or log in.".to_string()),
                },
            )
        })?;

    tracing::info!(user_id = %user_id, "New user registered");

    let access_token = state.tokens.issue(user_id)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { access_token })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = stacktutor_core::error::ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    // Same error for unknown email and wrong password.
    let invalid_credentials = || AppError::Unauthorized {
        message: "Invalid email or password".to_string(),
        docs_hint: None,
    };

    let row: Option<(Uuid, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = $1")
            .bind(&req.email)
            .fetch_optional(&state.db)
            .await?;

    let (user_id, password_hash) = row.ok_or_else(invalid_credentials)?;

    let verified = auth::verify_password(&req.password, &password_hash)
        .map_err(AppError::Internal)?;
    if !verified {
        return Err(invalid_credentials());
    }

    let access_token = state.tokens.issue(user_id)?;
    Ok(Json(TokenResponse { access_token }))
}
