//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: registration, token issuance and password change.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use grocery_core::{NewAccount, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::{AppState, CurrentAccount};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl RegisterRequest {
    /// Checks required fields and normalizes the optional ones.
    pub fn validate(self) -> Result<NewAccount, ApiError> {
        let email = required("email", self.email)?;
        if !email.contains('@') {
            return Err(ApiError::Validation("email is not a valid address".to_string()));
        }
        let password = required_secret("password", self.password)?;

        Ok(NewAccount {
            email,
            password,
            first_name: optional(self.first_name),
            last_name: optional(self.last_name),
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{} is required", field)))
}

// Passwords are taken verbatim; only emptiness is checked.
fn required_secret(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{} is required", field)))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new account and return its first token
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Missing field or email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new_account = json_body(payload)?.validate()?;

    let (_, token) = state
        .credentials
        .register(&new_account)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Port(PortError::Conflict(_)) => {
                ApiError::Validation("email is already registered".to_string())
            }
            other => other,
        })?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// GET /token - Issue a fresh token and record a login
#[utoipa::path(
    get,
    path = "/token",
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Authentication failed", body = ErrorBody)
    ),
    security(("basic" = []), ("bearer" = []))
)]
pub async fn token_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.credentials.issue_token(account.id).await?;
    info!(account_id = account.id, "Issued token");
    Ok(Json(TokenResponse { token }))
}

/// PUT /password - Replace the password of the authenticated account
#[utoipa::path(
    put,
    path = "/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Missing field", body = ErrorBody),
        (status = 401, description = "Authentication failed", body = ErrorBody)
    ),
    security(("basic" = []), ("bearer" = []))
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let req = json_body(payload)?;
    let current_password = required_secret("current_password", req.current_password)?;
    let new_password = required_secret("new_password", req.new_password)?;

    state
        .credentials
        .change_password(account.id, &current_password, &new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
