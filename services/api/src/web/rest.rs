//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the account REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorBody};
use crate::web::auth::{
    self, ChangePasswordRequest, RegisterRequest, TokenResponse,
};
use crate::web::state::{AppState, CurrentAccount};
use axum::{extract::State, response::Json, Extension};
use serde::Serialize;
use std::sync::Arc;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::token_handler,
        auth::change_password_handler,
        profile_handler,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            ChangePasswordRequest,
            TokenResponse,
            ProfileResponse,
            ErrorBody
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Grocery List API", description = "Account registration, tokens and profile.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// The authenticated account plus its login heatmap.
#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    first_name: Option<String>,
    last_name: Option<String>,
    email: String,
    /// Distinct days of the year (UTC) on which a token was issued, ascending.
    heatmap: Vec<u32>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Profile of the authenticated account.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile with login heatmap", body = ProfileResponse),
        (status = 401, description = "Authentication failed", body = ErrorBody)
    ),
    security(("basic" = []), ("bearer" = []))
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let heatmap = state.credentials.login_days(account.id).await?;

    Ok(Json(ProfileResponse {
        first_name: account.first_name,
        last_name: account.last_name,
        email: account.email,
        heatmap: heatmap.into_iter().collect(),
    }))
}
