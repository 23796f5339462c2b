//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentAccount};

/// Middleware that resolves the `Authorization` credential to an account.
///
/// Accepts `Bearer <token>` or `Basic base64(token_or_email:password)`.
/// If valid, inserts a `CurrentAccount` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the authorization header
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Authentication)?;

    // 2. Split it into the credential slot
    let (token_or_email, password) =
        parse_authorization(authorization).ok_or(ApiError::Authentication)?;

    // 3. Token first, password fallback
    let account = state
        .credentials
        .resolve_slot(&token_or_email, password.as_deref())
        .await?
        .ok_or_else(|| {
            debug!("Rejected credential on {}", req.uri().path());
            ApiError::Authentication
        })?;

    // 4. Bind the account for the rest of the request
    req.extensions_mut().insert(CurrentAccount(account));

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

/// Returns the first slot field and the password, if one was sent.
fn parse_authorization(value: &str) -> Option<(String, Option<String>)> {
    let (scheme, rest) = value.trim().split_once(' ')?;
    let rest = rest.trim();

    if scheme.eq_ignore_ascii_case("bearer") {
        return (!rest.is_empty()).then(|| (rest.to_string(), None));
    }
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(rest).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = match decoded.split_once(':') {
        Some((user, password)) => (user, password),
        None => (decoded.as_str(), ""),
    };
    if user.is_empty() {
        return None;
    }

    let password = (!password.is_empty()).then(|| password.to_string());
    Some((user.to_string(), password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn bearer_carries_only_a_token() {
        assert_eq!(
            parse_authorization("Bearer abc.def"),
            Some(("abc.def".to_string(), None))
        );
        assert_eq!(
            parse_authorization("bearer abc.def"),
            Some(("abc.def".to_string(), None))
        );
        assert_eq!(parse_authorization("Bearer "), None);
    }

    #[test]
    fn basic_splits_user_and_password() {
        assert_eq!(
            parse_authorization(&basic("a@b.com:secret")),
            Some(("a@b.com".to_string(), Some("secret".to_string())))
        );
        // Passwords may themselves contain colons.
        assert_eq!(
            parse_authorization(&basic("a@b.com:se:cret")),
            Some(("a@b.com".to_string(), Some("se:cret".to_string())))
        );
    }

    #[test]
    fn basic_with_empty_password_is_a_token() {
        assert_eq!(
            parse_authorization(&basic("abc.def:")),
            Some(("abc.def".to_string(), None))
        );
        assert_eq!(
            parse_authorization(&basic("abc.def")),
            Some(("abc.def".to_string(), None))
        );
    }

    #[test]
    fn unusable_headers_are_rejected() {
        assert_eq!(parse_authorization("Digest abc"), None);
        assert_eq!(parse_authorization("Basic !!!not-base64"), None);
        assert_eq!(parse_authorization(&basic(":secret")), None);
        assert_eq!(parse_authorization("token-without-scheme"), None);
    }
}
