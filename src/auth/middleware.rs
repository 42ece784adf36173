use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::Principal;
use crate::services::user;
use crate::AppState;

const EXTERNAL_ID_HEADER: &str = "X-User-Id";

/// Standing in for real third-party init-data validation (explicitly out of
/// scope): trusts an already-authenticated external id passed in a header,
/// resolves it to the internal user row (creating one on first sight), and
/// inserts `Principal::User` into the request extensions.
pub async fn user_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let external_id = request
        .headers()
        .get(EXTERNAL_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let internal_user = user::find_or_create_by_external_id(&state.db.pool, external_id)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    request
        .extensions_mut()
        .insert(Principal::User { user_id: internal_user.id });
    Ok(next.run(request).await)
}

/// Operator routes: compares `Authorization: Bearer <token>` against the
/// configured admin token in constant time.
pub async fn operator_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.strip_prefix("Bearer ").ok_or(StatusCode::UNAUTHORIZED)?;

    if !constant_time_eq(token.as_bytes(), state.config.admin_token.as_bytes()) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(Principal::Operator);
    Ok(next.run(request).await)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_equal_tokens() {
        assert!(constant_time_eq(b"secret", b"secret"));
    }

    #[test]
    fn constant_time_eq_rejects_different_lengths() {
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }

    #[test]
    fn constant_time_eq_rejects_different_content() {
        assert!(!constant_time_eq(b"secret", b"SECRET"));
    }
}
