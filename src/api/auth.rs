use std::sync::Arc;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use crate::api::rest::ApiState;
use crate::telegram::SECRET_TOKEN_HEADER;

/// Rejects webhook calls that do not carry the registered secret.
/// Without a configured secret every call is let through.
pub async fn webhook_secret_middleware(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let provided = request.headers()
            .get(SECRET_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            tracing::warn!("Webhook call with a wrong secret token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    Ok(next.run(request).await)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_comparison() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
