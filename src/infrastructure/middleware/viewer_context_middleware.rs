// ViewerContext Middleware - resolves the bearer token into a request-scoped viewer

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::{app_state::AppState, error::AppError, infrastructure::viewer::ViewerContext};

/// Bearer token from the `Authorization` header, if well formed.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Unknown or revoked tokens fall back to an anonymous viewer, the same way an
/// expired session cookie would.
pub async fn viewer_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let request_id = format!("req-{}", Uuid::new_v4());

    let viewer = match extract_bearer_token(request.headers()) {
        Some(token) => match state.database.get_session_user(&token).await? {
            Some(user) => {
                debug!(request_id = %request_id, user = %user.username, "authenticated request");
                ViewerContext::authenticated_user(user, token, request_id)
            }
            None => {
                debug!(request_id = %request_id, "unknown session token");
                ViewerContext::anonymous(request_id)
            }
        },
        None => ViewerContext::anonymous(request_id),
    };

    request.extensions_mut().insert(Arc::new(viewer));

    Ok(next.run(request).await)
}
