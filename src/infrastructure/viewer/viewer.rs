use crate::error::{AppError, AppResult};
use crate::models::User;

/// Who is making the current request.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user: Option<User>,
    /// Bearer token the user authenticated with, kept for logout.
    pub session_token: Option<String>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            request_id,
            user: None,
            session_token: None,
        }
    }

    pub fn authenticated_user(user: User, session_token: String, request_id: String) -> Self {
        Self {
            request_id,
            user: Some(user),
            session_token: Some(session_token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    /// The signed-in user, or a redirect to the login page returning to `next`.
    pub fn require_user(&self, next: &str) -> AppResult<&User> {
        self.user.as_ref().ok_or_else(|| AppError::LoginRequired {
            next: next.to_string(),
        })
    }
}
