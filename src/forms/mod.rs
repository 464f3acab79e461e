// Form validation - request bodies checked field by field before any write

pub mod comment_form;
pub mod content_rules;
pub mod post_form;
pub mod user_forms;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

pub use comment_form::CommentForm;
pub use content_rules::{ContentPolicy, ContentRule, DenylistRule};
pub use post_form::{CleanedPost, ImageUpload, PostForm, PostFormView};
pub use user_forms::{EditProfileForm, GroupForm, LoginForm, SignupForm};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// An empty body is an empty form, so it fails on required fields rather
/// than on parsing.
pub fn parse_form<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Malformed form body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_default_form() {
        let form: CommentForm = parse_form(&Bytes::new()).unwrap();
        assert!(form.text.is_empty());
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let err = parse_form::<CommentForm>(&Bytes::from_static(b"{text")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
