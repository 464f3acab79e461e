use serde::Deserialize;

use crate::error::{AppResult, FormErrors};
use crate::forms::content_rules::ContentPolicy;

use super::REQUIRED;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// Returns the text exactly as submitted once every rule accepts it.
    pub fn clean(self, policy: &ContentPolicy) -> AppResult<String> {
        let mut errors = FormErrors::new();
        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        } else {
            for message in policy.violations(&self.text) {
                errors.add("text", message);
            }
        }
        errors.into_result(self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn policy() -> ContentPolicy {
        ContentPolicy::from_config(&crate::config::Config::default().moderation)
    }

    #[test]
    fn test_forbidden_comment_is_rejected() {
        let err = CommentForm { text: "Пушкин".into() }.clean(&policy()).unwrap_err();
        match err {
            AppError::Form(errors) => assert_eq!(errors.get("text").unwrap(), ["Forbidden word!"]),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let text = CommentForm { text: "  Тестовый коммент ".into() }.clean(&policy()).unwrap();
        assert_eq!(text, "  Тестовый коммент ");
    }

    #[test]
    fn test_blank_comment_is_required() {
        assert!(CommentForm { text: "   ".into() }.clean(&policy()).is_err());
    }
}
