use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AppResult, FormErrors};
use crate::models::{NewGroup, UserUpdate};

use super::REQUIRED;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

const USERNAME_MAX: usize = 150;
const NAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;
const GROUP_TITLE_MAX: usize = 200;
const SLUG_MAX: usize = 50;

fn check_username(username: &str, errors: &mut FormErrors) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > USERNAME_MAX || !USERNAME_RE.is_match(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_email(email: &str, errors: &mut FormErrors) {
    if !email.is_empty() && !EMAIL_RE.is_match(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn check_names(first_name: &str, last_name: &str, errors: &mut FormErrors) {
    if first_name.chars().count() > NAME_MAX {
        errors.add("first_name", format!("Ensure this value has at most {} characters.", NAME_MAX));
    }
    if last_name.chars().count() > NAME_MAX {
        errors.add("last_name", format!("Ensure this value has at most {} characters.", NAME_MAX));
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone)]
pub struct CleanedSignup {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn clean(self) -> AppResult<CleanedSignup> {
        let mut errors = FormErrors::new();
        let username = self.username.trim().to_string();
        check_username(&username, &mut errors);
        check_email(self.email.trim(), &mut errors);
        check_names(&self.first_name, &self.last_name, &mut errors);

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {} characters.", PASSWORD_MIN),
            );
        } else if self.password1.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "This password is entirely numeric.");
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(CleanedSignup {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            username,
            email: self.email.trim().to_string(),
            password: self.password1,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn clean(self) -> AppResult<LoginForm> {
        let mut errors = FormErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result(LoginForm {
            username: self.username.trim().to_string(),
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl EditProfileForm {
    pub fn clean(self) -> AppResult<UserUpdate> {
        let mut errors = FormErrors::new();
        let username = self.username.trim().to_string();
        check_username(&username, &mut errors);
        check_email(self.email.trim(), &mut errors);
        check_names(&self.first_name, &self.last_name, &mut errors);

        errors.into_result(UserUpdate {
            username,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupForm {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl GroupForm {
    pub fn clean(self) -> AppResult<NewGroup> {
        let mut errors = FormErrors::new();
        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if title.chars().count() > GROUP_TITLE_MAX {
            errors.add("title", format!("Ensure this value has at most {} characters.", GROUP_TITLE_MAX));
        }
        if self.slug.is_empty() {
            errors.add("slug", REQUIRED);
        } else if self.slug.len() > SLUG_MAX || !SLUG_RE.is_match(&self.slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        if self.description.trim().is_empty() {
            errors.add("description", REQUIRED);
        }

        errors.into_result(NewGroup {
            title,
            slug: self.slug,
            description: self.description,
        })
    }
}
