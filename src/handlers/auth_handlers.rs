use axum::{
    body::Bytes,
    extract::{Query, State},
    http::Uri,
    response::{Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    app_state::AppState,
    error::{found, AppError, AppResult, FormErrors},
    forms::{parse_form, EditProfileForm, LoginForm, SignupForm},
    infrastructure::{
        middleware::Vc,
        security::{generate_session_token, hash_password, verify_password},
    },
    models::NewUser,
};

use super::{profile_url, request_path};

const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only local paths are honoured as a return target.
fn safe_next(next: Option<String>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => path,
        _ => "/".to_string(),
    }
}

fn duplicate_username() -> AppError {
    let mut errors = FormErrors::new();
    errors.add("username", DUPLICATE_USERNAME);
    AppError::Form(errors)
}

pub async fn signup_form() -> Json<Value> {
    Json(json!({
        "form": {
            "fields": ["first_name", "last_name", "username", "email", "password1", "password2"],
        }
    }))
}

#[instrument(skip(state, body))]
pub async fn signup(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let form: SignupForm = parse_form(&body)?;
    let cleaned = form.clean()?;
    let password_hash = hash_password(&cleaned.password)?;

    let user = state
        .database
        .create_user(NewUser {
            username: cleaned.username,
            first_name: cleaned.first_name,
            last_name: cleaned.last_name,
            email: cleaned.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => duplicate_username(),
            other => other,
        })?;
    info!(user = %user.username, "signed up");

    Ok(found("/"))
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Json<Value> {
    Json(json!({
        "form": { "fields": ["username", "password"] },
        "next": safe_next(query.next),
    }))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let form: LoginForm = parse_form(&body)?;
    let form = form.clean()?;

    let credentials = state.database.get_credentials(&form.username).await?;
    let user_id = match credentials {
        Some(creds) if verify_password(&form.password, &creds.password_hash)? => creds.id,
        _ => {
            warn!(username = %form.username, "failed login");
            let mut errors = FormErrors::new();
            errors.add("__all__", INVALID_LOGIN);
            return Err(AppError::Form(errors));
        }
    };

    let token = generate_session_token();
    state.database.create_session(user_id, &token).await?;
    info!(username = %form.username, "logged in");

    Ok(Json(json!({
        "token": token,
        "next": safe_next(query.next),
    })))
}

pub async fn logout(State(state): State<AppState>, vc: Vc) -> AppResult<Json<Value>> {
    if let Some(token) = vc.session_token.as_deref() {
        state.database.delete_session(token).await?;
        info!(request_id = %vc.request_id, "logged out");
    }
    Ok(Json(json!({ "logged_out": true })))
}

pub async fn profile_edit_form(vc: Vc, uri: Uri) -> AppResult<Json<Value>> {
    let user = vc.require_user(&request_path(&uri))?;

    Ok(Json(json!({
        "form": {
            "username": user.username,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "email": user.email,
        }
    })))
}

#[instrument(skip(state, vc, uri, body), fields(request_id = %vc.request_id))]
pub async fn profile_edit(State(state): State<AppState>, vc: Vc, uri: Uri, body: Bytes) -> AppResult<Response> {
    let user = vc.require_user(&request_path(&uri))?;
    let form: EditProfileForm = parse_form(&body)?;
    let update = form.clean()?;

    let updated = state
        .database
        .update_user(user.id, update)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => duplicate_username(),
            other => other,
        })?;
    info!(user = %updated.username, "profile updated");

    Ok(found(&profile_url(&updated.username)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_foreign_targets() {
        assert_eq!(safe_next(Some("/create/".into())), "/create/");
        assert_eq!(safe_next(Some("//evil.example/".into())), "/");
        assert_eq!(safe_next(Some("https://evil.example/".into())), "/");
        assert_eq!(safe_next(Some("/\\evil.example".into())), "/");
        assert_eq!(safe_next(None), "/");
    }
}
