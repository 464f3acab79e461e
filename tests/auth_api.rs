// tests/auth_api.rs

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::helpers::{create_test_app, TestApp};

async fn signup(app: &TestApp, username: &str) {
    let response = app
        .post_json(
            "/auth/signup/",
            None,
            json!({
                "first_name": "Лев",
                "last_name": "Толстой",
                "username": username,
                "email": format!("{}@example.com", username),
                "password1": "war-and-peace",
                "password2": "war-and-peace",
            }),
        )
        .await;
    assert_eq!(response.redirect(), (StatusCode::FOUND, "/"));
}

async fn login(app: &TestApp, username: &str) -> String {
    let response = app
        .post_json(
            "/auth/login/?next=/create/",
            None,
            json!({ "username": username, "password": "war-and-peace" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["next"], "/create/");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_signup_login_logout() {
    let app = create_test_app().await;
    signup(&app, "leo").await;

    let user = app.state.database.get_user_by_username("leo").await.unwrap().unwrap();
    assert_eq!(user.full_name(), "Лев Толстой");

    let token = login(&app, "leo").await;
    assert_eq!(app.get("/create/", Some(&token)).await.status, StatusCode::OK);

    let response = app.post_json("/auth/logout/", Some(&token), json!({})).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.get("/create/", Some(&token)).await;
    assert_eq!(response.location(), "/auth/login/?next=/create/");
}

#[tokio::test]
async fn test_signup_rejects_duplicate_username() {
    let app = create_test_app().await;
    signup(&app, "leo").await;

    let response = app
        .post_json(
            "/auth/signup/",
            None,
            json!({
                "username": "leo",
                "password1": "another-password",
                "password2": "another-password",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["errors"]["username"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = create_test_app().await;
    signup(&app, "leo").await;

    let response = app
        .post_json("/auth/login/", None, json!({ "username": "leo", "password": "wrong-password" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["errors"]["__all__"].is_array());

    let response = app
        .post_json("/auth/login/", None, json!({ "username": "nobody", "password": "whatever" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_page_echoes_local_next_only() {
    let app = create_test_app().await;

    let page = app.get("/auth/login/?next=/create/", None).await.json();
    assert_eq!(page["next"], "/create/");

    let page = app.get("/auth/login/?next=https://example.com/", None).await.json();
    assert_eq!(page["next"], "/");
}

#[tokio::test]
async fn test_profile_edit() {
    let app = create_test_app().await;
    let (_, token) = app.create_user("auth").await;
    app.create_user("taken").await;

    let form = app.get("/auth/profile/edit/", Some(&token)).await.json();
    assert_eq!(form["form"]["username"], "auth");

    let response = app
        .post_json(
            "/auth/profile/edit/",
            Some(&token),
            json!({ "username": "taken", "first_name": "", "last_name": "", "email": "" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/auth/profile/edit/",
            Some(&token),
            json!({ "username": "renamed", "first_name": "Анна", "last_name": "", "email": "a@example.com" }),
        )
        .await;
    assert_eq!(response.redirect(), (StatusCode::FOUND, "/profile/renamed/"));

    let response = app.get("/auth/profile/edit/", None).await;
    assert_eq!(response.location(), "/auth/login/?next=/auth/profile/edit/");
}
