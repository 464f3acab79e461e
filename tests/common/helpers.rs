// tests/common/helpers.rs
//! Shared helpers for the HTTP integration tests
#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{self, HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use social_network::{
    app_state::AppState,
    config::Config,
    infrastructure::security::generate_session_token,
    models::{Group, NewGroup, NewPost, NewUser, Post, User},
    router::create_router,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // Database file and media root live here
    _dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!("body is not JSON ({}): {}", e, String::from_utf8_lossy(&self.body))
        })
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(http::header::LOCATION)
            .expect("response has no Location header")
            .to_str()
            .unwrap()
    }

    /// `(status, Location)` of a redirect.
    pub fn redirect(&self) -> (StatusCode, &str) {
        (self.status, self.location())
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

pub async fn create_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.database.url = format!("sqlite://{}", dir.path().join("test.db").display());
    config.database.max_connections = 2;
    config.media.root = dir.path().join("media").display().to_string();
    configure(&mut config);

    let state = AppState::new(config).await.expect("app state");
    let router = create_router(state.clone());

    TestApp {
        router,
        state,
        _dir: dir,
    }
}

impl TestApp {
    /// Creates a user and a session for them, returning the bearer token.
    pub async fn create_user(&self, username: &str) -> (User, String) {
        let user = self
            .state
            .database
            .create_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{}@example.com", username),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap();
        let token = generate_session_token();
        self.state.database.create_session(user.id, &token).await.unwrap();
        (user, token)
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        self.state
            .database
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: "Тестовое описание".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.state
            .database
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .unwrap()
    }

    pub async fn request(&self, method: http::Method, uri: &str, token: Option<&str>, body: Body) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(http::Method::GET, uri, token, Body::empty()).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(http::Method::POST, uri, token, Body::from(body.to_string()))
            .await
    }

    pub async fn post_count(&self) -> i64 {
        self.state
            .database
            .count_posts(social_network::models::PostFilter::All)
            .await
            .unwrap()
    }
}

/// Texts of the posts on a rendered page, in display order.
pub fn page_texts(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("page items")
        .iter()
        .map(|post| post["text"].as_str().unwrap().to_string())
        .collect()
}

pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\
\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";
