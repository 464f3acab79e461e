// tests/comment_api.rs

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::helpers::create_test_app;

#[tokio::test]
async fn test_authorized_user_comments() {
    let app = create_test_app().await;
    let (author, token) = app.create_user("auth").await;
    let post = app.create_post(&author, "Пост", None).await;

    let response = app
        .post_json(&format!("/posts/{}/comment/", post.id), Some(&token), json!({ "text": "Тестовый коммент" }))
        .await;
    assert_eq!(response.redirect(), (StatusCode::FOUND, format!("/posts/{}/", post.id).as_str()));

    let comments = app.state.database.list_comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Тестовый коммент");
    assert_eq!(comments[0].author.username, "auth");
}

#[tokio::test]
async fn test_anonymous_comment_redirects_to_login() {
    let app = create_test_app().await;
    let (author, _) = app.create_user("auth").await;
    let post = app.create_post(&author, "Пост", None).await;

    let response = app
        .post_json(&format!("/posts/{}/comment/", post.id), None, json!({ "text": "Аноним" }))
        .await;
    assert_eq!(
        response.location(),
        format!("/auth/login/?next=/posts/{}/comment/", post.id)
    );
    assert_eq!(app.state.database.count_comments().await.unwrap(), 0);
}

#[tokio::test]
async fn test_denylisted_word_rejected() {
    let app = create_test_app().await;
    let (author, token) = app.create_user("auth").await;
    let post = app.create_post(&author, "Пост", None).await;
    let url = format!("/posts/{}/comment/", post.id);

    for text in ["Пушкин", "пушкин", "Читаю ТОЛСТОЙ вечером"] {
        let response = app.post_json(&url, Some(&token), json!({ "text": text })).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{} accepted", text);
        assert_eq!(response.json()["errors"]["text"][0], "Forbidden word!");
    }

    // Glued punctuation makes a different token
    let response = app.post_json(&url, Some(&token), json!({ "text": "Пушкин!" })).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(app.state.database.count_comments().await.unwrap(), 1);
}

#[tokio::test]
async fn test_comment_on_missing_post_is_404() {
    let app = create_test_app().await;
    let (_, token) = app.create_user("auth").await;

    let response = app
        .post_json("/posts/42/comment/", Some(&token), json!({ "text": "Куда?" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_delete_rights() {
    let app = create_test_app().await;
    let (post_author, post_author_token) = app.create_user("post_author").await;
    let (commenter, commenter_token) = app.create_user("commenter").await;
    let (_, stranger_token) = app.create_user("stranger").await;
    let post = app.create_post(&post_author, "Пост", None).await;
    let detail_url = format!("/posts/{}/", post.id);

    let add = |text: &'static str| {
        let db = app.state.database.clone();
        let (post_id, author_id) = (post.id, commenter.id);
        async move {
            db.create_comment(social_network::models::NewComment {
                post_id,
                author_id,
                text: text.to_string(),
            })
            .await
            .unwrap()
        }
    };
    let first = add("первый").await;
    let second = add("второй").await;

    let response = app
        .post_json(&format!("/posts/{}/comment/{}/delete/", post.id, first.id), Some(&stranger_token), json!({}))
        .await;
    assert_eq!(response.redirect(), (StatusCode::FOUND, detail_url.as_str()));
    assert_eq!(app.state.database.count_comments().await.unwrap(), 2);

    let response = app
        .post_json(&format!("/posts/{}/comment/{}/delete/", post.id, first.id), Some(&commenter_token), json!({}))
        .await;
    assert_eq!(response.redirect(), (StatusCode::FOUND, detail_url.as_str()));

    let response = app
        .post_json(&format!("/posts/{}/comment/{}/delete/", post.id, second.id), Some(&post_author_token), json!({}))
        .await;
    assert_eq!(response.redirect(), (StatusCode::FOUND, detail_url.as_str()));
    assert_eq!(app.state.database.count_comments().await.unwrap(), 0);
}

#[tokio::test]
async fn test_comment_delete_checks_post_match() {
    let app = create_test_app().await;
    let (author, token) = app.create_user("auth").await;
    let post = app.create_post(&author, "Пост", None).await;
    let other = app.create_post(&author, "Другой", None).await;
    let comment = app
        .state
        .database
        .create_comment(social_network::models::NewComment {
            post_id: post.id,
            author_id: author.id,
            text: "Коммент".into(),
        })
        .await
        .unwrap();

    let response = app
        .post_json(&format!("/posts/{}/comment/{}/delete/", other.id, comment.id), Some(&token), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.database.count_comments().await.unwrap(), 1);
}
