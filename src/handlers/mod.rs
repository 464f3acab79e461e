// HTTP handlers - JSON renderings of the site's pages and form endpoints

pub mod auth_handlers;
pub mod comment_handlers;
pub mod follow_handlers;
pub mod group_handlers;
pub mod post_handlers;

use axum::{
    body::Bytes,
    http::{header, Uri},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    infrastructure::{
        middleware::Vc,
        pagination::Page,
        privacy::{PrivacyContext, PrivacyOperation},
    },
    models::{EntityType, Post, PostFilter},
};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Path plus query string, the value carried in `?next=`.
pub fn request_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Every listed entity type must be readable by the viewer.
pub async fn require_read(state: &AppState, vc: &Vc, entity_types: &[EntityType]) -> AppResult<()> {
    for &entity_type in entity_types {
        let ctx = PrivacyContext::new(entity_type, PrivacyOperation::Read, vc.user_id());
        if !state.privacy.allows(&ctx).await? {
            return Err(AppError::Forbidden(format!("Reading {} is not allowed", entity_type.as_str())));
        }
    }
    Ok(())
}

pub fn attach_image_urls(state: &AppState, posts: &mut [Post]) {
    for post in posts.iter_mut() {
        post.image_url = post.image.as_deref().map(|path| state.media.url_for(path));
    }
}

pub async fn paginate_posts(state: &AppState, filter: PostFilter, page: Option<&str>) -> AppResult<Page<Post>> {
    let count = state.database.count_posts(filter).await?;
    let window = state.paginator.window(count.max(0) as usize, page);
    let mut posts = state
        .database
        .list_posts(filter, window.limit() as i64, window.offset() as i64)
        .await?;
    attach_image_urls(state, &mut posts);
    Ok(Page::new(posts, window))
}

pub fn render_json<T: Serialize>(value: &T) -> AppResult<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| AppError::Internal(format!("Failed to render page: {}", e)))
}

pub fn json_response(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Post writes make cached feed pages stale.
pub async fn invalidate_feed_cache(state: &AppState) {
    if state.config.cache.invalidate_on_post {
        state.page_cache.clear().await;
    }
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
