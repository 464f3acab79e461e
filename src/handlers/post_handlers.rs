use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::Uri,
    response::{Json, Response},
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    app_state::AppState,
    error::{found, AppError, AppResult},
    forms::{parse_form, post_form::CleanedImage, PostForm, PostFormView},
    infrastructure::{
        middleware::Vc,
        privacy::{PrivacyContext, PrivacyOperation},
    },
    models::{EntityType, NewPost, Post, PostChanges, PostFilter, User},
};

use super::{
    attach_image_urls, invalidate_feed_cache, json_response, paginate_posts, post_url, profile_url,
    render_json, request_path, require_read, PageQuery,
};

async fn load_post(state: &AppState, post_id: i64) -> AppResult<Post> {
    let mut post = state
        .database
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
    attach_image_urls(state, std::slice::from_mut(&mut post));
    Ok(post)
}

/// Signed-in users only; everybody else is sent to the login page.
async fn require_creator<'a>(state: &AppState, vc: &'a Vc, uri: &Uri) -> AppResult<&'a User> {
    let user = vc.require_user(&request_path(uri))?;
    let ctx = PrivacyContext::new(EntityType::Post, PrivacyOperation::Create, Some(user.id));
    if state.privacy.allows(&ctx).await? {
        Ok(user)
    } else {
        Err(AppError::Forbidden("Posting is not allowed".to_string()))
    }
}

/// Non-owners are bounced back to the post page.
async fn require_owner(state: &AppState, user: &User, post: &Post, operation: PrivacyOperation) -> AppResult<()> {
    let ctx = PrivacyContext::new(EntityType::Post, operation, Some(user.id)).owned_by(post.author.id);
    if state.privacy.allows(&ctx).await? {
        Ok(())
    } else {
        warn!(user = %user.username, post_id = post.id, "non-owner tried to modify post");
        Err(AppError::Redirect(post_url(post.id)))
    }
}

async fn store_image(state: &AppState, image: Option<CleanedImage>) -> AppResult<Option<String>> {
    match image {
        Some(image) => {
            let path = state
                .media
                .save_post_image(&image.name, &image.bytes, image.format)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to store image: {}", e)))?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}

/// Best-effort removal of a stored image no post refers to any more.
async fn discard_image(state: &AppState, path: &str) {
    if let Err(e) = state.media.delete(path).await {
        warn!("failed to remove image {}: {}", path, e);
    }
}

/// Home feed, served from the page cache when possible.
pub async fn index(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    require_read(&state, &vc, &[EntityType::Post]).await?;
    let key = request_path(&uri);
    if let Some(body) = state.page_cache.get(&key).await {
        return Ok(json_response(body));
    }

    let generation = state.page_cache.generation();
    let page = paginate_posts(&state, PostFilter::All, query.page.as_deref()).await?;
    let body = render_json(&json!({ "page": page }))?;
    state.page_cache.insert_if_fresh(&key, body.clone(), generation).await;

    Ok(json_response(body))
}

pub async fn post_detail(State(state): State<AppState>, vc: Vc, Path(post_id): Path<i64>) -> AppResult<Json<Value>> {
    require_read(&state, &vc, &[EntityType::Post, EntityType::Comment]).await?;
    let post = load_post(&state, post_id).await?;
    let author_post_count = state.database.count_posts(PostFilter::Author(post.author.id)).await?;
    let comments = state.database.list_comments(post_id).await?;

    Ok(Json(json!({
        "post": post,
        "author_post_count": author_post_count,
        "comments": comments,
        "form": { "fields": ["text"] },
    })))
}

pub async fn post_create_form(State(state): State<AppState>, vc: Vc, uri: Uri) -> AppResult<Json<Value>> {
    require_creator(&state, &vc, &uri).await?;
    let groups = state.database.list_groups().await?;

    Ok(Json(json!({
        "form": PostFormView::empty(),
        "is_edit": false,
        "groups": groups,
    })))
}

#[instrument(skip(state, vc, body), fields(request_id = %vc.request_id))]
pub async fn post_create(State(state): State<AppState>, vc: Vc, uri: Uri, body: Bytes) -> AppResult<Response> {
    let user = require_creator(&state, &vc, &uri).await?;
    let form: PostForm = parse_form(&body)?;
    let cleaned = form.clean(&state.database, state.config.media.max_upload_bytes).await?;
    let image = store_image(&state, cleaned.image).await?;

    let created = state
        .database
        .create_post(NewPost {
            author_id: user.id,
            text: cleaned.text,
            group_id: cleaned.group_id,
            image: image.clone(),
        })
        .await;
    let post = match created {
        Ok(post) => post,
        Err(e) => {
            if let Some(path) = image.as_deref() {
                discard_image(&state, path).await;
            }
            return Err(e);
        }
    };
    invalidate_feed_cache(&state).await;
    info!(post_id = post.id, "post created: {}", post.short_text());

    Ok(found(&profile_url(&user.username)))
}

pub async fn post_edit_form(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let user = vc.require_user(&request_path(&uri))?;
    let post = load_post(&state, post_id).await?;
    require_owner(&state, user, &post, PrivacyOperation::Update).await?;
    let groups = state.database.list_groups().await?;

    Ok(Json(json!({
        "form": PostFormView::initial(&post.text, post.group.as_ref().map(|g| g.id), post.image.clone()),
        "is_edit": true,
        "post": post,
        "groups": groups,
    })))
}

#[instrument(skip(state, vc, uri, body), fields(request_id = %vc.request_id))]
pub async fn post_edit(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Path(post_id): Path<i64>,
    body: Bytes,
) -> AppResult<Response> {
    let user = vc.require_user(&request_path(&uri))?;
    let post = load_post(&state, post_id).await?;
    require_owner(&state, user, &post, PrivacyOperation::Update).await?;

    let form: PostForm = parse_form(&body)?;
    let cleaned = form.clean(&state.database, state.config.media.max_upload_bytes).await?;
    let image = store_image(&state, cleaned.image).await?;

    let updated = state
        .database
        .update_post(
            post_id,
            PostChanges {
                text: cleaned.text,
                group_id: cleaned.group_id,
                image: image.clone(),
            },
        )
        .await;
    if let Err(e) = updated {
        if let Some(path) = image.as_deref() {
            discard_image(&state, path).await;
        }
        return Err(e);
    }

    // A replaced picture leaves its old file behind
    if let (Some(new), Some(old)) = (image.as_deref(), post.image.as_deref()) {
        if new != old {
            discard_image(&state, old).await;
        }
    }
    invalidate_feed_cache(&state).await;
    info!(post_id, "post edited");

    Ok(found(&post_url(post_id)))
}

#[instrument(skip(state, vc, uri), fields(request_id = %vc.request_id))]
pub async fn post_delete(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let user = vc.require_user(&request_path(&uri))?;
    let post = load_post(&state, post_id).await?;
    require_owner(&state, user, &post, PrivacyOperation::Delete).await?;

    state.database.delete_post(post_id).await?;
    if let Some(image) = post.image.as_deref() {
        discard_image(&state, image).await;
    }
    invalidate_feed_cache(&state).await;
    info!(post_id, "post deleted");

    Ok(found(&profile_url(&user.username)))
}

pub async fn profile(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    require_read(&state, &vc, &[EntityType::User, EntityType::Post]).await?;
    let author = state
        .database
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    let page = paginate_posts(&state, PostFilter::Author(author.id), query.page.as_deref()).await?;
    let following = match vc.user_id() {
        Some(viewer_id) => state.database.is_following(viewer_id, author.id).await?,
        None => false,
    };

    Ok(Json(json!({
        "author": author.as_author(),
        "post_count": page.count,
        "following": following,
        "page": page,
    })))
}
