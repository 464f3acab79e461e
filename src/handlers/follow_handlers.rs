use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::{Json, Response},
};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::{
    app_state::AppState,
    error::{found, AppError, AppResult},
    infrastructure::{
        middleware::Vc,
        privacy::{PrivacyContext, PrivacyOperation},
    },
    models::{EntityType, PostFilter, User},
};

use super::{paginate_posts, profile_url, request_path, require_read, PageQuery};

async fn load_author(state: &AppState, username: &str) -> AppResult<User> {
    state
        .database
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
}

/// Posts by every author the viewer follows.
pub async fn follow_index(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    let user = vc.require_user(&request_path(&uri))?;
    require_read(&state, &vc, &[EntityType::Post]).await?;
    let page = paginate_posts(&state, PostFilter::FollowedBy(user.id), query.page.as_deref()).await?;

    Ok(Json(json!({ "page": page })))
}

#[instrument(skip(state, vc, uri), fields(request_id = %vc.request_id))]
pub async fn profile_follow(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let user = vc.require_user(&request_path(&uri))?;
    let author = load_author(&state, &username).await?;

    if author.id == user.id {
        debug!(user = %user.username, "ignoring self-follow");
        return Ok(found(&profile_url(&author.username)));
    }

    let ctx = PrivacyContext::new(EntityType::Follow, PrivacyOperation::Create, Some(user.id));
    if !state.privacy.allows(&ctx).await? {
        return Err(AppError::Forbidden("Following is not allowed".to_string()));
    }

    match state.database.create_follow(user.id, author.id).await {
        Ok(_) => info!(user = %user.username, author = %author.username, "followed"),
        Err(AppError::Conflict(_)) => debug!(user = %user.username, author = %author.username, "already following"),
        Err(e) => return Err(e),
    }

    Ok(found(&profile_url(&author.username)))
}

#[instrument(skip(state, vc, uri), fields(request_id = %vc.request_id))]
pub async fn profile_unfollow(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let user = vc.require_user(&request_path(&uri))?;
    let author = load_author(&state, &username).await?;

    if state.database.delete_follow(user.id, author.id).await? {
        info!(user = %user.username, author = %author.username, "unfollowed");
    }

    Ok(found(&profile_url(&author.username)))
}
