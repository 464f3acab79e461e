use axum::{
    body::Bytes,
    extract::{Path, State},
    http::Uri,
    response::Response,
};
use tracing::{info, instrument, warn};

use crate::{
    app_state::AppState,
    error::{found, AppError, AppResult},
    forms::{parse_form, CommentForm},
    infrastructure::{
        middleware::Vc,
        privacy::{PrivacyContext, PrivacyOperation},
    },
    models::{EntityType, NewComment},
};

use super::{post_url, request_path};

#[instrument(skip(state, vc, uri, body), fields(request_id = %vc.request_id))]
pub async fn add_comment(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Path(post_id): Path<i64>,
    body: Bytes,
) -> AppResult<Response> {
    let user = vc.require_user(&request_path(&uri))?;
    let post = state
        .database
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    let ctx = PrivacyContext::new(EntityType::Comment, PrivacyOperation::Create, Some(user.id));
    if !state.privacy.allows(&ctx).await? {
        return Err(AppError::Forbidden("Commenting is not allowed".to_string()));
    }

    let form: CommentForm = parse_form(&body)?;
    let text = form.clean(&state.content_policy)?;

    let comment = state
        .database
        .create_comment(NewComment {
            post_id: post.id,
            author_id: user.id,
            text,
        })
        .await?;
    info!(post_id, comment_id = comment.id, "comment added");

    Ok(found(&post_url(post.id)))
}

/// Comment authors and the author of the post may delete.
#[instrument(skip(state, vc, uri), fields(request_id = %vc.request_id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<Response> {
    let user = vc.require_user(&request_path(&uri))?;
    let post = state
        .database
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
    let comment = state
        .database
        .get_comment(comment_id)
        .await?
        .filter(|c| c.post_id == post.id)
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    let ctx = PrivacyContext::new(EntityType::Comment, PrivacyOperation::Delete, Some(user.id))
        .owned_by(comment.author.id)
        .under_parent_owned_by(post.author.id);
    if !state.privacy.allows(&ctx).await? {
        warn!(user = %user.username, comment_id, "non-owner tried to delete comment");
        return Err(AppError::Redirect(post_url(post.id)));
    }

    state.database.delete_comment(comment.id).await?;
    info!(post_id, comment_id, "comment deleted");

    Ok(found(&post_url(post.id)))
}
