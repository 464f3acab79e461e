use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
    models::{EntityType, PostFilter},
};

use super::{paginate_posts, require_read, PageQuery};

pub async fn group_posts(
    State(state): State<AppState>,
    vc: Vc,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    require_read(&state, &vc, &[EntityType::Group, EntityType::Post]).await?;
    let group = state
        .database
        .get_group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", slug)))?;

    let page = paginate_posts(&state, PostFilter::Group(group.id), query.page.as_deref()).await?;

    Ok(Json(json!({
        "group": group,
        "page": page,
    })))
}

pub async fn list_groups(State(state): State<AppState>, vc: Vc) -> AppResult<Json<Value>> {
    require_read(&state, &vc, &[EntityType::Group]).await?;
    let groups = state.database.list_groups().await?;
    Ok(Json(json!({ "groups": groups })))
}
