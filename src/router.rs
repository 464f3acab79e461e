use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    app_state::AppState,
    handlers::{
        auth_handlers, comment_handlers, follow_handlers, group_handlers, not_found, post_handlers,
    },
    infrastructure::middleware::viewer_context_middleware,
};

// Room for a base64 encoded image plus the rest of the form.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.media.max_upload_bytes / 3 * 4 + FORM_OVERHEAD_BYTES;

    let mut router = Router::new()
        .route("/", get(post_handlers::index))
        .route("/group/{slug}/", get(group_handlers::group_posts))
        .route("/groups/", get(group_handlers::list_groups))
        .route("/profile/{username}/", get(post_handlers::profile))
        .route("/posts/{post_id}/", get(post_handlers::post_detail))
        .route(
            "/create/",
            get(post_handlers::post_create_form).post(post_handlers::post_create),
        )
        .route(
            "/posts/{post_id}/edit/",
            get(post_handlers::post_edit_form).post(post_handlers::post_edit),
        )
        .route("/posts/{post_id}/delete/", post(post_handlers::post_delete))
        .route("/posts/{post_id}/comment/", post(comment_handlers::add_comment))
        .route(
            "/posts/{post_id}/comment/{comment_id}/delete/",
            post(comment_handlers::delete_comment),
        )
        .route("/follow/", get(follow_handlers::follow_index))
        .route(
            "/profile/{username}/follow/",
            get(follow_handlers::profile_follow).post(follow_handlers::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(follow_handlers::profile_unfollow).post(follow_handlers::profile_unfollow),
        )
        .route(
            "/auth/signup/",
            get(auth_handlers::signup_form).post(auth_handlers::signup),
        )
        .route(
            "/auth/login/",
            get(auth_handlers::login_form).post(auth_handlers::login),
        )
        .route("/auth/logout/", post(auth_handlers::logout))
        .route(
            "/auth/profile/edit/",
            get(auth_handlers::profile_edit_form).post(auth_handlers::profile_edit),
        );

    let media_prefix = state.config.media.url.trim_end_matches('/').to_string();
    if !media_prefix.is_empty() {
        router = router.nest_service(&media_prefix, ServeDir::new(&state.config.media.root));
    }

    router
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), viewer_context_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
