use axum::{middleware, Router};
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::auth::accounts;
use crate::auth::middleware::Sessions;
use crate::badges;
use crate::categories;
use crate::dm;
use crate::groups;
use crate::notify;
use crate::posts::{comments, crud as post_crud, likes};
use crate::state::AppState;
use crate::stories;
use crate::ws::handler as ws_handler;

/// Inject the session map into request extensions so the CurrentUser
/// extractor can resolve tokens.
async fn inject_sessions(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut()
        .insert(Sessions(state.sessions.clone()));
    next.run(req).await
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting: 5 requests per minute per IP on credential endpoints.
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12) // 1 token every 12 seconds = 5 per minute
            .burst_size(5)
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Background task to clean up rate limiter state.
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    let auth_routes = Router::new()
        .route("/api/auth/register", axum::routing::post(accounts::register))
        .route("/api/auth/login", axum::routing::post(accounts::login))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let account_routes = Router::new()
        .route("/api/auth/logout", axum::routing::post(accounts::logout))
        .route("/api/auth/me", axum::routing::get(accounts::me))
        .route("/api/users/me", axum::routing::put(accounts::update_profile))
        .route("/api/users/{id}", axum::routing::get(accounts::get_user));

    let post_routes = Router::new()
        .route("/api/posts", axum::routing::get(post_crud::list_posts))
        .route("/api/posts", axum::routing::post(post_crud::create_post))
        .route("/api/posts/{id}", axum::routing::get(post_crud::get_post))
        .route(
            "/api/posts/{id}/comments",
            axum::routing::get(comments::list_comments),
        )
        .route(
            "/api/posts/{id}/comments",
            axum::routing::post(comments::create_comment),
        )
        .route("/api/posts/{id}/like", axum::routing::post(likes::toggle_like))
        .route("/api/posts/{id}/likes", axum::routing::get(likes::like_count));

    let group_routes = Router::new()
        .route("/api/groups", axum::routing::get(groups::list_groups))
        .route("/api/groups", axum::routing::post(groups::create_group))
        .route("/api/groups/{id}/join", axum::routing::post(groups::join_group))
        .route("/api/groups/{id}/leave", axum::routing::post(groups::leave_group));

    let badge_routes = Router::new()
        .route("/api/badges", axum::routing::get(badges::list_badges))
        .route("/api/badges", axum::routing::post(badges::create_badge))
        .route(
            "/api/users/{id}/badges",
            axum::routing::get(badges::user_badges),
        )
        .route(
            "/api/users/{id}/badges/{badge_id}",
            axum::routing::post(badges::award_badge),
        );

    let category_routes = Router::new()
        .route(
            "/api/categories",
            axum::routing::get(categories::list_categories),
        )
        .route(
            "/api/categories",
            axum::routing::post(categories::create_category),
        );

    let story_routes = Router::new()
        .route("/api/stories", axum::routing::get(stories::list_stories))
        .route("/api/stories", axum::routing::post(stories::create_story))
        .route(
            "/api/stories/{id}/view",
            axum::routing::post(stories::view_story),
        );

    let dm_routes = Router::new()
        .route(
            "/api/messages/{user_id}",
            axum::routing::get(dm::get_conversation),
        )
        .route(
            "/api/messages/{user_id}",
            axum::routing::post(dm::send_message),
        );

    let notification_routes = Router::new()
        .route(
            "/api/notifications",
            axum::routing::get(notify::list_notifications),
        )
        .route(
            "/api/notifications/{id}/read",
            axum::routing::post(notify::mark_read),
        )
        .route(
            "/api/notifications/{id}",
            axum::routing::delete(notify::delete_notification),
        );

    // Real-time channel (auth via query param, not bearer header).
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(auth_routes)
        .merge(account_routes)
        .merge(post_routes)
        .merge(group_routes)
        .merge(badge_routes)
        .merge(category_routes)
        .merge(story_routes)
        .merge(dm_routes)
        .merge(notification_routes)
        .merge(ws_routes)
        .merge(health)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_sessions,
        ))
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
