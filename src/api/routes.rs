use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware, resolve_identity};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(middleware::from_fn(resolve_identity)),
        )
        .with_state(state)
}

/// Recipe routes under /api/v1
///
/// Routes whose handlers take an `Actor` require a caller identity.
fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/recipes",
            get(handlers::get_recipes).post(handlers::create_recipe),
        )
        .route("/recipes/top-rated", get(handlers::get_top_rated))
        .route("/recipes/favorites", get(handlers::get_user_favorites))
        .route("/recipes/user/:user_id", get(handlers::get_recipes_by_user))
        .route(
            "/recipes/:id",
            get(handlers::get_recipe)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route(
            "/recipes/:id/photo",
            put(handlers::upload_recipe_photo)
                .layer(DefaultBodyLimit::max(state.upload_body_limit())),
        )
        .route("/recipes/:id/rating", post(handlers::rate_recipe))
        .route("/recipes/:id/favorite", put(handlers::toggle_favorite))
}
