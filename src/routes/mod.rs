/// Application routes configuration
use crate::handlers::{
    get_filter_options, get_launch_sun, get_launches, health, load_more, put_filters,
    reset_filters, retry, AppState,
};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Feed endpoints
        .route("/launches", get(get_launches))
        .route("/launches/more", post(load_more))
        .route("/launches/retry", post(retry))
        .route("/launches/:id/sun", get(get_launch_sun))
        // Filter endpoints
        .route("/filters", put(put_filters).delete(reset_filters))
        .route("/filters/options", get(get_filter_options))
        .with_state(state)
}
