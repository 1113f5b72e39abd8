mod webhook;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

/// Combines all API routes into a single router
pub(super) fn router() -> Router<AppState> {
    // Token reviews are not size limited, any body that cannot be read or
    // decoded is answered with 401
    Router::new().route(
        "/webhook",
        post(webhook::webhook_handler).layer(DefaultBodyLimit::disable()),
    )
}
