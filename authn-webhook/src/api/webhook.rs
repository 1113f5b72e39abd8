use crate::errors::ApiError;
use crate::review::{
    decision::{TokenReview, TokenReviewRequest},
    review_token,
};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    response::{IntoResponse, Response},
};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use log::{debug, error, warn};

pub(super) async fn webhook_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Failed to read token review body: {}", rejection);
            return ApiError::unauthorized(format!("Failed to decode request: {}", rejection))
                .into_response();
        }
    };
    let request: TokenReviewRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting undecodable token review: {}", e);
            return ApiError::unauthorized(format!("Failed to decode request: {}", e))
                .into_response();
        }
    };
    debug!("Received {} ({})", request.kind, request.api_version);

    let review = match review_token(&state, &request.spec.token).await {
        Ok(review) => review,
        Err(err) => {
            warn!("Token review failed: {}", err);
            TokenReview::from_error(&err)
        }
    };
    respond(&review)
}

/// 200 for an authenticated review, 401 otherwise
fn respond(review: &TokenReview) -> Response {
    let status = if review.is_authenticated() {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };

    match serde_json::to_vec(review) {
        Ok(body) => (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode token review: {}", e);
            ApiError::unauthorized(format!("Failed to marshal: {}", e)).into_response()
        }
    }
}
