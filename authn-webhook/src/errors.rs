use crate::review::identity::IdentityError;
use crate::review::membership::MembershipError;
use crate::review::validator::RejectionReason;
use axum::response::IntoResponse;
use http::StatusCode;
use thiserror::Error;

/// Any reason a token review did not authenticate
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Rejected(#[from] RejectionReason),
    #[error("Failed to get user info: {0}")]
    Identity(#[from] IdentityError),
    #[error("Failed to get teams: {0}")]
    Membership(#[from] MembershipError),
}

/// A response that could not carry a token review, sent as plain text
#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Create new Unauthorized Error (401) with a detail message
    pub fn unauthorized<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::UNAUTHORIZED)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, self.detail).into_response()
    }
}
