//! The token review pipeline: validate the credential, resolve the account
//! and its team memberships, then decide.

pub mod decision;
pub mod identity;
pub mod membership;
pub mod validator;

use crate::errors::ReviewError;
use crate::state::AppState;
use decision::TokenReview;
use log::debug;

/// Reviews one credential. Every failure is returned as a `ReviewError`, the
/// caller turns it into a failure decision.
pub async fn review_token(state: &AppState, credential: &str) -> Result<TokenReview, ReviewError> {
    validator::validate(credential)?;

    let session = state.github.login(credential);
    let identity = identity::resolve_identity(state, &session).await?;
    let memberships = membership::resolve_memberships(state, &session).await?;

    let review = TokenReview::assemble(&identity, &memberships, &state.policy);
    debug!(
        "Authenticated {} with {} groups",
        identity.login,
        review
            .status
            .user
            .as_ref()
            .map(|user| user.groups.len())
            .unwrap_or_default()
    );
    Ok(review)
}
