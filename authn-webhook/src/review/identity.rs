use crate::cache::{self, LookupKind};
use crate::github::{models::Account, GitHubError, GitHubSession};
use crate::state::AppState;
use http::StatusCode;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The account a credential belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountIdentity {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// GitHub refused the credential; the body is passed on unchanged
    #[error("{0}")]
    UpstreamUnauthorized(String),
    #[error("unexpected account response: {0}")]
    MalformedUpstreamResponse(String),
    #[error("account has no login")]
    MissingLoginField,
    #[error("GitHub responded with status {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },
    #[error("{0}")]
    Transport(String),
}

impl From<GitHubError> for IdentityError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Unauthorized(body) => Self::UpstreamUnauthorized(body),
            GitHubError::Status { status, body } => Self::UpstreamStatus { status, body },
            GitHubError::Decode(e) => Self::MalformedUpstreamResponse(e.to_string()),
            GitHubError::Http(e) if e.is_decode() => Self::MalformedUpstreamResponse(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl TryFrom<Account> for AccountIdentity {
    type Error = IdentityError;

    fn try_from(account: Account) -> Result<Self, Self::Error> {
        let login = account
            .login
            .filter(|login| !login.is_empty())
            .ok_or(IdentityError::MissingLoginField)?;
        Ok(Self {
            login,
            id: account.id,
            name: account.name,
            email: account.email,
        })
    }
}

/// Resolves the account behind the session's credential, from the cache when
/// a previous lookup has not expired yet.
pub async fn resolve_identity(
    state: &AppState,
    session: &GitHubSession,
) -> Result<AccountIdentity, IdentityError> {
    if let Some(cached) =
        cache::lookup::<AccountIdentity>(&state.cache, LookupKind::Identity, session.credential())
            .await
    {
        return Ok(cached);
    }

    let identity = AccountIdentity::try_from(session.current_user().await?)?;
    debug!("Resolved account {}", identity.login);

    cache::store(
        &state.cache,
        LookupKind::Identity,
        session.credential(),
        &identity,
        state.settings.cache.identity_ttl(),
    )
    .await;

    Ok(identity)
}
