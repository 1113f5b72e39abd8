//! Minimal GitHub REST client for the two endpoints the token review needs:
//! `GET /user` and `GET /user/teams`.

use crate::config::GitHubConfig;
use http::header::{ACCEPT, LINK};
use http::{HeaderMap, HeaderValue, StatusCode};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub mod models;
mod session;

pub use session::GitHubSession;

/// Number of teams requested per page
pub const PAGE_SIZE: u32 = 100;

const MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("authn-webhook/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when talking to GitHub
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// GitHub rejected the credential; carries the response body verbatim
    #[error("{0}")]
    Unauthorized(String),
    #[error("GitHub responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid GitHub URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid pagination link: {0}")]
    Pagination(String),
}

/// Shared entry point to the GitHub API: the normalised API root and a
/// pooled HTTP client. Holds no credential.
#[derive(Clone)]
pub struct GitHubApi {
    client: Client,
    api_root: Url,
}

impl GitHubApi {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let api_root = config.api_root()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.client_timeout))
            .connect_timeout(Duration::from_secs(2))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            // Keep up to 10 idle connections per host for 90 seconds
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;

        Ok(Self { client, api_root })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Binds a credential to a short-lived session, dropped with the request.
    pub fn login(&self, credential: &str) -> GitHubSession {
        GitHubSession::new(self.client.clone(), self.api_root.clone(), credential)
    }
}

/// Extracts the page number of the `rel="next"` relation of a `Link` header.
///
/// `Ok(None)` means there is no next page.
pub(crate) fn next_page(headers: &HeaderMap) -> Result<Option<u32>, GitHubError> {
    let Some(link) = headers.get(LINK) else {
        return Ok(None);
    };
    let link = link
        .to_str()
        .map_err(|e| GitHubError::Pagination(e.to_string()))?;

    for relation in link.split(',') {
        let mut parts = relation.split(';');
        let target = parts.next().unwrap_or_default().trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            continue;
        }

        let target = target
            .strip_prefix('<')
            .and_then(|target| target.strip_suffix('>'))
            .ok_or_else(|| GitHubError::Pagination(format!("malformed link target {target}")))?;
        let url = Url::parse(target)?;
        let page = url
            .query_pairs()
            .find(|(name, _)| name == "page")
            .and_then(|(_, value)| value.parse::<u32>().ok())
            .ok_or_else(|| {
                GitHubError::Pagination(format!("next link {target} has no page number"))
            })?;
        return Ok(Some(page));
    }

    Ok(None)
}
