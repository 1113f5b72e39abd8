use super::models::{Account, Team};
use super::{next_page, GitHubError, PAGE_SIZE};
use axum::body::Bytes;
use http::{HeaderMap, StatusCode};
use log::debug;
use reqwest::{Client, Response};
use url::Url;

/// One page of `GET /user/teams`
#[derive(Debug)]
pub struct TeamsPage {
    pub teams: Vec<Team>,
    pub next_page: Option<u32>,
}

/// GitHub client bound to a single credential.
///
/// Created per token review and dropped with it; the connection pool behind
/// it is shared.
pub struct GitHubSession {
    client: Client,
    api_root: Url,
    credential: String,
}

impl GitHubSession {
    pub(super) fn new(client: Client, api_root: Url, credential: &str) -> Self {
        Self {
            client,
            api_root,
            credential: credential.to_string(),
        }
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// `GET /user`
    pub async fn current_user(&self) -> Result<Account, GitHubError> {
        let url = self.api_root.join("user")?;
        debug!("Fetching current account from {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.credential)
            .send()
            .await?;
        let (_, body) = Self::checked_body(response).await?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /user/teams`, one page of `PAGE_SIZE` entries
    pub async fn list_teams_page(&self, page: u32) -> Result<TeamsPage, GitHubError> {
        let url = self.api_root.join("user/teams")?;
        debug!("Fetching teams page {} from {}", page, url);

        let response = self
            .client
            .get(url)
            .query(&[("per_page", PAGE_SIZE), ("page", page)])
            .bearer_auth(&self.credential)
            .send()
            .await?;
        let (headers, body) = Self::checked_body(response).await?;

        Ok(TeamsPage {
            teams: serde_json::from_slice(&body)?,
            next_page: next_page(&headers)?,
        })
    }

    /// Splits a response into headers and body, turning non-success statuses
    /// into errors that carry the body GitHub sent.
    async fn checked_body(response: Response) -> Result<(HeaderMap, Bytes), GitHubError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(GitHubError::Unauthorized(
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }
        if !status.is_success() {
            return Err(GitHubError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok((headers, body))
    }
}
