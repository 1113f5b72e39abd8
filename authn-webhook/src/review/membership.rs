use crate::cache::{self, LookupKind};
use crate::github::{models::Team, GitHubError, GitHubSession};
use crate::state::AppState;
use log::debug;
use std::collections::BTreeMap;
use thiserror::Error;

/// Team names per organization login, in the order GitHub listed them
pub type MembershipIndex = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("failed to list teams (page {page}): {source}")]
    UpstreamList {
        page: u32,
        #[source]
        source: GitHubError,
    },
}

/// Resolves the team memberships behind the session's credential, from the
/// cache when a previous listing has not expired yet.
pub async fn resolve_memberships(
    state: &AppState,
    session: &GitHubSession,
) -> Result<MembershipIndex, MembershipError> {
    if let Some(cached) =
        cache::lookup::<MembershipIndex>(&state.cache, LookupKind::Membership, session.credential())
            .await
    {
        return Ok(cached);
    }

    let teams = fetch_all_teams(session).await?;
    let index = group_by_organization(teams);
    debug!("Resolved memberships in {} organizations", index.len());

    cache::store(
        &state.cache,
        LookupKind::Membership,
        session.credential(),
        &index,
        state.settings.cache.membership_ttl(),
    )
    .await;

    Ok(index)
}

/// Follows `rel="next"` links until the last page. Any failing page fails
/// the whole listing.
async fn fetch_all_teams(session: &GitHubSession) -> Result<Vec<Team>, MembershipError> {
    let mut teams = Vec::new();
    let mut page = 1;

    loop {
        let fetched = session
            .list_teams_page(page)
            .await
            .map_err(|source| MembershipError::UpstreamList { page, source })?;
        debug!("Fetched {} teams from page {}", fetched.teams.len(), page);
        teams.extend(fetched.teams);

        match fetched.next_page {
            None => return Ok(teams),
            Some(next) if next > page => page = next,
            Some(next) => {
                return Err(MembershipError::UpstreamList {
                    page,
                    source: GitHubError::Pagination(format!(
                        "next page {next} does not follow page {page}"
                    )),
                })
            }
        }
    }
}

fn group_by_organization(teams: Vec<Team>) -> MembershipIndex {
    let mut index = MembershipIndex::new();
    for team in teams {
        index
            .entry(team.organization.login)
            .or_default()
            .push(team.name);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::models::Organization;
    use crate::test_utils::{teams_page, TestFixture};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn team(org: &str, name: &str) -> Team {
        Team {
            name: name.to_string(),
            organization: Organization {
                login: org.to_string(),
            },
        }
    }

    #[test]
    fn test_group_by_organization() {
        let index = group_by_organization(vec![
            team("acme", "sre"),
            team("other", "ops"),
            team("acme", "eng"),
            team("acme", "sre"),
        ]);
        assert_eq!(index["acme"], vec!["sre", "eng", "sre"]);
        assert_eq!(index["other"], vec!["ops"]);
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_all_pages_are_collected() {
        let fixture = TestFixture::new().await;
        fixture
            .add_teams_page(1, &[("acme", "eng")], Some(2), 1)
            .await;
        fixture
            .add_teams_page(2, &[("acme", "sre"), ("other", "ops")], Some(3), 1)
            .await;
        fixture
            .add_teams_page(3, &[("other", "dev")], None, 1)
            .await;

        let session = fixture.state.github.login("user-token");
        let index = resolve_memberships(&fixture.state, &session)
            .await
            .unwrap();

        assert_eq!(index["acme"], vec!["eng", "sre"]);
        assert_eq!(index["other"], vec!["ops", "dev"]);

        fixture.github_mock.verify().await;
    }

    #[tokio::test]
    async fn test_failing_page_discards_everything() {
        let fixture = TestFixture::new().await;
        // both attempts fetch page 1 again, nothing was cached
        fixture
            .add_teams_page(1, &[("acme", "eng")], Some(2), 2)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/user/teams"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(2)
            .mount(&fixture.github_mock)
            .await;

        let session = fixture.state.github.login("user-token");
        for _ in 0..2 {
            let err = resolve_memberships(&fixture.state, &session)
                .await
                .unwrap_err();
            assert!(matches!(err, MembershipError::UpstreamList { page: 2, .. }));
        }

        fixture.github_mock.verify().await;
    }

    #[tokio::test]
    async fn test_first_page_failure() {
        let fixture = TestFixture::new().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/user/teams"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&fixture.github_mock)
            .await;

        let session = fixture.state.github.login("user-token");
        let err = resolve_memberships(&fixture.state, &session)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MembershipError::UpstreamList {
                page: 1,
                source: GitHubError::Unauthorized(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_non_advancing_next_link() {
        let fixture = TestFixture::new().await;
        fixture
            .add_teams_page(1, &[("acme", "eng")], Some(1), 1)
            .await;

        let session = fixture.state.github.login("user-token");
        let err = resolve_memberships(&fixture.state, &session)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MembershipError::UpstreamList {
                source: GitHubError::Pagination(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_memberships_are_cached() {
        let fixture = TestFixture::new().await;
        fixture
            .add_teams_page(1, &[("acme", "eng")], None, 1)
            .await;

        let session = fixture.state.github.login("user-token");
        let first = resolve_memberships(&fixture.state, &session)
            .await
            .unwrap();
        let second = resolve_memberships(&fixture.state, &session)
            .await
            .unwrap();
        assert_eq!(first, second);

        fixture.github_mock.verify().await;
    }

    #[tokio::test]
    async fn test_memberships_refetched_after_expiry() {
        let fixture =
            TestFixture::with_settings(|settings| settings.cache.membership_ttl = 1).await;
        fixture
            .add_teams_page(1, &[("acme", "eng")], None, 2)
            .await;

        let session = fixture.state.github.login("user-token");
        resolve_memberships(&fixture.state, &session)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        resolve_memberships(&fixture.state, &session)
            .await
            .unwrap();

        fixture.github_mock.verify().await;
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let fixture = TestFixture::new().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/user/teams"))
            .respond_with(teams_page(&[], None, &fixture.github_mock.uri()))
            .mount(&fixture.github_mock)
            .await;

        let session = fixture.state.github.login("user-token");
        let index = resolve_memberships(&fixture.state, &session)
            .await
            .unwrap();
        assert!(index.is_empty());
    }
}
