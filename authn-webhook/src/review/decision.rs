use crate::config::Settings;
use crate::errors::ReviewError;
use crate::review::identity::AccountIdentity;
use crate::review::membership::MembershipIndex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const API_VERSION: &str = "authentication.k8s.io/v1beta1";
pub const KIND: &str = "TokenReview";

/// Which memberships are reported as groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupScope {
    /// Team names of the configured organization only
    #[default]
    TargetOrganization,
    /// `org:team` for every membership of the account
    AllOrganizations,
}

impl FromStr for GroupScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "target-organization" => Ok(Self::TargetOrganization),
            "all-organizations" => Ok(Self::AllOrganizations),
            other => Err(format!(
                "Unknown group scope '{}', expected 'target-organization' or 'all-organizations'",
                other
            )),
        }
    }
}

impl fmt::Display for GroupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetOrganization => f.write_str("target-organization"),
            Self::AllOrganizations => f.write_str("all-organizations"),
        }
    }
}

/// Turns a membership index into the groups of a decision
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    pub organization: String,
    pub scope: GroupScope,
}

impl DecisionPolicy {
    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        Ok(Self {
            organization: settings.github.organization.clone(),
            scope: settings.group_scope()?,
        })
    }

    pub fn groups(&self, memberships: &MembershipIndex) -> Vec<String> {
        match self.scope {
            GroupScope::TargetOrganization => memberships
                .get(&self.organization)
                .cloned()
                .unwrap_or_default(),
            GroupScope::AllOrganizations => memberships
                .iter()
                .flat_map(|(org, teams)| teams.iter().map(move |team| format!("{org}:{team}")))
                .collect(),
        }
    }
}

/// Inbound token review. Absent and `null` fields both read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenReviewRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub api_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: TokenReviewSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenReviewSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The answer sent back to the cluster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenReview {
    pub api_version: String,
    pub kind: String,
    pub status: TokenReviewStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenReviewStatus {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub username: String,
    pub groups: Vec<String>,
    pub uid: String,
}

impl TokenReview {
    fn with_status(status: TokenReviewStatus) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            status,
        }
    }

    pub fn authenticated(user: UserInfo) -> Self {
        Self::with_status(TokenReviewStatus {
            authenticated: true,
            error: None,
            user: Some(user),
        })
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_status(TokenReviewStatus {
            authenticated: false,
            error: Some(message.into()),
            user: None,
        })
    }

    /// The failure decision for an error raised anywhere in the review
    pub fn from_error(err: &ReviewError) -> Self {
        Self::rejected(err.to_string())
    }

    pub fn assemble(
        identity: &AccountIdentity,
        memberships: &MembershipIndex,
        policy: &DecisionPolicy,
    ) -> Self {
        Self::authenticated(UserInfo {
            username: identity.login.clone(),
            groups: policy.groups(memberships),
            uid: String::new(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.status.authenticated
    }
}
