pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
pub(crate) use crate::config::github::GitHubConfig;
use crate::review::decision::GroupScope;
use clap::Parser;
use confique::Config;
use log::{info, warn};

pub mod cache;
pub mod github;

/// Command line flags of the webhook server.
///
/// Each flag has an environment variable of the same meaning; a non-empty
/// environment variable wins over the flag.
#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "authn-webhook",
    about = "Kubernetes token review webhook backed by GitHub teams"
)]
pub struct Cli {
    /// GitHub API base URL (env: GITHUB_BASE_URL)
    #[arg(long)]
    pub github_base_url: Option<String>,

    /// GitHub upload URL (env: GITHUB_UPLOAD_URL)
    #[arg(long)]
    pub github_upload_url: Option<String>,

    /// Organization whose teams are reported as groups (env: ORGANIZATION)
    #[arg(long)]
    pub organization: Option<String>,
}

/// Main configuration structure for the webhook server
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// The port the webhook server will listen to (default: 8443)
    #[config(env = "AUTHN_PORT", default = 8443)]
    pub port: u16,

    /// Which memberships end up in the reported groups:
    /// "target-organization" (default) or "all-organizations"
    #[config(env = "AUTHN_GROUP_SCOPE", default = "target-organization")]
    pub group_scope: String,

    /// GitHub configuration
    #[config(nested)]
    pub github: GitHubConfig,

    /// Cache configuration
    #[config(nested)]
    pub cache: CacheConfig,
}

impl Settings {
    /// Loads defaults and `AUTHN_*` variables, then layers the GitHub flags
    /// and their environment overrides on top.
    pub fn new(cli: &Cli) -> Result<Self, String> {
        let mut settings = Settings::builder()
            .env()
            .load()
            .map_err(|e| e.to_string())?;
        settings.github = settings.github.with_flags(cli).from_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the server cannot start with
    pub fn validate(&self) -> Result<(), String> {
        let scope = self.group_scope()?;
        self.github
            .api_root()
            .map_err(|e| format!("Invalid GitHub base URL '{}': {}", self.github.base_url, e))?;
        self.github.upload_root().map_err(|e| {
            format!(
                "Invalid GitHub upload URL '{}': {}",
                self.github.upload_url, e
            )
        })?;
        self.cache.store()?;
        if self.cache.sweep_interval == 0 {
            return Err("Cache sweep interval must be greater than zero".to_string());
        }
        if scope == GroupScope::TargetOrganization && self.github.organization.is_empty() {
            warn!("No organization configured, every token review will report empty groups");
        }
        Ok(())
    }

    pub fn group_scope(&self) -> Result<GroupScope, String> {
        self.group_scope.parse()
    }

    /// Logs the effective configuration
    pub fn log_summary(&self) {
        let upload_root = self
            .github
            .upload_root()
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.github.upload_url.clone());
        let api_root = self
            .github
            .api_root()
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.github.base_url.clone());
        info!(
            "GitHub API root: {}, upload root: {}, organization: '{}', group scope: {}",
            api_root, upload_root, self.github.organization, self.group_scope
        );
        info!(
            "Cache store: {}, identity TTL: {}s, membership TTL: {}s, sweep interval: {}s",
            self.cache.store, self.cache.identity_ttl, self.cache.membership_ttl, self.cache.sweep_interval
        );
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(github_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            group_scope: "target-organization".to_string(),
            github: GitHubConfig {
                base_url: github_mock.uri(),
                upload_url: github_mock.uri(),
                organization: "acme".to_string(),
                client_timeout: 5,
            },
            cache: CacheConfig {
                store: "in-memory".to_string(),
                identity_ttl: 3600,
                membership_ttl: 600,
                sweep_interval: 5400,
                capacity: 16,
            },
        }
    }
}
