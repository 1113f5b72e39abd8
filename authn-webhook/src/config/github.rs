use crate::config::Cli;
use confique::Config;
use url::Url;

/// Configuration for the GitHub (Enterprise) identity provider
#[derive(Debug, Config, Clone)]
pub struct GitHubConfig {
    /// GitHub API base URL (default: https://api.github.com)
    #[config(default = "https://api.github.com")]
    pub base_url: String,

    /// GitHub upload URL (default: https://uploads.github.com)
    #[config(default = "https://uploads.github.com")]
    pub upload_url: String,

    /// Organization whose teams are reported as groups
    #[config(default = "")]
    pub organization: String,

    /// The timeout for GitHub API requests in seconds (default: 10)
    #[config(env = "AUTHN_GITHUB_CLIENT_TIMEOUT", default = 10)]
    pub client_timeout: u64,
}

impl GitHubConfig {
    /// Applies the command line flags that were given
    pub fn with_flags(mut self, cli: &Cli) -> Self {
        if let Some(base_url) = &cli.github_base_url {
            self.base_url = base_url.clone();
        }
        if let Some(upload_url) = &cli.github_upload_url {
            self.upload_url = upload_url.clone();
        }
        if let Some(organization) = &cli.organization {
            self.organization = organization.clone();
        }
        self
    }

    /// Creates a new configuration from environment variables
    pub fn from_env(&self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides<F>(&self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Start with the provided configuration
        let mut result = self.clone();
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(base_url) = non_empty("GITHUB_BASE_URL") {
            result.base_url = base_url;
        }
        if let Some(upload_url) = non_empty("GITHUB_UPLOAD_URL") {
            result.upload_url = upload_url;
        }
        if let Some(organization) = non_empty("ORGANIZATION") {
            result.organization = organization;
        }

        result
    }

    /// REST API root, e.g. `https://ghe.example.com/api/v3/`
    pub fn api_root(&self) -> Result<Url, url::ParseError> {
        normalize_endpoint(&self.base_url, "api/v3/")
    }

    /// Upload API root, e.g. `https://ghe.example.com/api/uploads/`
    pub fn upload_root(&self) -> Result<Url, url::ParseError> {
        normalize_endpoint(&self.upload_url, "api/uploads/")
    }
}

/// Enterprise installations serve the API below a fixed path; github.com
/// style hosts (`api.*`) serve it at the root.
fn normalize_endpoint(raw: &str, enterprise_suffix: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    let host = url.host_str().unwrap_or_default();
    let is_api_host = host.starts_with("api.") || host.contains(".api.");
    if !url.path().ends_with(enterprise_suffix) && !is_api_host {
        let path = format!("{}{}", url.path(), enterprise_suffix);
        url.set_path(&path);
    }
    Ok(url)
}
