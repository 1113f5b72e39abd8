use crate::{
    cache::{create_cache, Cache},
    config::Settings,
    github::GitHubApi,
    review::decision::DecisionPolicy,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub cache: Arc<Cache>,
    pub github: Arc<GitHubApi>,
    pub policy: Arc<DecisionPolicy>,
}

impl AppState {
    pub async fn new(settings: Settings) -> Result<Self, std::io::Error> {
        let cache = create_cache(&settings.cache).await.map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create cache: {}", e),
            )
        })?;
        Self::with_existing_cache(settings, cache)
    }

    pub fn with_existing_cache(settings: Settings, cache: Cache) -> Result<Self, std::io::Error> {
        let github = GitHubApi::new(&settings.github).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Failed to create GitHub client: {}", e),
            )
        })?;
        let policy = DecisionPolicy::from_settings(&settings)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            settings: Arc::new(settings),
            cache: Arc::new(cache),
            github: Arc::new(github),
            policy: Arc::new(policy),
        })
    }
}
