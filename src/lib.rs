pub mod api;
pub mod config;
pub mod content;
pub mod crawl;
pub mod error;
pub mod llm;
pub mod rate_limit;

use std::sync::Arc;

use config::Config;
use llm::{Extractor, LlmExtractor};
use rate_limit::RateLimiter;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rate_limiter: Arc<RateLimiter>,
    pub extractor: Arc<dyn Extractor>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let rate_limiter = RateLimiter::from_config(&config.rate_limit);
        let extractor = LlmExtractor::new(config.llm.clone());

        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(rate_limiter),
            extractor: Arc::new(extractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }
}
