use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::TaskRepository;
use crate::middleware::RateLimits;

/// Dependencies shared by every request. Built once at startup and never
/// mutated afterwards; the repository owns the only shared mutable resource.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tasks: Arc<dyn TaskRepository>,
    pub verifier: Arc<TokenVerifier>,
    pub limits: RateLimits,
}

impl AppState {
    pub fn new(config: AppConfig, tasks: Arc<dyn TaskRepository>) -> Self {
        let verifier = Arc::new(TokenVerifier::new(&config.security.jwt_secret));
        let limits = RateLimits::from_config(&config.api);

        Self {
            config: Arc::new(config),
            tasks,
            verifier,
            limits,
        }
    }
}
