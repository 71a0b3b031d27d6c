use std::path::PathBuf;

use crate::types::Strategy;

/// Everything a batch run needs, resolved once at startup and passed into the
/// run explicitly.
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_url: String,
    pub database_path: PathBuf,
    pub targets_path: Option<PathBuf>,
    pub strategy: Strategy,
    pub log_level: String,
    /// `0` disables the per-request timeout.
    pub request_timeout_secs: u64,
    /// `None` launches one request per target with no cap.
    pub max_concurrent_requests: Option<usize>,
    pub user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"[redacted]")
            .field("api_url", &self.api_url)
            .field("database_path", &self.database_path)
            .field("targets_path", &self.targets_path)
            .field("strategy", &self.strategy)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
