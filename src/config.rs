use serde::Deserialize;

use crate::error::Result;

const ENV_PREFIX: &str = "ROBOTS";
const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const MAX_RETRIES_LIMIT: u32 = 16;
pub const DEFAULT_USER_AGENT: &str = concat!("robots_parser/", env!("CARGO_PKG_VERSION"));

/// Retrieval settings. Defaults, then `ROBOTS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    pub concurrency: usize,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchSettings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("concurrency", DEFAULT_CONCURRENCY as i64)?
            .set_default("max_retries", DEFAULT_MAX_RETRIES as i64)?
            .set_default("backoff_ms", DEFAULT_BACKOFF_MS as i64)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<FetchSettings>()?;
        Ok(settings.clamped())
    }

    /// Keep at least one worker, a non-zero timeout and a bounded retry count.
    pub fn clamped(mut self) -> Self {
        self.concurrency = self.concurrency.max(1);
        self.timeout_secs = self.timeout_secs.max(1);
        self.max_retries = self.max_retries.min(MAX_RETRIES_LIMIT);
        self
    }
}
