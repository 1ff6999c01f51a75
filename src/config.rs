// Client configuration
//
// Defaults, overridden by QUANTRANK_* environment variables (a `.env` file
// is loaded by the binary before this runs).

use std::path::PathBuf;
use std::time::Duration;

use crate::controller::DEFAULT_RECENT_COMMENTS;
use crate::error::{RankError, Result};

pub const ENV_API_URL: &str = "QUANTRANK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "QUANTRANK_TIMEOUT_SECS";
pub const ENV_RECENT_COMMENTS: &str = "QUANTRANK_RECENT_COMMENTS";
pub const ENV_CAREERS_FILE: &str = "QUANTRANK_CAREERS_FILE";
pub const ENV_LOG_DIR: &str = "QUANTRANK_LOG_DIR";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub request_timeout: Duration,
    pub recent_comments: usize,
    pub careers_file: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(10),
            recent_comments: DEFAULT_RECENT_COMMENTS,
            careers_file: None,
            log_dir: std::env::temp_dir(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config = config.with_api_base(url);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = parse_number(ENV_TIMEOUT_SECS, &secs)?;
            if secs == 0 {
                return Err(RankError::Config(format!("{} must be positive", ENV_TIMEOUT_SECS)));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(count) = lookup(ENV_RECENT_COMMENTS) {
            config.recent_comments = parse_number(ENV_RECENT_COMMENTS, &count)?;
        }
        if let Some(path) = lookup(ENV_CAREERS_FILE) {
            config.careers_file = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim().trim_end_matches('/').to_string();
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RankError::Config(format!("{} is not a valid number: {:?}", key, value)))
}
