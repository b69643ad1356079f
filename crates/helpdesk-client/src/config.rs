use std::path::PathBuf;
use std::time::Duration;

use helpdesk_domain::HelpdeskError;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const ENV_API_URL: &str = "HELPDESK_API_URL";
const ENV_REQUEST_TIMEOUT_SECS: &str = "HELPDESK_REQUEST_TIMEOUT_SECS";
const ENV_TOKEN_FILE: &str = "HELPDESK_TOKEN_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpdeskConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    /// When set, the session token is persisted here across restarts.
    pub token_file: Option<PathBuf>,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_file: None,
        }
    }
}

impl HelpdeskConfig {
    pub fn from_env() -> Result<Self, HelpdeskError> {
        let mut config = Self::default();

        if let Ok(api_url) = std::env::var(ENV_API_URL) {
            let api_url = api_url.trim();
            if !api_url.is_empty() {
                config.api_url = api_url.to_owned();
            }
        }
        if let Ok(raw) = std::env::var(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout = parse_timeout_secs(&raw)?;
        }
        if let Ok(raw) = std::env::var(ENV_TOKEN_FILE) {
            let raw = raw.trim();
            if !raw.is_empty() {
                config.token_file = Some(PathBuf::from(raw));
            }
        }

        Ok(config)
    }
}

fn parse_timeout_secs(value: &str) -> Result<Duration, HelpdeskError> {
    let seconds = value.trim().parse::<u64>().map_err(|_| {
        HelpdeskError::ValidationFailed(format!(
            "{ENV_REQUEST_TIMEOUT_SECS} must be an unsigned integer."
        ))
    })?;
    if seconds == 0 {
        return Err(HelpdeskError::ValidationFailed(format!(
            "{ENV_REQUEST_TIMEOUT_SECS} must be greater than zero."
        )));
    }
    Ok(Duration::from_secs(seconds))
}
