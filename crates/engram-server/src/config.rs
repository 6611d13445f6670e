//! Server settings read from the shuttle secret store

use std::time::Duration;

use engram::AdmissionConfig;

pub const DEFAULT_BRAIN_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub brain_api_url: String,
    pub brain_api_key: Option<String>,
    pub brain_timeout: Duration,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub classifier_timeout: Duration,
    /// Bearer token for `/engram` routes; `None` disables auth
    pub api_key: Option<String>,
    pub admission: AdmissionConfig,
}

impl ServerSettings {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            brain_api_url: non_empty("BRAIN_API_URL")
                .unwrap_or_else(|| DEFAULT_BRAIN_API_URL.to_string()),
            brain_api_key: non_empty("BRAIN_API_KEY"),
            brain_timeout: seconds(non_empty("BRAIN_TIMEOUT_SECS"), "BRAIN_TIMEOUT_SECS"),
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            anthropic_model: non_empty("ANTHROPIC_MODEL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            classifier_timeout: seconds(
                non_empty("CLASSIFIER_TIMEOUT_SECS"),
                "CLASSIFIER_TIMEOUT_SECS",
            ),
            api_key: non_empty("ENGRAM_API_KEY"),
            admission: AdmissionConfig::from_lookup(&lookup),
        }
    }
}

fn seconds(value: Option<String>, key: &str) -> Duration {
    let secs = match value.map(|v| v.trim().parse::<u64>()) {
        None => DEFAULT_TIMEOUT_SECS,
        Some(Ok(secs)) if secs > 0 => secs,
        Some(_) => {
            tracing::warn!("Ignoring {}, expected a positive integer", key);
            DEFAULT_TIMEOUT_SECS
        }
    };
    Duration::from_secs(secs)
}
