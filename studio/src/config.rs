use std::time::Duration;

use crate::autosave::AutosaveConfig;

#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Port the HTTP API listens on
    pub port: u16,
    /// SQLite database backing the key-value store
    pub database_url: String,
    /// Browser origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Chat-completion endpoint; assistant routes are unavailable without it.
    pub completion_endpoint: Option<String>,
    pub completion_api_key: Option<String>,
    pub completion_model: Option<String>,
    pub completion_timeout_ms: u64,
    pub autosave: AutosaveConfig,
    /// Open sessions with no request for this long are flushed and closed.
    pub session_idle_timeout: Duration,
}

impl StudioConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let idle_secs: u64 = env_parse("AUTOSAVE_IDLE_SECS", 30)?;
        let active_secs: u64 = env_parse("AUTOSAVE_ACTIVE_SECS", 10)?;
        if idle_secs == 0 || active_secs == 0 {
            return Err(anyhow::anyhow!(
                "AUTOSAVE_IDLE_SECS and AUTOSAVE_ACTIVE_SECS must be positive"
            ));
        }
        let session_idle_secs: u64 = env_parse("SESSION_IDLE_TIMEOUT_SECS", 1800)?;
        if session_idle_secs == 0 {
            return Err(anyhow::anyhow!("SESSION_IDLE_TIMEOUT_SECS must be positive"));
        }

        Ok(Self {
            port: env_parse("STUDIO_PORT", 8080)?,
            database_url: env_str("STUDIO_DATABASE_URL", "sqlite:./data/studio.db"),
            allowed_origins: env_csv(
                "STUDIO_ALLOWED_ORIGINS",
                &["http://localhost:3000", "http://127.0.0.1:3000"],
            ),
            completion_endpoint: env_opt("COMPLETION_ENDPOINT"),
            completion_api_key: env_opt("COMPLETION_API_KEY"),
            completion_model: env_opt("COMPLETION_MODEL"),
            completion_timeout_ms: env_parse("COMPLETION_TIMEOUT_MS", 60_000)?,
            autosave: AutosaveConfig {
                idle_interval: Duration::from_secs(idle_secs),
                active_interval: Duration::from_secs(active_secs),
            },
            session_idle_timeout: Duration::from_secs(session_idle_secs),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_csv(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        Err(_) => default.iter().map(|s| (*s).to_string()).collect(),
    }
}
