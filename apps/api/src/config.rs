use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
///
/// Provider credentials are optional: a missing key disables that source
/// (or the semantic scorer) instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// RapidAPI key shared by the JSearch and LinkedIn sources.
    pub rapidapi_key: Option<String>,
    /// SerpAPI key for the Google Jobs source.
    pub serpapi_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub enable_llm_fit_scoring: bool,
    pub source_timeout_secs: u64,
    pub career_page_timeout_secs: u64,
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config = Config {
            rapidapi_key: optional("RAPIDAPI_KEY"),
            serpapi_key: optional("SERPAPI_KEY"),
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            enable_llm_fit_scoring: parse_or(&optional, "ENABLE_LLM_FIT_SCORING", true)?,
            source_timeout_secs: parse_or(&optional, "SOURCE_TIMEOUT_SECS", 15)?,
            career_page_timeout_secs: parse_or(&optional, "CAREER_PAGE_TIMEOUT_SECS", 5)?,
            llm_timeout_secs: parse_or(&optional, "LLM_TIMEOUT_SECS", 60)?,
            port: parse_or(&optional, "PORT", 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.source_timeout_secs == 0 {
            bail!("SOURCE_TIMEOUT_SECS must be greater than 0");
        }
        if self.career_page_timeout_secs == 0 {
            bail!("CAREER_PAGE_TIMEOUT_SECS must be greater than 0");
        }
        if self.llm_timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn career_page_timeout(&self) -> Duration {
        Duration::from_secs(self.career_page_timeout_secs)
    }

    /// Time allowed for all career-page attempts of one company. Kept inside
    /// the source timeout so finished companies are still reported.
    pub fn career_company_budget(&self) -> Duration {
        self.source_timeout() * 4 / 5
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn parse_or<T, F>(optional: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
