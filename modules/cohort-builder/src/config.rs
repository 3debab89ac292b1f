use std::path::PathBuf;
use std::time::Duration;

use ai_client::{Thinking, DEFAULT_MAX_TOKENS};
use anyhow::{anyhow, Context, Result};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const INTERLEAVED_THINKING_BETA: &str = "interleaved-thinking-2025-05-14";
pub const DEFAULT_THINKING_BUDGET: u32 = 16_000;

/// Long enough for a full extended-thinking turn.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 3600;

/// Application configuration loaded from environment variables.
/// Read once at startup and handed to each component's constructor.
#[derive(Debug, Clone)]
pub struct Config {
    // LLM
    pub anthropic_api_key: String,
    pub anthropic_base_url: Option<String>,
    pub llm_model: String,
    pub llm_thinking_budget: u32,
    pub llm_timeout: Duration,

    // Search index
    pub search_url: String,
    pub search_index: String,
    pub search_username: Option<String>,
    pub search_password: Option<String>,

    // Species service
    pub species_api_url: String,
    pub jwt_secret: String,

    // Reference data
    pub reference_timeout: Duration,
    pub reference_cache_ttl: Duration,

    // Grammar
    pub grammar_path: PathBuf,
    pub grammar_cache: bool,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build a config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{key} environment variable is required"))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key).filter(|v| !v.is_empty()) {
                Some(v) => v
                    .parse()
                    .with_context(|| format!("{key} must be a number, got {v:?}")),
                None => Ok(default),
            }
        };

        let llm_thinking_budget = u32::try_from(number(
            "LLM_THINKING_BUDGET",
            u64::from(DEFAULT_THINKING_BUDGET),
        )?)
        .context("LLM_THINKING_BUDGET is out of range")?;
        Thinking {
            budget_tokens: llm_thinking_budget,
        }
        .max_tokens(DEFAULT_MAX_TOKENS)
        .context("LLM_THINKING_BUDGET is out of range")?;

        Ok(Self {
            anthropic_api_key: required("ANTHROPIC_API_KEY")?,
            anthropic_base_url: lookup("ANTHROPIC_BASE_URL").filter(|v| !v.is_empty()),
            llm_model: or_default("LLM_MODEL", DEFAULT_MODEL),
            llm_thinking_budget,
            llm_timeout: Duration::from_secs(number("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?),
            search_url: or_default("SEARCH_URL", "https://vet-search-os.vmit.cucloud.net"),
            search_index: or_default("SEARCH_INDEX", "animals"),
            search_username: lookup("SEARCH_USERNAME").filter(|v| !v.is_empty()),
            search_password: lookup("SEARCH_PASSWORD").filter(|v| !v.is_empty()),
            species_api_url: required("EZYVET_DATA_API")?,
            jwt_secret: required("CUVMIT_JWT_SECRET")?,
            reference_timeout: Duration::from_secs(number("REFERENCE_TIMEOUT_SECS", 30)?),
            reference_cache_ttl: Duration::from_secs(number("REFERENCE_CACHE_TTL_SECS", 0)?),
            grammar_path: PathBuf::from(or_default("GRAMMAR_PATH", "assets/QueryDSL.g4")),
            grammar_cache: or_default("GRAMMAR_CACHE", "false")
                .parse()
                .context("GRAMMAR_CACHE must be true or false")?,
            api_host: or_default("API_HOST", "0.0.0.0"),
            api_port: u16::try_from(number("API_PORT", 8080)?)
                .context("API_PORT is out of range")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n: usize = val.chars().take(5).map(char::len_utf8).sum();
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  ANTHROPIC_API_KEY: {}", preview(&self.anthropic_api_key));
        tracing::info!("  CUVMIT_JWT_SECRET: {}", preview(&self.jwt_secret));
        tracing::info!("  LLM_MODEL: {}", self.llm_model);
        tracing::info!("  SEARCH_URL: {} (index {})", self.search_url, self.search_index);
        tracing::info!("  EZYVET_DATA_API: {}", self.species_api_url);
        tracing::info!("  GRAMMAR_PATH: {}", self.grammar_path.display());
        tracing::info!("  REFERENCE_CACHE_TTL_SECS: {}", self.reference_cache_ttl.as_secs());
    }
}
