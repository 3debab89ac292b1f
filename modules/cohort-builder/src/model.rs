use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use ai_client::Claude;

use crate::config::{Config, INTERLEAVED_THINKING_BETA};

/// The model's answer. Anything other than exactly these two fields is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CustomGrammarQuery {
    /// Search string written in the custom ANTLR query grammar.
    pub query: String,
    /// Short justification of the query content based on the prompt and what it is meant to accomplish.
    pub description: String,
}

/// Turns an assembled prompt pair into a structured query.
#[async_trait]
pub trait QueryModel: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> ai_client::Result<CustomGrammarQuery>;
}

pub struct ClaudeQueryModel {
    claude: Claude,
}

impl ClaudeQueryModel {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }

    /// Sonnet with extended (interleaved) thinking and a long read timeout.
    pub fn from_config(config: &Config) -> Self {
        let mut claude = Claude::new(&config.anthropic_api_key, &config.llm_model)
            .with_thinking(config.llm_thinking_budget)
            .with_beta(INTERLEAVED_THINKING_BETA)
            .with_timeout(config.llm_timeout);
        if let Some(ref url) = config.anthropic_base_url {
            claude = claude.with_base_url(url);
        }
        Self::new(claude)
    }

    pub fn claude(&self) -> &Claude {
        &self.claude
    }
}

#[async_trait]
impl QueryModel for ClaudeQueryModel {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> ai_client::Result<CustomGrammarQuery> {
        self.claude.extract(system_prompt, user_prompt).await
    }
}
