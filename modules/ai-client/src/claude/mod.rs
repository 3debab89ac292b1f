mod client;
pub(crate) mod types;

use std::sync::OnceLock;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::{AiError, Result};
use crate::schema::StructuredOutput;
use crate::util::strip_code_blocks;

use client::ClaudeClient;
use types::*;

const STRUCTURED_TOOL: &str = "structured_response";

/// Visible output allowance per request, before any thinking budget.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Smallest thinking budget the Messages API accepts.
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Extended thinking settings. `budget_tokens` is added on top of the visible
/// output allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thinking {
    pub budget_tokens: u32,
}

impl Thinking {
    /// Total `max_tokens` for a request that thinks and then writes up to
    /// `output_tokens`.
    pub fn max_tokens(&self, output_tokens: u32) -> Result<u32> {
        if self.budget_tokens < MIN_THINKING_BUDGET {
            return Err(AiError::Config(format!(
                "thinking budget {} is below the minimum of {MIN_THINKING_BUDGET}",
                self.budget_tokens
            )));
        }
        self.budget_tokens.checked_add(output_tokens).ok_or_else(|| {
            AiError::Config(format!(
                "thinking budget {} plus {output_tokens} output tokens overflows max_tokens",
                self.budget_tokens
            ))
        })
    }
}

// =============================================================================
// Claude Agent
// =============================================================================

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
    thinking: Option<Thinking>,
    betas: Vec<String>,
    timeout: Option<Duration>,
    http: OnceLock<ClaudeClient>,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            thinking: None,
            betas: Vec::new(),
            timeout: None,
            http: OnceLock::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self.http = OnceLock::new();
        self
    }

    pub fn with_thinking(mut self, budget_tokens: u32) -> Self {
        self.thinking = Some(Thinking { budget_tokens });
        self
    }

    /// Opt into an `anthropic-beta` feature, e.g. `interleaved-thinking-2025-05-14`.
    pub fn with_beta(mut self, beta: impl Into<String>) -> Self {
        self.betas.push(beta.into());
        self.http = OnceLock::new();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self.http = OnceLock::new();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn thinking(&self) -> Option<Thinking> {
        self.thinking
    }

    /// HTTP client shared by every request from this instance, built on first use.
    fn client(&self) -> Result<&ClaudeClient> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }

        let client = ClaudeClient::new(&self.api_key, self.timeout)?.with_betas(&self.betas);
        let client = match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        };
        Ok(self.http.get_or_init(|| client))
    }

    pub(crate) fn structured_request<T: StructuredOutput>(
        &self,
        system_prompt: String,
        user_prompt: String,
    ) -> Result<ChatRequest> {
        let mut request = ChatRequest::new(&self.model)
            .system(system_prompt)
            .message(WireMessage::user(user_prompt))
            .tool(ToolDefinitionWire {
                name: STRUCTURED_TOOL.to_string(),
                description: format!("Return the answer as a {}.", T::type_name()),
                input_schema: T::tool_schema(),
            });

        // Forced tool choice is rejected while thinking is on, so the model is
        // left to pick the (only) tool itself.
        match self.thinking {
            Some(thinking) => {
                request = request
                    .thinking(thinking.budget_tokens)
                    .max_tokens(thinking.max_tokens(DEFAULT_MAX_TOKENS)?);
                request.tool_choice = Some(json!({"type": "auto"}));
            }
            None => {
                request = request.max_tokens(DEFAULT_MAX_TOKENS).temperature(0.0);
                request.tool_choice = Some(json!({
                    "type": "tool",
                    "name": STRUCTURED_TOOL,
                }));
            }
        }

        Ok(request)
    }

    /// Ask Claude for a `T`, constrained by `T`'s JSON schema.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        debug!(type_name = T::type_name(), model = %self.model, "Claude structured output extraction");

        let request = self.structured_request::<T>(system_prompt.into(), user_prompt.into())?;
        let response = self.client()?.chat(&request).await?;

        parse_structured(&response)
    }
}

/// Pull a `T` out of a response: the structured tool call when present,
/// otherwise a JSON answer written as plain text.
pub(crate) fn parse_structured<T: StructuredOutput>(response: &ChatResponse) -> Result<T> {
    if let Some(input) = response.tool_input(STRUCTURED_TOOL) {
        return serde_json::from_value(input.clone())
            .map_err(|e| AiError::Parse(format!("Failed to deserialize tool input: {e}")));
    }

    match response.text() {
        Some(text) => {
            warn!(
                thinking_blocks = response.thinking_blocks(),
                "Claude answered in text instead of calling the structured tool"
            );
            serde_json::from_str(strip_code_blocks(text))
                .map_err(|_| AiError::MissingOutput)
        }
        None => Err(AiError::MissingOutput),
    }
}
