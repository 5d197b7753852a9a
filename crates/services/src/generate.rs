use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::response_cache::ResponseCache;

//
// ─── REQUEST ───────────────────────────────────────────────────────────────────
//

/// One prompt for the hosted model, with optional system framing and an
/// optional output-token cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    prompt: String,
    system_instruction: Option<String>,
    max_output_tokens: Option<u32>,
}

impl GenerateRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            max_output_tokens: None,
        }
    }

    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    #[must_use]
    pub fn with_max_output_tokens(mut self, cap: u32) -> Self {
        self.max_output_tokens = Some(cap);
        self
    }

    // Accessors
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    #[must_use]
    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }
}

/// Write-side seam over the hosted generative-text service.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generates text for one request.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError` when the client is unconfigured, the request
    /// fails, or the response carries no text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError>;
}

//
// ─── HOSTED CLIENT ─────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct GenerateConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GenerateConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("NIHONGO_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("NIHONGO_AI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta/openai".into());
        let model = env::var("NIHONGO_AI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

#[derive(Clone)]
pub struct HostedGenerativeClient {
    client: Client,
    config: Option<GenerateConfig>,
}

impl HostedGenerativeClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GenerateConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GenerateConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl GenerativeClient for HostedGenerativeClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        let config = self.config.as_ref().ok_or(GenerateError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let mut messages = Vec::new();
        if let Some(instruction) = request.system_instruction() {
            messages.push(ChatTurn {
                role: "system",
                content: instruction.to_string(),
            });
        }
        messages.push(ChatTurn {
            role: "user",
            content: request.prompt().to_string(),
        });
        let payload = ChatRequest {
            model: config.model.clone(),
            messages,
            max_tokens: request.max_output_tokens(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerateError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerateError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatTurn {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatTurnResponse,
}

#[derive(Debug, Deserialize)]
struct ChatTurnResponse {
    content: Option<String>,
}

//
// ─── CACHED GENERATION ─────────────────────────────────────────────────────────
//

/// A generation result and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub text: String,
    pub from_cache: bool,
}

/// Memoizes successful generations in front of a shared client.
#[derive(Clone)]
pub struct CachedGenerator {
    client: Arc<dyn GenerativeClient>,
    cache: ResponseCache,
}

impl CachedGenerator {
    #[must_use]
    pub fn new(client: Arc<dyn GenerativeClient>, cache: ResponseCache) -> Self {
        Self { client, cache }
    }

    /// Generates text, reusing the cached reply for `cache_key` when one
    /// exists.
    ///
    /// The key is the caller's query, not the full request, so a repeated
    /// query is a hit even when its surrounding prompt changed.
    ///
    /// # Errors
    ///
    /// Propagates the client's failure; failures are never cached, so the
    /// same query retries the service next time.
    pub async fn generate(
        &self,
        cache_key: &str,
        request: &GenerateRequest,
    ) -> Result<GeneratedReply, GenerateError> {
        if let Some(text) = self.cache.get(cache_key) {
            tracing::debug!(key = cache_key, "serving generation from cache");
            return Ok(GeneratedReply {
                text,
                from_cache: true,
            });
        }

        let text = self.client.generate(request).await?;
        self.cache.insert(cache_key, text.clone());
        Ok(GeneratedReply {
            text,
            from_cache: false,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedClient {
        calls: AtomicUsize,
        failures_first: usize,
    }

    impl ScriptedClient {
        fn new(failures_first: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures_first,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeClient for ScriptedClient {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_first {
                return Err(GenerateError::Disabled);
            }
            Ok(format!("reply to {}", request.prompt()))
        }
    }

    #[tokio::test]
    async fn repeated_key_is_served_from_cache() {
        let client = ScriptedClient::new(0);
        let generator = CachedGenerator::new(client.clone(), ResponseCache::default());
        let request = GenerateRequest::new("水");

        let first = generator.generate("水", &request).await.unwrap();
        let second = generator.generate("水", &request).await.unwrap();

        assert_eq!(client.calls(), 1);
        assert_eq!(first.text, second.text);
        assert!(!first.from_cache);
        assert!(second.from_cache);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let client = ScriptedClient::new(1);
        let generator = CachedGenerator::new(client.clone(), ResponseCache::default());
        let request = GenerateRequest::new("水");

        assert!(generator.generate("水", &request).await.is_err());
        let retry = generator.generate("水", &request).await.unwrap();

        assert_eq!(client.calls(), 2);
        assert_eq!(retry.text, "reply to 水");
    }

    #[tokio::test]
    async fn distinct_keys_generate_separately() {
        let client = ScriptedClient::new(0);
        let generator = CachedGenerator::new(client.clone(), ResponseCache::default());

        generator.generate("水", &GenerateRequest::new("水")).await.unwrap();
        generator.generate("火", &GenerateRequest::new("火")).await.unwrap();

        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn unconfigured_client_reports_disabled() {
        let client = HostedGenerativeClient::new(None);
        let err = client.generate(&GenerateRequest::new("水")).await.unwrap_err();
        assert!(matches!(err, GenerateError::Disabled));
    }
}
