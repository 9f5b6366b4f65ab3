//! LLM provider abstraction for cover-letter generation and compensation parsing
//!
//! Provides a unified interface over Ollama and OpenAI so the pipeline can
//! call a single [`LlmProvider`] without caring which backend is configured.

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Response from an LLM completion
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text content
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,
    /// Completion finish reason
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Prompt tokens used
    pub prompt_tokens: u32,
    /// Completion tokens generated
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// Chat message for multi-turn conversations
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Role (system, user, assistant)
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Messages for chat completion
    pub messages: Vec<ChatMessage>,
    /// Temperature (0.0-2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request with system prompt and user message
    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature, clamped to the valid range
    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider name
    fn name(&self) -> &str;

    /// Get model name
    fn model(&self) -> &str;

    /// Generate a completion (non-streaming)
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse>;
}

/// Which LLM backend to use, and how to reach it
#[derive(Debug, Clone)]
pub enum LlmConfig {
    /// Local Ollama server
    Ollama {
        /// Base URL, e.g. "http://localhost:11434"
        host: String,
        /// Model tag, e.g. "llama3.1"
        model: String,
    },
    /// OpenAI-compatible HTTP API
    OpenAi {
        /// Model name, e.g. "gpt-4o-mini"
        model: String,
        /// API key; falls back to `OPENAI_API_KEY` if absent
        api_key: Option<String>,
    },
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::Ollama {
            host: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
        }
    }
}

// =============================================================================
// Ollama Provider
// =============================================================================

#[cfg(feature = "ollama")]
pub mod ollama {
    use super::*;
    use ollama_rs::generation::chat::request::ChatMessageRequest;
    use ollama_rs::generation::chat::ChatMessage as OllamaMessage;
    use ollama_rs::Ollama;

    /// Ollama LLM provider for local model inference
    pub struct OllamaProvider {
        client: Ollama,
        model: String,
    }

    impl OllamaProvider {
        /// Create a new Ollama provider
        pub fn new(host: &str, model: &str) -> Result<Self> {
            let url = url::Url::parse(host)
                .with_context(|| format!("Invalid Ollama host URL: {}", host))?;

            let host_str = url.host_str().unwrap_or("localhost");
            let port = url.port().unwrap_or(11434);

            let client = Ollama::new(format!("http://{}", host_str), port);

            Ok(Self {
                client,
                model: model.to_string(),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for OllamaProvider {
        fn name(&self) -> &str {
            "ollama"
        }

        fn model(&self) -> &str {
            &self.model
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse> {
            let messages: Vec<OllamaMessage> = request
                .messages
                .iter()
                .map(|m| {
                    let role = match m.role.as_str() {
                        "system" => ollama_rs::generation::chat::MessageRole::System,
                        "assistant" => ollama_rs::generation::chat::MessageRole::Assistant,
                        _ => ollama_rs::generation::chat::MessageRole::User,
                    };
                    OllamaMessage::new(role, m.content.clone())
                })
                .collect();

            let mut chat_request = ChatMessageRequest::new(self.model.clone(), messages);

            if let Some(temp) = request.temperature {
                let options = ollama_rs::generation::options::GenerationOptions::default()
                    .temperature(temp as f64);
                chat_request = chat_request.options(options);
            }

            let response = self
                .client
                .send_chat_messages(chat_request)
                .await
                .context("Ollama chat request failed")?;

            let content = response.message.map(|m| m.content).unwrap_or_default();

            Ok(LlmResponse {
                content,
                model: self.model.clone(),
                usage: None,
                finish_reason: Some("stop".to_string()),
            })
        }
    }
}

// =============================================================================
// OpenAI Provider
// =============================================================================

#[cfg(feature = "openai")]
pub mod openai {
    use super::*;
    use async_openai::{
        types::{
            ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
            ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
            CreateChatCompletionRequestArgs,
        },
        Client,
    };

    /// OpenAI LLM provider
    pub struct OpenAIProvider {
        client: Client<async_openai::config::OpenAIConfig>,
        model: String,
    }

    impl OpenAIProvider {
        /// Create a new OpenAI provider using the `OPENAI_API_KEY` environment variable
        pub fn new(model: &str) -> Result<Self> {
            let client = Client::new();
            Ok(Self {
                client,
                model: model.to_string(),
            })
        }

        /// Create with an explicit API key
        pub fn with_api_key(api_key: &str, model: &str) -> Result<Self> {
            let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
            let client = Client::with_config(config);
            Ok(Self {
                client,
                model: model.to_string(),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for OpenAIProvider {
        fn name(&self) -> &str {
            "openai"
        }

        fn model(&self) -> &str {
            &self.model
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse> {
            let messages: Vec<ChatCompletionRequestMessage> = request
                .messages
                .iter()
                .map(|m| match m.role.as_str() {
                    "system" => ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: async_openai::types::ChatCompletionRequestSystemMessageContent::Text(
                            m.content.clone(),
                        ),
                        name: None,
                    }),
                    "assistant" => ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(
                            async_openai::types::ChatCompletionRequestAssistantMessageContent::Text(
                                m.content.clone(),
                            ),
                        ),
                        name: None,
                        tool_calls: None,
                        refusal: None,
                        audio: None,
                    }),
                    _ => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                            m.content.clone(),
                        ),
                        name: None,
                    }),
                })
                .collect();

            let mut builder = CreateChatCompletionRequestArgs::default();
            builder.model(&self.model).messages(messages);

            if let Some(temp) = request.temperature {
                builder.temperature(temp);
            }
            if let Some(max) = request.max_tokens {
                builder.max_completion_tokens(max);
            }

            let req = builder.build()?;
            let response = self.client.chat().create(req).await?;

            let choice = response
                .choices
                .first()
                .context("No completion choices returned")?;

            let content = choice.message.content.clone().unwrap_or_default();

            let usage = response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

            Ok(LlmResponse {
                content,
                model: response.model,
                usage,
                finish_reason: choice.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            })
        }
    }
}

// =============================================================================
// Provider Factory
// =============================================================================

use std::sync::Arc;

/// Create an LLM provider from configuration
pub fn create_llm_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    match config {
        #[cfg(feature = "ollama")]
        LlmConfig::Ollama { host, model } => {
            let provider = ollama::OllamaProvider::new(host, model)?;
            Ok(Arc::new(provider))
        }
        #[cfg(not(feature = "ollama"))]
        LlmConfig::Ollama { .. } => {
            anyhow::bail!("Ollama support not enabled. Rebuild with --features ollama")
        }

        #[cfg(feature = "openai")]
        LlmConfig::OpenAi { model, api_key } => {
            let provider = match api_key {
                Some(key) => openai::OpenAIProvider::with_api_key(key, model)?,
                None => openai::OpenAIProvider::new(model)?,
            };
            Ok(Arc::new(provider))
        }
        #[cfg(not(feature = "openai"))]
        LlmConfig::OpenAi { .. } => {
            anyhow::bail!("OpenAI support not enabled. Rebuild with --features openai")
        }
    }
}

// =============================================================================
// Domain contract: cover-letter generation and compensation parsing
// =============================================================================

use crate::types::{Compensation, CompensationPeriod, Evidence, Job};

const COVER_LETTER_SYSTEM_PROMPT: &str = "You are a career-services assistant helping a \
co-op student write a concise, specific cover letter. Reference only the matched evidence \
provided; never invent experience the candidate does not have. Keep it under 400 words.";

/// Generate a cover letter body for `job`, grounded in the matcher's evidence.
///
/// Only requirements the matcher judged `covered` are surfaced to the model, so the
/// letter cannot cite a requirement the résumé doesn't actually support. The token
/// budget is the caller's concern (`max_tokens` on the request); this function does
/// not retry on truncation.
pub async fn generate_cover_letter(
    provider: &dyn LlmProvider,
    job: &Job,
    matched_evidence: &[Evidence],
    max_tokens: u32,
) -> Result<String> {
    let covered: Vec<&Evidence> = matched_evidence.iter().filter(|e| e.covered).collect();
    let evidence_block = if covered.is_empty() {
        "No specific requirement matches were found; write a general letter expressing \
         interest in the role and transferable skills."
            .to_string()
    } else {
        covered
            .iter()
            .map(|e| format!("- {}", e.requirement_text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user_prompt = format!(
        "Job title: {}\nCompany: {}\nSummary: {}\n\nRequirements the candidate matches:\n{}\n\n\
         Write the cover letter body (no salutation boilerplate needed beyond a greeting and sign-off).",
        job.title, job.company, job.summary, evidence_block
    );

    let request = CompletionRequest::with_system(COVER_LETTER_SYSTEM_PROMPT, user_prompt)
        .temperature(0.7)
        .max_tokens(max_tokens);

    let response = provider
        .complete(&request)
        .await
        .with_context(|| format!("cover letter generation failed for job {}", job.job_id))?;

    Ok(response.content)
}

const COMPENSATION_SYSTEM_PROMPT: &str = "Extract the compensation figure from the posting \
text as strict JSON: {\"value\": <number>, \"currency\": <ISO 4217 or null>, \"period\": \
\"hourly\"|\"monthly\"|\"annual\"}. If no compensation figure is present, respond with exactly: null";

#[derive(Debug, serde::Deserialize)]
struct RawCompensation {
    value: f64,
    currency: Option<String>,
    period: String,
}

/// Parse a free-text compensation string (e.g. `"$28.50/hr CAD"`) into a structured
/// [`Compensation`], or `None` if the text carries no extractable figure.
///
/// The LLM is asked for strict JSON; a response that isn't valid JSON or doesn't parse
/// into the expected shape is treated as "no compensation found" rather than an error,
/// since a malformed reply from a best-effort extraction prompt isn't a pipeline fault.
pub async fn extract_compensation(
    provider: &dyn LlmProvider,
    raw_text: &str,
) -> Result<Option<Compensation>> {
    if raw_text.trim().is_empty() {
        return Ok(None);
    }

    let request = CompletionRequest::with_system(COMPENSATION_SYSTEM_PROMPT, raw_text)
        .temperature(0.0)
        .max_tokens(200);

    let response = provider.complete(&request).await.context("compensation extraction failed")?;
    let trimmed = response.content.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }

    let parsed: RawCompensation = match serde_json::from_str(trimmed) {
        Ok(p) => p,
        Err(_) => return Ok(None),
    };

    let period = match parsed.period.to_lowercase().as_str() {
        "hourly" => CompensationPeriod::Hourly,
        "monthly" => CompensationPeriod::Monthly,
        "annual" | "yearly" => CompensationPeriod::Annual,
        _ => return Ok(None),
    };

    Ok(Some(Compensation {
        value: parsed.value,
        currency: parsed.currency.unwrap_or_else(|| "CAD".to_string()),
        period,
    }))
}

#[cfg(test)]
mod domain_tests {
    use super::*;
    use chrono::Utc;

    struct StubProvider {
        reply: String,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        fn model(&self) -> &str {
            "stub-model"
        }
        async fn complete(&self, _request: &CompletionRequest) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: "stub-model".to_string(),
                usage: None,
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    fn sample_job() -> Job {
        Job {
            job_id: "J-1".to_string(),
            title: "Backend Developer Co-op".to_string(),
            company: "Acme Corp".to_string(),
            division: None,
            location: "Waterloo, ON".to_string(),
            level: None,
            openings: 1,
            applications: 0,
            deadline: None,
            summary: "Build REST APIs.".to_string(),
            responsibilities: String::new(),
            skills: String::new(),
            additional_info: String::new(),
            employment_location_arrangement: String::new(),
            work_term_duration: String::new(),
            compensation_raw: String::new(),
            compensation_value: None,
            compensation_currency: None,
            compensation_period: None,
            application_documents_required: vec![],
            targeted_degrees_disciplines: vec![],
            active: true,
            scraped_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn cover_letter_uses_only_covered_evidence() {
        let provider = StubProvider {
            reply: "Dear Hiring Manager, ...".to_string(),
        };
        let evidence = vec![
            Evidence {
                requirement_text: "Experience with Python.".to_string(),
                best_bullet_index: Some(0),
                similarity: 0.8,
                covered: true,
            },
            Evidence {
                requirement_text: "Experience with Kubernetes.".to_string(),
                best_bullet_index: None,
                similarity: 0.1,
                covered: false,
            },
        ];
        let letter = generate_cover_letter(&provider, &sample_job(), &evidence, 400)
            .await
            .unwrap();
        assert!(!letter.is_empty());
    }

    #[tokio::test]
    async fn extract_compensation_parses_strict_json() {
        let provider = StubProvider {
            reply: r#"{"value": 28.5, "currency": "CAD", "period": "hourly"}"#.to_string(),
        };
        let comp = extract_compensation(&provider, "$28.50/hr CAD")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(comp.value, 28.5);
        assert_eq!(comp.period, CompensationPeriod::Hourly);
    }

    #[tokio::test]
    async fn extract_compensation_returns_none_for_null_reply() {
        let provider = StubProvider {
            reply: "null".to_string(),
        };
        let comp = extract_compensation(&provider, "Compensation to be discussed")
            .await
            .unwrap();
        assert!(comp.is_none());
    }

    #[tokio::test]
    async fn extract_compensation_returns_none_for_malformed_json() {
        let provider = StubProvider {
            reply: "not json at all".to_string(),
        };
        let comp = extract_compensation(&provider, "$50k/year").await.unwrap();
        assert!(comp.is_none());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_creation() {
        let system = ChatMessage::system("You are a helpful assistant");
        assert_eq!(system.role, "system");

        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_completion_request_with_system() {
        let req = CompletionRequest::with_system("You are a career coach", "Write a cover letter")
            .temperature(0.7)
            .max_tokens(800);

        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");
        assert_eq!(req.messages[1].role, "user");
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(req.max_tokens, Some(800));
    }

    #[test]
    fn test_temperature_clamping() {
        let req = CompletionRequest::with_system("sys", "test").temperature(5.0);
        assert_eq!(req.temperature, Some(2.0));

        let req = CompletionRequest::with_system("sys", "test").temperature(-1.0);
        assert_eq!(req.temperature, Some(0.0));
    }
}
