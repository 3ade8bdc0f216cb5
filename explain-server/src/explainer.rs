// Explainers: the OpenAI-compatible chat completions client and a keyless
// canned-text fallback

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::OpenAiConfig;

/// Answer for a request the upstream model could not serve
pub const APOLOGY: &str = "Sorry, I couldn't generate an explanation right now.";

/// Context longer than this earns the mock explainer's context note
const MOCK_CONTEXT_NOTE_THRESHOLD: usize = 50;

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that provides clear, accurate \
explanations of terms and concepts. Keep explanations concise and relevant to the context provided.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, poem_openapi::Enum)]
#[oai(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Simple,
    Technical,
    Detailed,
}

impl Style {
    fn instruction(self) -> &'static str {
        match self {
            Style::Simple => {
                "Provide a simple, easy-to-understand explanation in 1-2 sentences. \
                 Use everyday language and avoid technical jargon."
            }
            Style::Technical => {
                "Provide a technical explanation in 2-3 sentences. \
                 Include relevant technical details and concepts."
            }
            Style::Detailed => {
                "Provide a comprehensive explanation in 3-4 sentences. \
                 Include context, examples, and related concepts."
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExplainerError {
    #[error("OpenAI API key is not configured")]
    NotConfigured,
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Completion contained no text")]
    EmptyCompletion,
}

impl ExplainerError {
    /// Failures of the upstream model, as opposed to local misconfiguration
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ExplainerError::Request(_) | ExplainerError::Api { .. } | ExplainerError::EmptyCompletion
        )
    }
}

#[async_trait]
pub trait Explainer: Send + Sync {
    /// Name reported as `current_explainer`
    fn name(&self) -> &'static str;

    /// Whether an OpenAI key backs this explainer
    fn is_configured(&self) -> bool;

    async fn explain(
        &self,
        text: &str,
        context: &str,
        style: Style,
    ) -> Result<String, ExplainerError>;
}

pub fn build_prompt(text: &str, context: &str, style: Style) -> String {
    let mut prompt = format!("Explain the term or phrase '{}'", text);
    if context.trim().is_empty() {
        prompt.push_str(":\n\n");
    } else {
        prompt.push_str(&format!(
            " based on the following context:\n\n{}\n\n",
            context
        ));
    }
    prompt.push_str(style.instruction());
    prompt.push_str("\n\nExplanation:");
    prompt
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiExplainer {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiExplainer {
    pub fn new(config: OpenAiConfig) -> Result<Self, ExplainerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }
}

#[async_trait]
impl Explainer for OpenAiExplainer {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    async fn explain(
        &self,
        text: &str,
        context: &str,
        style: Style,
    ) -> Result<String, ExplainerError> {
        let api_key = self.api_key().ok_or(ExplainerError::NotConfigured)?;
        let prompt = build_prompt(text, context, style);

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ExplainerError::Api { status, message });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ExplainerError::EmptyCompletion)
    }
}

/// Keyless explainer with style-specific canned text, used when no API key
/// is configured
#[derive(Debug, Default)]
pub struct MockExplainer;

#[async_trait]
impl Explainer for MockExplainer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn explain(
        &self,
        text: &str,
        context: &str,
        style: Style,
    ) -> Result<String, ExplainerError> {
        let text = text.trim();
        let mut explanation = match style {
            Style::Simple => format!(
                "**Simple Explanation:** '{}' refers to a concept or term that is commonly used in this context. \
                 Based on the surrounding text, it appears to be related to the topic being discussed.",
                text
            ),
            Style::Technical => format!(
                "**Technical Analysis:** The term '{}' in this context represents a specific technical concept. \
                 From the provided context, it can be analyzed as a component within the broader subject matter, \
                 demonstrating particular characteristics and applications.",
                text
            ),
            Style::Detailed => format!(
                "**Detailed Explanation:** '{}' is a comprehensive term that encompasses multiple aspects. \
                 In the context provided, it functions as a key element within the broader framework. \
                 The surrounding text suggests it plays a significant role in the overall discussion, \
                 with implications for understanding the subject matter more deeply.",
                text
            ),
        };

        if context.trim().chars().count() > MOCK_CONTEXT_NOTE_THRESHOLD {
            explanation.push_str(
                "\n\n**Context Note:** The surrounding text provides additional context \
                 that helps clarify the meaning and usage of this term.",
            );
        }
        Ok(explanation)
    }
}

/// OpenAI when a key is configured, the mock explainer otherwise
pub fn select_explainer(config: OpenAiConfig) -> Result<Arc<dyn Explainer>, ExplainerError> {
    let openai = OpenAiExplainer::new(config)?;
    if openai.is_configured() {
        Ok(Arc::new(openai))
    } else {
        Ok(Arc::new(MockExplainer))
    }
}
