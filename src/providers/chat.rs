/*!
 * Analysis backend speaking the OpenAI-compatible chat completions protocol.
 *
 * The legal prompts live here: `summarize` sends the document as the user
 * message behind a system prompt, `analyze` wraps the document in a single
 * sectioned analysis prompt.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::http::ServiceClient;
use super::{AnalysisMode, AnalysisService, SessionContext};
use crate::errors::{PipelineError, ProviderError, Stage};

/// Completions path relative to the configured endpoint
const COMPLETIONS_PATH: &str = "chat/completions";

const SUMMARIZE_SYSTEM_PROMPT: &str = "Check whether the following is a legal document or not. \
If it is, summarize it briefly. If it is not, inform the user that it does not appear to be a \
legal document and suggest verifying the input.";

const ANALYZE_PROMPT: &str = "You are a legal document analysis expert. Analyze the provided \
document comprehensively and structure your response with the following sections:

1. SUMMARY: A concise summary of the document in 2-3 sentences.
2. DOCUMENT TYPE: Identify what kind of legal document this is.
3. KEY PARTIES: List and briefly describe all relevant parties mentioned.
4. KEY PROVISIONS: Identify the main clauses or provisions.
5. LEGAL IMPLICATIONS: Explain potential legal consequences or implications.
6. RECOMMENDATIONS: Provide actionable advice regarding this document.
7. RED FLAGS: Highlight any concerning elements requiring special attention.
8. EXAMPLES: Provide suitable examples where possible so that it is easier to understand.

Format each section with headers and clear points in a detailed manner, so that it is easy to \
understand even for someone who knows nothing about the subject. Mention any real incident that \
is similar to this document. All the section headings must be in bold and the remaining text in \
a normal format.

Document to analyze: ";

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat completions request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,

    /// Always false, the answer is read in one piece
    stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }

    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Chat completions response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Analysis backend on top of a chat completions API
#[derive(Debug, Clone)]
pub struct ChatAnalysisClient {
    http: ServiceClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatAnalysisClient {
    /// Create a client for the chat API at `endpoint`, authenticated with `api_key`
    pub fn new(
        endpoint: &str,
        api_key: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::AuthenticationError(
                "Chat analysis backend requires an API key".to_string(),
            ));
        }

        // The chat API authenticates the application, not the user.
        let http = ServiceClient::new(endpoint, timeout)?.with_session(SessionContext::with_token(api_key));

        Ok(Self {
            http,
            model: model.into(),
            temperature: 0.3,
            max_tokens: 2048,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build the completions request for `text` under `mode`
    pub fn build_request(&self, text: &str, mode: AnalysisMode) -> ChatRequest {
        let request = ChatRequest::new(&self.model)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        match mode {
            AnalysisMode::Summarize => request
                .add_message("system", SUMMARIZE_SYSTEM_PROMPT)
                .add_message("user", text),
            AnalysisMode::Analyze => request.add_message("user", format!("{}{}", ANALYZE_PROMPT, text)),
        }
    }

    /// Text of the first choice
    pub fn extract_text_from_response(response: ChatResponse) -> Option<String> {
        response.choices.into_iter().next().map(|choice| choice.message.content)
    }
}

#[async_trait]
impl AnalysisService for ChatAnalysisClient {
    async fn analyze(&self, text: &str, mode: AnalysisMode) -> Result<String, PipelineError> {
        debug!("Requesting {} from chat model {}", mode, self.model);

        let request = self.build_request(text, mode);
        let response: ChatResponse = self
            .http
            .post_json(COMPLETIONS_PATH, &request)
            .await
            .map_err(|e| PipelineError::from_provider(Stage::Analyze, e))?;

        Self::extract_text_from_response(response).ok_or_else(|| {
            warn!("Chat model {} returned no choices", self.model);
            PipelineError::AnalysisService("Chat completion returned no choices".to_string())
        })
    }
}
