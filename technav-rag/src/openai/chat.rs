//! OpenAI chat-completions client implementing [`GenerativeModel`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{api_key_from_env, base_url_from_env, endpoint, error_detail, OPENAI_API_BASE};
use crate::error::{RagError, Result};
use crate::generation::GenerativeModel;

/// The default chat model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A [`GenerativeModel`] backed by an OpenAI-compatible `/chat/completions` endpoint.
///
/// The prompt is sent as a single user message and the first choice's
/// content is returned.
///
/// # Example
///
/// ```rust,ignore
/// use technav_rag::openai::OpenAIChatModel;
///
/// let model = OpenAIChatModel::from_env()?.with_model("gpt-4o").with_temperature(0.2);
/// let answer = model.generate("Say hi").await?;
/// ```
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAIChatModel {
    /// Create a client with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::Configuration("OpenAI API key must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            temperature: None,
            max_tokens: None,
        })
    }

    /// Create a client from `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from_env().ok_or_else(|| {
            RagError::Configuration("OPENAI_API_KEY environment variable not set".into())
        })?;
        Ok(Self::new(api_key)?.with_base_url(base_url_from_env()))
    }

    /// Point the client at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the completion length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Map an unsuccessful HTTP status to an error kind.
fn classify_status(model: &str, status: StatusCode, detail: &str) -> RagError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RagError::Configuration(format!(
            "{model} rejected the API key ({status}): {detail}"
        )),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => RagError::Transient {
            operation: "generate".into(),
            message: format!("{model} returned {status}: {detail}"),
        },
        _ => RagError::Generation {
            model: model.into(),
            message: format!("API returned {status}: {detail}"),
        },
    }
}

/// Map a transport failure to an error kind.
fn classify_transport(model: &str, e: &reqwest::Error) -> RagError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        RagError::Transient {
            operation: "generate".into(),
            message: format!("could not reach {model}: {e}"),
        }
    } else {
        RagError::Generation { model: model.into(), message: format!("request failed: {e}") }
    }
}

#[async_trait]
impl GenerativeModel for OpenAIChatModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting chat completion");

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "chat request failed");
                classify_transport(&self.model, &e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(model = %self.model, %status, "chat API error");
            return Err(classify_status(&self.model, status, &detail));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse chat response");
            RagError::Generation {
                model: self.model.clone(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::Generation {
                model: self.model.clone(),
                message: "response contained no completion".into(),
            })
    }

    fn name(&self) -> &str {
        &self.model
    }
}
