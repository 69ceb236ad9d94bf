//! OpenAI-compatible HTTP clients for embeddings and chat completions.
//!
//! This module is only available when the `openai` feature is enabled. Both
//! clients accept a custom base URL, so any server speaking the OpenAI wire
//! format (vLLM, Ollama, LM Studio, ...) works as well.

mod chat;
mod embedding;

pub use chat::OpenAIChatModel;
pub use embedding::OpenAIEmbeddingProvider;

use serde::Deserialize;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the human-readable message out of an OpenAI error body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

fn api_key_from_env() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|key| !key.trim().is_empty())
}

fn base_url_from_env() -> String {
    std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_API_BASE.to_string())
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}
