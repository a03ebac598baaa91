//! External semantic oracles.
//!
//! Both oracles are fallible, latency-bearing black boxes. Strategies hold
//! them as trait objects so tests can substitute deterministic fakes.

mod openai;

pub use openai::OpenAiClient;

/// A single chat-completion call that must answer with a JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Text in, JSON object text out
#[async_trait::async_trait]
pub trait ChatOracle: Send + Sync {
    async fn complete_json(&self, request: ChatRequest) -> Result<String, OracleError>;
}

/// Text in, fixed-length vector out
#[async_trait::async_trait]
pub trait EmbeddingOracle: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, OracleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Oracle returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("Invalid API key: environment variable {env_var} is not a valid header value")]
    InvalidApiKey { env_var: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
