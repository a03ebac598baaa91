//! OpenAI-compatible HTTP client for the chat and embedding oracles.

use super::{ChatOracle, ChatRequest, EmbeddingOracle, OracleError};
use crate::settings::OracleSettings;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;

/// Client for `/chat/completions` and `/embeddings`
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    chat_model: String,
    embedding_model: String,
    api_key_env: String,
    api_key: ApiKey,
}

/// Bearer credential as resolved at construction
#[derive(Debug, Clone)]
enum ApiKey {
    Missing,
    Invalid,
    Bearer(header::HeaderValue),
}

impl ApiKey {
    fn resolve(api_key: Option<String>) -> Self {
        let Some(api_key) = api_key else {
            return Self::Missing;
        };
        match header::HeaderValue::from_str(&format!("Bearer {}", api_key)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Self::Bearer(value)
            }
            Err(_) => Self::Invalid,
        }
    }
}

impl OpenAiClient {
    /// Build a client from settings. A missing or malformed key is not an
    /// error here; each call reports it instead so the server can still start.
    pub fn new(settings: &OracleSettings, api_key: Option<String>) -> Result<Self, OracleError> {
        let api_key = ApiKey::resolve(api_key);
        if matches!(api_key, ApiKey::Invalid) {
            tracing::warn!(
                env_var = %settings.api_key_env,
                "API key is not a valid header value; oracle calls will fail"
            );
        }

        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("rag-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Url::join drops the last path segment unless it ends with a slash
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            api_key_env: settings.api_key_env.clone(),
            api_key,
        })
    }

    /// Build a client reading the key from the configured environment variable
    pub fn from_env(settings: &OracleSettings) -> Result<Self, OracleError> {
        Self::new(settings, settings.api_key())
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, OracleError> {
        let auth = match &self.api_key {
            ApiKey::Bearer(value) => value.clone(),
            ApiKey::Missing => {
                return Err(OracleError::MissingApiKey {
                    env_var: self.api_key_env.clone(),
                })
            }
            ApiKey::Invalid => {
                return Err(OracleError::InvalidApiKey {
                    env_var: self.api_key_env.clone(),
                })
            }
        };

        let url = self.base_url.join(path)?;
        debug!(url = %url, "POST oracle request");

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, auth)
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn api_error(status: u16, body: &str) -> OracleError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.to_string());
    OracleError::Api { status, message }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait::async_trait]
impl ChatOracle for OpenAiClient {
    async fn complete_json(&self, request: ChatRequest) -> Result<String, OracleError> {
        let body = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "response_format": { "type": "json_object" },
            "temperature": request.temperature,
        });

        let response: ChatCompletionResponse = self.post("chat/completions", &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| OracleError::InvalidResponse("completion had no content".to_string()))
    }
}

#[async_trait::async_trait]
impl EmbeddingOracle for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, OracleError> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });

        let response: EmbeddingResponse = self.post("embeddings", &body).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| OracleError::InvalidResponse("embedding response had no vector".to_string()))
    }
}
