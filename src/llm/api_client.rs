use super::error::{extract_api_error, GatewayError};
use crate::config::LlmSettings;
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct APIClient {
    client: Client,
    settings: LlmSettings,
}

impl APIClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build HTTP client for the LLM endpoint")?;
        Ok(APIClient { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Send one chat-completion request and return the first choice's text.
    pub(crate) async fn complete(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let api = &self.settings.api_name;

        let mut builder = self.client.post(&self.settings.api_url).json(request);
        if !self.settings.api_key.is_empty() {
            builder = builder.bearer_auth(&self.settings.api_key);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = extract_api_error(&payload);
            warn!("{} API returned {}: {}", api, status, message);
            return Err(GatewayError::Status {
                api: api.clone(),
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&payload).map_err(|e| {
            warn!("{} API returned an unparseable body: {}", api, e);
            GatewayError::UnexpectedResponse {
                api: api.clone(),
                detail: e.to_string(),
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                warn!("{} API response had no choices[0].message.content", api);
                GatewayError::UnexpectedResponse {
                    api: api.clone(),
                    detail: "missing choices[0].message.content".to_string(),
                }
            })?;

        debug!("{} API answered with {} chars", api, content.len());
        Ok(content)
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        let api = self.settings.api_name.clone();
        warn!("{} API call failed: {}", api, err);
        if err.is_timeout() {
            GatewayError::Timeout {
                api,
                secs: self.settings.timeout.as_secs(),
            }
        } else {
            GatewayError::Transport {
                api,
                cause: err.to_string(),
            }
        }
    }
}
