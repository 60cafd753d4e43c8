//! Gemini client over the generative language REST API.
//!
//! Endpoints are derived from `LlmConfig::base_url`:
//! - buffered: `POST {base}/v1beta/models/{model}:generateContent`
//! - streaming: `POST {base}/v1beta/models/{model}:streamGenerateContent?alt=sse`
//! - model listing: `GET {base}/v1beta/models`
//!
//! The API key travels in the `x-goog-api-key` header.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use qanda_core::{
    ErrorContext, Fragment, FragmentStream, GenerationClient, LlmConfig, ModelInfo, QandaError,
    QandaResult,
};
use reqwest::header;
use tracing::{debug, error, info};

use crate::sse::SseDecoder;
use crate::wire::{
    ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, ListModelsResponse,
};

const PROVIDER: &str = "gemini";
const MODELS_PAGE_SIZE: u32 = 100;

/// Client for the Gemini API, constructed explicitly and shared by reference
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: LlmConfig,
    base: String,
}

impl GeminiClient {
    /// Create a new client.
    ///
    /// Fails with a configuration error when no API key is configured.
    pub fn new(config: LlmConfig) -> QandaResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| QandaError::Config {
                message: "Gemini API key not found".to_string(),
                source: None,
                context: ErrorContext::new("gemini_client")
                    .with_operation("new")
                    .with_suggestion("Set GEMINI_API_KEY in the environment or a .env file"),
            })?;

        let mut headers = header::HeaderMap::new();
        let mut key_value = header::HeaderValue::from_str(&api_key).map_err(|e| {
            QandaError::Config {
                message: format!("Invalid API key header: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("gemini_client").with_operation("new"),
            }
        })?;
        key_value.set_sensitive(true);
        headers.insert("x-goog-api-key", key_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| QandaError::Config {
                message: format!("Failed to build HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("gemini_client").with_operation("new"),
            })?;

        let base = config.base_url.trim_end_matches('/').to_string();

        info!(
            "Created LLM client for provider: {} with model: {}",
            PROVIDER, config.model
        );

        Ok(Self {
            client,
            config,
            base,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn model_url(&self, method: &str) -> String {
        let model = self
            .config
            .model
            .strip_prefix("models/")
            .unwrap_or(&self.config.model);
        format!("{}/v1beta/models/{}:{}", self.base, model, method)
    }

    fn generation_error(&self, message: String, operation: &str) -> QandaError {
        QandaError::Generation {
            message,
            provider: Some(PROVIDER.to_string()),
            model: Some(self.config.model.clone()),
            context: ErrorContext::new("gemini_client").with_operation(operation),
        }
    }

    fn network_error(&self, err: reqwest::Error, operation: &str) -> QandaError {
        QandaError::Network {
            message: format!("Request to generation service failed: {}", err),
            source: Some(Box::new(err)),
            context: ErrorContext::new("gemini_client")
                .with_operation(operation)
                .with_metadata("model", &self.config.model),
        }
    }

    /// Turn a non-2xx response into a generation error carrying the API message
    async fn status_error(&self, resp: reqwest::Response, operation: &str) -> QandaError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => match envelope.error.status {
                Some(code) => format!("{} ({}): {}", status, code, envelope.error.message),
                None => format!("{}: {}", status, envelope.error.message),
            },
            Err(_) => format!("{}: {}", status, text.chars().take(300).collect::<String>()),
        };

        error!(
            %status,
            model = %self.config.model,
            operation,
            "Generation service returned non-success status"
        );
        self.generation_error(message, operation)
    }

    async fn post(&self, url: &str, prompt: &str, operation: &str) -> QandaResult<reqwest::Response> {
        let body = GenerateContentRequest::from_cfg(&self.config, prompt);

        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "POST {}", url
        );

        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.network_error(e, operation))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, operation).await);
        }
        Ok(resp)
    }
}

/// Decode one streamed event payload
fn parse_event(payload: &str) -> Result<Fragment, String> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(payload) {
        return Err(envelope.error.message);
    }
    serde_json::from_str::<GenerateContentResponse>(payload)
        .map(GenerateContentResponse::into_fragment)
        .map_err(|e| format!("Malformed stream chunk: {}", e))
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> QandaResult<String> {
        let start_time = Instant::now();
        let resp = self
            .post(&self.model_url("generateContent"), prompt, "generate")
            .await?;

        let out: GenerateContentResponse = resp.json().await.map_err(|e| {
            self.generation_error(format!("Failed to decode response: {}", e), "generate")
        })?;

        let text = out.text();
        if text.is_empty() {
            let reason = out.block_reason().unwrap_or_else(|| "unknown".to_string());
            return Err(self.generation_error(
                format!("No text content in response (reason: {})", reason),
                "generate",
            ));
        }

        info!(
            "Generated response in {:?} ({} chars)",
            start_time.elapsed(),
            text.len()
        );
        Ok(text)
    }

    async fn generate_stream(&self, prompt: &str) -> QandaResult<FragmentStream> {
        let url = format!("{}?alt=sse", self.model_url("streamGenerateContent"));
        let resp = self.post(&url, prompt, "generate_stream").await?;
        let this = self.clone();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut body = resp.bytes_stream();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err::<Fragment, QandaError>(this.network_error(e, "generate_stream"));
                        return;
                    }
                };
                for payload in decoder.push(&chunk) {
                    match parse_event(&payload) {
                        Ok(fragment) => yield Ok(fragment),
                        Err(message) => {
                            yield Err(this.generation_error(message, "generate_stream"));
                            return;
                        }
                    }
                }
            }

            if let Some(payload) = decoder.finish() {
                match parse_event(&payload) {
                    Ok(fragment) => yield Ok(fragment),
                    Err(message) => yield Err(this.generation_error(message, "generate_stream")),
                }
            }
        };

        Ok(stream.boxed())
    }

    async fn list_models(&self) -> QandaResult<Vec<ModelInfo>> {
        let url = format!("{}/v1beta/models", self.base);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("pageSize", MODELS_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| self.network_error(e, "list_models"))?;
            if !resp.status().is_success() {
                return Err(self.status_error(resp, "list_models").await);
            }

            let page: ListModelsResponse = resp.json().await.map_err(|e| {
                self.generation_error(format!("Failed to decode model list: {}", e), "list_models")
            })?;
            models.extend(page.models.into_iter().map(ModelInfo::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} models", models.len());
        Ok(models)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
