use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docsift_core::{LlmProvider, LlmRequest, LlmResponse};

use super::bare_model;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Local Ollama chat provider (`/api/chat`, non-streaming).
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

fn chat_body(request: &LlmRequest) -> OllamaChatRequest {
    let mut messages = Vec::new();
    if !request.system_prompt.is_empty() {
        messages.push(OllamaChatMessage {
            role: "system".to_string(),
            content: request.system_prompt.clone(),
        });
    }
    messages.push(OllamaChatMessage {
        role: "user".to_string(),
        content: request.user_prompt.clone(),
    });

    OllamaChatRequest {
        model: bare_model(&request.model).to_string(),
        messages,
        stream: false,
        options: OllamaOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        },
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let body = chat_body(request);
        let model = body.model.clone();

        debug!(model = %model, max_tokens = request.max_tokens, "Sending request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        let tokens_used = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(LlmResponse {
            content: chat_response.message.content.trim().to_string(),
            provider: "ollama".to_string(),
            model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
