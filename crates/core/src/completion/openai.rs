//! OpenAI chat-completions backend.
//!
//! Requests go out at temperature zero. Two error shapes are absorbed with
//! one bounded retry each: a rejected `response_format` (resent without it)
//! and an unavailable model (resent with the fallback model). Anything
//! else is returned to the caller.

use std::time::Duration;

use serde_json::{json, Value};

use super::{CompletionRequest, CompletionService};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};

/// Raw HTTP answer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal POST interface so the retry policy can be exercised offline.
pub trait Transport: Send + Sync {
    fn post_json(&self, url: &str, api_key: &str, body: &str) -> Result<TransportResponse>;
}

/// Blocking `reqwest` transport.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn post_json(&self, url: &str, api_key: &str, body: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(TransportResponse { status, body })
    }
}

pub struct OpenAiClient<T: Transport> {
    transport: T,
    api_key: String,
    model: String,
    fallback_model: String,
    endpoint: String,
}

impl OpenAiClient<ReqwestTransport> {
    /// Client over HTTP using the endpoint, models and timeout from `config`.
    pub fn from_config(config: &PipelineConfig, api_key: &str) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(transport, config, api_key))
    }
}

impl<T: Transport> OpenAiClient<T> {
    pub fn with_transport(transport: T, config: &PipelineConfig, api_key: &str) -> Self {
        Self {
            transport,
            api_key: api_key.to_string(),
            model: config.model.clone(),
            fallback_model: config.fallback_model.clone(),
            endpoint: config.endpoint.clone(),
        }
    }
}

fn request_body(model: &str, request: &CompletionRequest, json_mode: bool) -> Value {
    let mut body = json!({
        "model": model,
        "messages": request.messages,
        "max_tokens": request.max_tokens,
        "temperature": 0,
    });
    if json_mode {
        body["response_format"] = json!({"type": "json_object"});
    }
    body
}

/// `error.message` of an error body, or the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn is_request_shape_error(message: &str) -> bool {
    let m = message.to_lowercase();
    ["response_format", "unsupported", "unrecognized"]
        .iter()
        .any(|needle| m.contains(needle))
}

fn is_model_availability_error(message: &str) -> bool {
    let m = message.to_lowercase();
    ["model", "not found", "does not exist", "unknown"]
        .iter()
        .any(|needle| m.contains(needle))
}

fn reply_content(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => v["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string(),
        Err(e) => {
            log::warn!("Unparsable completion envelope: {}", e);
            String::new()
        }
    }
}

impl<T: Transport> CompletionService for OpenAiClient<T> {
    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut model = self.model.clone();
        let mut json_mode = request.json_mode;
        let mut shape_retried = false;
        let mut model_retried = false;

        loop {
            let body = request_body(&model, request, json_mode).to_string();
            let response = self.transport.post_json(&self.endpoint, &self.api_key, &body)?;
            if response.status < 400 {
                return Ok(reply_content(&response.body));
            }

            let message = error_message(&response.body);
            if json_mode && !shape_retried && is_request_shape_error(&message) {
                log::warn!("{} rejected response_format, retrying without it", model);
                json_mode = false;
                shape_retried = true;
                continue;
            }
            if !model_retried
                && model != self.fallback_model
                && is_model_availability_error(&message)
            {
                log::warn!("Model {} unavailable, falling back to {}", model, self.fallback_model);
                model = self.fallback_model.clone();
                model_retried = true;
                // The fallback model starts from the caller's request shape.
                json_mode = request.json_mode;
                shape_retried = false;
                continue;
            }
            return Err(Error::Service {
                status: response.status,
                message,
            });
        }
    }
}
