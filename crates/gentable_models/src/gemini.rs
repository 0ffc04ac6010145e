//! Google Gemini provider client.
//!
//! One [`GeminiClient`] is bound to a single model name (the same model a
//! request's `GenerateRequest.model` names); the engine's [`gentable_interface`]
//! seam (`LmEngine`, `Streaming`, `Embedder`) is everything `LLMGen` and
//! `EmbedGen` (spec §4.C) see — no Gemini-specific types cross that
//! boundary.
//!
//! Talks to the `generativelanguage.googleapis.com` REST API directly over
//! `reqwest` rather than through a vendor SDK, so the wire shapes below are
//! this crate's only dependency on Gemini's API staying stable.

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use gentable_core::{GenerateChunk, GenerateRequest, GenerateResponse, Input, Output, Role};
use gentable_error::{GentableResult, ProviderError, ProviderErrorKind};
use gentable_interface::{Embedder, LmEngine, Streaming};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, instrument, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini chat model, addressed through the generic `LmEngine`/`Streaming` seam.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

/// A Gemini embedding model, addressed through the `Embedder` seam.
pub struct GeminiEmbedder {
    http: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: u32,
}

impl GeminiClient {
    /// Bind a client to `model` (e.g. `"gemini-2.0-flash"`), authenticating
    /// every call with `api_key`.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), api_key: api_key.into(), model: model.into() }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{API_BASE}/models/{model}:{method}?key={}", self.api_key)
    }

    fn stream_endpoint(&self, model: &str) -> String {
        format!("{API_BASE}/models/{model}:streamGenerateContent?alt=sse&key={}", self.api_key)
    }
}

impl GeminiEmbedder {
    /// Bind an embedder to `model` (e.g. `"text-embedding-004"`), whose
    /// output vectors have `dimensions` components.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimensions: u32) -> Self {
        Self { http: reqwest::Client::new(), api_key: api_key.into(), model: model.into(), dimensions }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Default)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize, Clone)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Clone)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

fn extract_text(input: &Input) -> Option<&str> {
    match input {
        Input::Text(text) => Some(text.as_str()),
        _ => None,
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        // Gemini has no distinct system-turn role in `contents`; system
        // prompts go in `systemInstruction` instead (handled by the caller).
        Role::System => "user",
        Role::Assistant => "model",
    }
}

fn build_request(req: &GenerateRequest) -> GenerateContentRequest {
    let mut system_instruction = None;
    let mut contents = Vec::with_capacity(req.messages.len());

    for message in &req.messages {
        let text: String = message.content.iter().filter_map(extract_text).collect::<Vec<_>>().join("\n");
        if text.is_empty() {
            continue;
        }
        if message.role == Role::System {
            system_instruction = Some(Content { role: "user".to_string(), parts: vec![Part { text }] });
            continue;
        }
        contents.push(Content { role: role_name(message.role).to_string(), parts: vec![Part { text }] });
    }

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: Some(GenerationConfig {
            max_output_tokens: req.max_tokens,
            temperature: req.temperature,
        }),
    }
}

fn provider_error_for_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let code = status.as_u16();
    if code == 429 {
        return ProviderError::new(ProviderErrorKind::RateLimited { status_code: code, message: body.to_string() });
    }
    if code >= 500 {
        return ProviderError::new(ProviderErrorKind::Transient { status_code: code, message: body.to_string() });
    }
    if code == 401 || code == 403 {
        return ProviderError::new(ProviderErrorKind::Authentication(body.to_string()));
    }
    let lower = body.to_lowercase();
    if code == 400 && (lower.contains("token") && (lower.contains("exceed") || lower.contains("too long"))) {
        return ProviderError::new(ProviderErrorKind::ContextOverflow(body.to_string()));
    }
    ProviderError::new(ProviderErrorKind::InvalidRequest(body.to_string()))
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::new(ProviderErrorKind::Transient { status_code: 0, message: "request timed out".to_string() })
    } else {
        ProviderError::new(ProviderErrorKind::Transient { status_code: 0, message: err.to_string() })
    }
}

impl GeminiClient {
    async fn generate_content(&self, req: &GenerateRequest, model: &str) -> GentableResult<GenerateContentResponse> {
        let body = build_request(req);
        let response = self
            .http
            .post(self.endpoint(model, "generateContent"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(provider_error_for_status(status, &text).into());
        }
        serde_json::from_str(&text)
            .map_err(|err| ProviderError::new(ProviderErrorKind::MalformedResponse(err.to_string())).into())
    }
}

#[async_trait]
impl LmEngine for GeminiClient {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn generate(&self, req: &GenerateRequest) -> GentableResult<GenerateResponse> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let response = self.generate_content(req, model).await?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
            .unwrap_or_default();
        Ok(GenerateResponse { outputs: vec![Output::Text(text)] })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Streaming for GeminiClient {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn generate_stream(
        &self,
        req: &GenerateRequest,
    ) -> GentableResult<Pin<Box<dyn Stream<Item = GentableResult<GenerateChunk>> + Send>>> {
        let model = req.model.clone().unwrap_or_else(|| self.model.clone());
        let body = build_request(req);
        let url = self.stream_endpoint(&model);

        let response = self.http.post(url).json(&body).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(provider_error_for_status(status, &text).into());
        }

        let mut byte_stream = response.bytes_stream();
        let stream = try_stream! {
            let mut buffer = String::new();
            let mut prompt_tokens = 0u64;
            let mut completion_tokens = 0u64;

            while let Some(bytes) = byte_stream.next().await {
                let bytes = bytes.map_err(transport_error)?;
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find("\n\n") {
                    let event = buffer[..pos].to_string();
                    buffer.drain(..pos + 2);

                    let Some(payload) = event.strip_prefix("data: ") else { continue };
                    if payload.trim() == "[DONE]" {
                        continue;
                    }
                    let parsed: GenerateContentResponse = match serde_json::from_str(payload) {
                        Ok(parsed) => parsed,
                        Err(err) => {
                            warn!(error = %err, "skipping malformed Gemini SSE event");
                            continue;
                        }
                    };

                    if let Some(usage) = parsed.usage_metadata {
                        prompt_tokens = usage.prompt_token_count;
                        completion_tokens = usage.candidates_token_count;
                    }

                    for candidate in parsed.candidates {
                        if let Some(content) = candidate.content {
                            let delta: String = content.parts.into_iter().map(|p| p.text).collect();
                            if !delta.is_empty() {
                                yield GenerateChunk {
                                    delta_text: Some(delta),
                                    prompt_tokens: None,
                                    completion_tokens: None,
                                    finish_reason: None,
                                };
                            }
                        }
                        if let Some(reason) = candidate.finish_reason {
                            yield GenerateChunk {
                                delta_text: None,
                                prompt_tokens: Some(prompt_tokens),
                                completion_tokens: Some(completion_tokens),
                                finish_reason: Some(normalize_finish_reason(&reason)),
                            };
                        }
                    }
                }
            }
            debug!("Gemini stream exhausted");
        };

        Ok(Box::pin(stream))
    }
}

fn normalize_finish_reason(reason: &str) -> String {
    match reason {
        "STOP" => "stop".to_string(),
        "MAX_TOKENS" => "length".to_string(),
        other => other.to_lowercase(),
    }
}

#[derive(Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Embedding,
}

#[derive(Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    #[instrument(skip(self, inputs), fields(model = %self.model, count = inputs.len()))]
    async fn embed(&self, inputs: &[String]) -> GentableResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for text in inputs {
            let body = EmbedContentRequest {
                content: Content { role: "user".to_string(), parts: vec![Part { text: text.clone() }] },
            };
            let url = format!("{API_BASE}/models/{}:embedContent?key={}", self.model, self.api_key);
            let response = self.http.post(url).json(&body).send().await.map_err(transport_error)?;
            let status = response.status();
            let text_body = response.text().await.map_err(transport_error)?;
            if !status.is_success() {
                return Err(provider_error_for_status(status, &text_body).into());
            }
            let parsed: EmbedContentResponse = serde_json::from_str(&text_body)
                .map_err(|err| ProviderError::new(ProviderErrorKind::MalformedResponse(err.to_string())))?;
            vectors.push(parsed.embedding.values);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> u32 {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gentable_core::Message;

    #[test]
    fn build_request_splits_system_instruction_from_contents() {
        let req = GenerateRequest {
            messages: vec![
                Message { role: Role::System, content: vec![Input::Text("be terse".to_string())] },
                Message { role: Role::User, content: vec![Input::Text("hi".to_string())] },
            ],
            max_tokens: Some(100),
            temperature: Some(0.2),
            model: None,
        };
        let built = build_request(&req);
        assert!(built.system_instruction.is_some());
        assert_eq!(built.contents.len(), 1);
        assert_eq!(built.contents[0].role, "user");
    }

    #[test]
    fn finish_reason_normalizes_to_spec_vocabulary() {
        assert_eq!(normalize_finish_reason("STOP"), "stop");
        assert_eq!(normalize_finish_reason("MAX_TOKENS"), "length");
    }

    #[test]
    fn rate_limit_status_maps_to_retryable_provider_error() {
        use gentable_error::RetryableError;
        let err = provider_error_for_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(err.is_retryable());
    }

    #[test]
    fn bad_request_status_is_not_retryable() {
        use gentable_error::RetryableError;
        let err = provider_error_for_status(reqwest::StatusCode::BAD_REQUEST, "bad field");
        assert!(!err.is_retryable());
    }
}
