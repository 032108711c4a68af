//! Gemini REST backend.
//!
//! Talks to the Generative Language API: `generateContent` for single-shot
//! and multimodal requests, `streamGenerateContent` (SSE) for chat,
//! `predict` for image generation, and `predictLongRunning` plus operation
//! polling for image-to-video animation.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tokio_stream::wrappers::ReceiverStream;

use super::{
    AnimationRequest, AspectRatio, GenerateRequest, GenerativeBackend, OperationHandle,
    OperationStatus, Role, TextFragmentStream,
};
use crate::config::CogniConfig;
use crate::error::{CoreError, Result};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    text_model: String,
    image_model: String,
    video_model: String,
}

impl GeminiBackend {
    pub fn new(config: &CogniConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::backend_error(&config.text_model, e))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn generate_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            API_BASE, self.text_model, method, self.api_key
        )
    }

    fn request_body(request: &GenerateRequest) -> Value {
        let mut contents = Vec::with_capacity(request.turns.len());
        for turn in &request.turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "model",
            };
            contents.push(json!({
                "role": role,
                "parts": [{ "text": turn.text }],
            }));
        }

        // Inline media rides on the final user turn
        if let Some(media) = &request.media {
            if let Some(parts) = contents
                .last_mut()
                .and_then(|last| last["parts"].as_array_mut())
            {
                parts.push(media.to_inline_part());
            }
        }

        let mut body = json!({ "contents": contents });

        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        if let Some(schema) = &request.response_schema {
            body["generationConfig"] = json!({
                "response_mime_type": "application/json",
                "response_schema": schema,
            });
        }

        body
    }

    async fn post_json(&self, url: &str, model: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::backend_error(model, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::BackendStatus {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CoreError::backend_error(model, e))
    }

    /// Parse one SSE line: `None` for keep-alives, comments, and events
    /// without text; `Some(Err)` for undecodable payloads.
    fn parse_sse_data(model: &str, line: &str) -> Option<Result<String>> {
        let data = line.trim().strip_prefix("data:")?.trim();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }
        match serde_json::from_str::<Value>(data) {
            Ok(event) => match Self::extract_text(model, &event) {
                Ok(text) if !text.is_empty() => Some(Ok(text)),
                _ => None,
            },
            Err(e) => Some(Err(CoreError::malformed_response(
                model,
                format!("bad SSE event: {}", e),
            ))),
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(model: &str, payload: &Value) -> Result<String> {
        let parts = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                CoreError::malformed_response(model, "response has no candidate content parts")
            })?;

        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();
        Ok(text)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let body = Self::request_body(&request);
        tracing::debug!(model = %self.text_model, "generateContent request");

        let url = self.generate_url("generateContent");
        let payload = self.post_json(&url, &self.text_model, &body).await?;
        Self::extract_text(&self.text_model, &payload)
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextFragmentStream> {
        use futures::StreamExt;

        let body = Self::request_body(&request);
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            API_BASE, self.text_model, self.api_key
        );
        let model = self.text_model.clone();

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::backend_error(&model, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::BackendStatus {
                model,
                status: status.as_u16(),
                body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(32);

        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(CoreError::backend_error(&model, e))).await;
                        return;
                    }
                };
                for line in lines.push(&chunk) {
                    match Self::parse_sse_data(&model, &line) {
                        Some(Ok(text)) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                        Some(Err(e)) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                        None => {}
                    }
                }
            }

            // The body may end without a trailing newline on the last event
            if let Some(line) = lines.finish() {
                if let Some(fragment) = Self::parse_sse_data(&model, &line) {
                    let _ = tx.send(fragment).await;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<Vec<u8>> {
        let url = format!(
            "{}/models/{}:predict?key={}",
            API_BASE, self.image_model, self.api_key
        );
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "outputMimeType": "image/jpeg",
                "aspectRatio": aspect_ratio.as_str(),
            },
        });

        let payload = self.post_json(&url, &self.image_model, &body).await?;
        let encoded = payload["predictions"][0]["bytesBase64Encoded"]
            .as_str()
            .ok_or_else(|| {
                CoreError::malformed_response(&self.image_model, "prediction has no image bytes")
            })?;

        BASE64.decode(encoded).map_err(|e| {
            CoreError::malformed_response(
                &self.image_model,
                format!("image bytes are not valid base64: {}", e),
            )
        })
    }

    async fn start_animation(&self, request: AnimationRequest) -> Result<OperationHandle> {
        let url = format!(
            "{}/models/{}:predictLongRunning?key={}",
            API_BASE, self.video_model, self.api_key
        );
        let body = json!({
            "instances": [{
                "prompt": request.prompt,
                "image": {
                    "bytesBase64Encoded": request.image.to_base64(),
                    "mimeType": request.image.mime_type,
                },
            }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": request.aspect_ratio.as_str(),
            },
        });

        let payload = self.post_json(&url, &self.video_model, &body).await?;
        let name = payload["name"].as_str().ok_or_else(|| {
            CoreError::malformed_response(&self.video_model, "operation has no name")
        })?;

        tracing::info!(operation = name, "video generation started");
        Ok(OperationHandle {
            name: name.to_string(),
        })
    }

    async fn poll_animation(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        let url = format!("{}/{}?key={}", API_BASE, handle.name, self.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::backend_error(&self.video_model, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::BackendStatus {
                model: self.video_model.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| CoreError::backend_error(&self.video_model, e))?;

        if !payload["done"].as_bool().unwrap_or(false) {
            return Ok(OperationStatus::Pending);
        }

        if let Some(error) = payload.get("error") {
            return Ok(OperationStatus::Failed {
                detail: error["message"]
                    .as_str()
                    .unwrap_or("operation reported an error")
                    .to_string(),
            });
        }

        let uri = payload["response"]["generateVideoResponse"]["generatedSamples"][0]["video"]
            ["uri"]
            .as_str();

        match uri {
            Some(uri) => Ok(OperationStatus::Complete {
                video_uri: uri.to_string(),
            }),
            None => Ok(OperationStatus::Failed {
                detail: "Video generation finished but no download link was provided.".to_string(),
            }),
        }
    }
}

/// Splits an incrementally arriving byte stream into SSE lines. Complete
/// lines come out of `push`; `finish` recovers a final line the server
/// never terminated.
struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut lines = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            lines.push(self.buffer[..newline].trim().to_string());
            self.buffer.drain(..=newline);
        }
        lines
    }

    fn finish(self) -> Option<String> {
        let rest = self.buffer.trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaPayload;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_body_includes_system_schema_and_media() {
        let request = GenerateRequest::from_prompt("describe this")
            .with_system("be helpful")
            .with_schema(json!({ "type": "STRING" }))
            .with_media(MediaPayload::new("image/png", vec![1, 2, 3]));

        let body = GeminiBackend::request_body(&request);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "describe this");
        assert_eq!(
            body["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "be helpful"
        );
        assert_eq!(
            body["generationConfig"]["response_mime_type"],
            "application/json"
        );
    }

    #[test]
    fn request_body_carries_conversation_roles() {
        let request = GenerateRequest {
            turns: vec![
                super::super::Turn::user("hi"),
                super::super::Turn::model("hello"),
                super::super::Turn::user("explain osmosis"),
            ],
            ..Default::default()
        };
        let body = GeminiBackend::request_body(&request);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "explain osmosis");
    }

    #[test]
    fn extract_text_joins_candidate_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello " }, { "text": "world" }] }
            }]
        });
        let text = GeminiBackend::extract_text("m", &payload).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn extract_text_rejects_empty_candidates() {
        let payload = json!({ "candidates": [] });
        assert!(GeminiBackend::extract_text("m", &payload).is_err());
    }

    fn sse_event(text: &str) -> String {
        format!(
            "data: {}",
            json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
        )
    }

    #[test]
    fn parse_sse_data_extracts_fragments_and_skips_noise() {
        let fragment = GeminiBackend::parse_sse_data("m", &sse_event("hi")).unwrap();
        assert_eq!(fragment.unwrap(), "hi");

        assert!(GeminiBackend::parse_sse_data("m", "").is_none());
        assert!(GeminiBackend::parse_sse_data("m", ": keep-alive").is_none());
        assert!(GeminiBackend::parse_sse_data("m", "data: [DONE]").is_none());
        assert!(
            GeminiBackend::parse_sse_data("m", "data: not json")
                .unwrap()
                .is_err()
        );
    }

    #[test]
    fn line_buffer_splits_across_chunk_boundaries() {
        let mut lines = LineBuffer::new();
        assert_eq!(lines.push(b"data: one\ndata: tw"), vec!["data: one"]);
        assert_eq!(lines.push(b"o\n"), vec!["data: two"]);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn line_buffer_recovers_a_final_unterminated_line() {
        let mut lines = LineBuffer::new();
        let event = sse_event("tail");
        // Body ends mid-event, with no trailing newline
        assert!(lines.push(event.as_bytes()).is_empty());
        let residual = lines.finish().unwrap();
        let fragment = GeminiBackend::parse_sse_data("m", &residual).unwrap();
        assert_eq!(fragment.unwrap(), "tail");
    }
}
