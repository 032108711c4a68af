//! The boundary to the external generative-AI service.

use std::fmt::Debug;
use std::pin::Pin;
use std::str::FromStr;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::media::MediaPayload;

mod gemini;
mod mock;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockOperation};

/// A lazy, finite sequence of text fragments from a streamed generation.
pub type TextFragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Conversation role for a request turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One turn of conversation content.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A text-generation request: conversation turns plus optional system
/// instruction, inline media, and response-shape constraint.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub system: Option<String>,
    pub turns: Vec<Turn>,
    pub media: Option<MediaPayload>,
    pub response_schema: Option<serde_json::Value>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(prompt)],
            ..Default::default()
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_media(mut self, media: MediaPayload) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Output framing for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Classic,
    #[serde(rename = "3:4")]
    ClassicPortrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Classic => "4:3",
            Self::ClassicPortrait => "3:4",
        }
    }

    /// Video generation only supports the widescreen pair.
    pub fn supports_video(&self) -> bool {
        matches!(self, Self::Landscape | Self::Portrait)
    }
}

impl FromStr for AspectRatio {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1:1" => Ok(Self::Square),
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            "4:3" => Ok(Self::Classic),
            "3:4" => Ok(Self::ClassicPortrait),
            other => Err(CoreError::empty_input(format!(
                "aspect ratio '{}' (expected 1:1, 16:9, 9:16, 4:3, or 3:4)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to animate a still image into a short video.
#[derive(Debug, Clone)]
pub struct AnimationRequest {
    pub prompt: String,
    pub image: MediaPayload,
    pub aspect_ratio: AspectRatio,
}

/// Server-side handle for a long-running video generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub name: String,
}

/// Poll result for a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    /// Finished with a downloadable video URI.
    Complete { video_uri: String },
    /// Finished without a result.
    Failed { detail: String },
}

/// The external generative-AI API surface this application depends on.
///
/// One implementation talks to the real service; tests substitute a mock.
#[async_trait]
pub trait GenerativeBackend: Send + Sync + Debug {
    /// Name of this backend, for logging.
    fn name(&self) -> &str;

    /// Single-shot text generation.
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Streamed text generation, yielding fragments in arrival order.
    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextFragmentStream>;

    /// Generate one image, returned as encoded image bytes.
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<Vec<u8>>;

    /// Kick off a long-running image-to-video generation.
    async fn start_animation(&self, request: AnimationRequest) -> Result<OperationHandle>;

    /// Poll a long-running animation operation.
    async fn poll_animation(&self, handle: &OperationHandle) -> Result<OperationStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn aspect_ratio_round_trips() {
        for tag in ["1:1", "16:9", "9:16", "4:3", "3:4"] {
            let ratio: AspectRatio = tag.parse().unwrap();
            assert_eq!(ratio.as_str(), tag);
        }
        assert!("2:1".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn only_widescreen_ratios_support_video() {
        assert!(AspectRatio::Landscape.supports_video());
        assert!(AspectRatio::Portrait.supports_video());
        assert!(!AspectRatio::Square.supports_video());
        assert!(!AspectRatio::Classic.supports_video());
    }
}
