//! The adapter client: every call to the generative service goes through
//! here, with results and failures landing in application state.
//!
//! Operations resolve even on backend failure, carrying the failure as
//! data (a stored error message plus a fallback return value). Local
//! precondition violations are rejected before any network call. One
//! logical operation is in flight at a time, enforced by an atomic guard
//! rather than by disabled controls.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::Mutex;
use tokio_stream::wrappers::ReceiverStream;

use crate::animation::{AnimationEvent, Animator};
use crate::chat::{ChatEvent, ChatSession};
use crate::client::{AspectRatio, GenerateRequest, GenerativeBackend};
use crate::config::CogniConfig;
use crate::content::TransformedContent;
use crate::error::{CoreError, Result};
use crate::media::MediaPayload;
use crate::profile::CognitiveProfile;
use crate::prompt;
use crate::schema;
use crate::state::{AppState, Route};
use crate::storage::ProfileStore;

pub const MISSING_INPUT_ERROR: &str = "Profile or text is missing.";
pub const TRANSFORM_ERROR_MESSAGE: &str =
    "Failed to transform content. Please check your API key and try again.";
pub const IMAGE_ANALYSIS_ERROR: &str = "Failed to analyze image.";
pub const AUDIO_TRANSCRIPTION_ERROR: &str = "Failed to transcribe audio.";
pub const AUDIO_TRANSCRIPTION_FALLBACK: &str = "Transcription failed.";
pub const VIDEO_ANALYSIS_ERROR: &str = "Failed to analyze video.";
pub const VIDEO_ANALYSIS_FALLBACK: &str = "Video analysis failed.";
pub const IMAGE_GENERATION_ERROR: &str = "Failed to generate image.";

const AUDIO_TRANSCRIPTION_PROMPT: &str = "Transcribe the following audio.";

/// Releases the in-flight flag (and optionally the loading flag) when the
/// operation finishes, on every exit path.
struct OpGuard {
    flag: Arc<AtomicBool>,
    loading: Option<Arc<AppState>>,
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        if let Some(state) = &self.loading {
            state.is_loading.set(false);
        }
    }
}

/// Boundary component issuing all calls to the generative service.
pub struct AdapterClient {
    backend: Arc<dyn GenerativeBackend>,
    state: Arc<AppState>,
    store: Arc<dyn ProfileStore>,
    config: CogniConfig,
    in_flight: Arc<AtomicBool>,
    chat: Mutex<Option<ChatSession>>,
}

impl AdapterClient {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        state: Arc<AppState>,
        store: Arc<dyn ProfileStore>,
        config: CogniConfig,
    ) -> Self {
        Self {
            backend,
            state,
            store,
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
            chat: Mutex::new(None),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Read the persisted profile into state, done once at startup.
    pub async fn init(&self) -> Result<()> {
        if let Some(profile) = self.store.load().await? {
            self.state.selected_profile.set(Some(profile));
        }
        Ok(())
    }

    /// Select a profile, persist it, and navigate to the input screen.
    pub async fn select_profile(&self, profile: CognitiveProfile) -> Result<()> {
        self.state.selected_profile.set(Some(profile));
        self.store.store(profile).await?;
        self.state.route.set(Route::Input);
        Ok(())
    }

    fn begin(&self, operation: &str, manage_loading: bool) -> Result<OpGuard> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::in_flight(operation));
        }
        if manage_loading {
            self.state.is_loading.set(true);
        }
        Ok(OpGuard {
            flag: self.in_flight.clone(),
            loading: manage_loading.then(|| self.state.clone()),
        })
    }

    /// Transform study text for the selected profile.
    ///
    /// While pending the loading flag is set and prior error and result
    /// are cleared. On success the parsed content (with the profile tag
    /// attached) is stored and navigation moves to the output screen. On
    /// failure a user-facing message is stored instead. Single attempt.
    pub async fn transform_text(&self, text: &str) -> Result<()> {
        let Some(profile) = self.state.selected_profile.get() else {
            self.state.error.set(Some(MISSING_INPUT_ERROR.to_string()));
            return Err(CoreError::ProfileNotSelected);
        };
        if text.trim().is_empty() {
            self.state.error.set(Some(MISSING_INPUT_ERROR.to_string()));
            return Err(CoreError::empty_input("text"));
        }

        let _guard = self.begin("transform", true)?;
        self.state.input_text.set(text.to_string());
        self.state.error.set(None);
        self.state.transformed_content.set(None);

        let request = GenerateRequest::from_prompt(prompt::build_transform_prompt(profile, text)?)
            .with_schema(schema::response_schema(profile));

        match self.backend.generate(request).await.and_then(|payload| {
            TransformedContent::from_json(&payload, profile)
        }) {
            Ok(content) => {
                self.state.transformed_content.set(Some(content));
                self.state.route.set(Route::Output);
            }
            Err(e) => {
                tracing::error!(error = %e, "text transform failed");
                self.state
                    .error
                    .set(Some(TRANSFORM_ERROR_MESSAGE.to_string()));
            }
        }
        Ok(())
    }

    /// Describe or answer questions about an image.
    pub async fn analyze_image(&self, prompt_text: &str, image_path: &Path) -> Result<String> {
        self.analyze_media(
            prompt_text,
            image_path,
            "analyze image",
            IMAGE_ANALYSIS_ERROR,
            "",
        )
        .await
    }

    /// Transcribe recorded audio.
    pub async fn transcribe_audio(&self, audio_path: &Path) -> Result<String> {
        self.analyze_media(
            AUDIO_TRANSCRIPTION_PROMPT,
            audio_path,
            "transcribe audio",
            AUDIO_TRANSCRIPTION_ERROR,
            AUDIO_TRANSCRIPTION_FALLBACK,
        )
        .await
    }

    /// Summarize or answer questions about a video.
    pub async fn analyze_video(&self, prompt_text: &str, video_path: &Path) -> Result<String> {
        self.analyze_media(
            prompt_text,
            video_path,
            "analyze video",
            VIDEO_ANALYSIS_ERROR,
            VIDEO_ANALYSIS_FALLBACK,
        )
        .await
    }

    // Uniform contract across the three modalities: prompt plus inline
    // media in, single text result out; backend failure resolves with the
    // fallback string and a recorded error.
    async fn analyze_media(
        &self,
        prompt_text: &str,
        path: &Path,
        operation: &str,
        error_message: &str,
        fallback: &str,
    ) -> Result<String> {
        let media = MediaPayload::from_path(path).await?;

        let _guard = self.begin(operation, true)?;
        self.state.error.set(None);

        let request = GenerateRequest::from_prompt(prompt_text).with_media(media);
        match self.backend.generate(request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!(error = %e, operation, "media analysis failed");
                self.state.error.set(Some(error_message.to_string()));
                Ok(fallback.to_string())
            }
        }
    }

    /// Generate one image, returned as an inline-displayable data URI.
    /// Empty string on failure. Single attempt, no retry.
    pub async fn generate_image(
        &self,
        prompt_text: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<String> {
        if prompt_text.trim().is_empty() {
            return Err(CoreError::empty_input("prompt"));
        }

        let _guard = self.begin("generate image", true)?;
        self.state.error.set(None);

        match self.backend.generate_image(prompt_text, aspect_ratio).await {
            Ok(bytes) => Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(bytes))),
            Err(e) => {
                tracing::error!(error = %e, "image generation failed");
                self.state
                    .error
                    .set(Some(IMAGE_GENERATION_ERROR.to_string()));
                Ok(String::new())
            }
        }
    }

    /// Animate a still image into a short video, streaming status updates.
    /// The in-flight guard is held until the stream finishes or its
    /// consumer drops it.
    pub async fn animate_image(
        &self,
        prompt_text: String,
        image_path: &Path,
        aspect_ratio: AspectRatio,
    ) -> Result<ReceiverStream<AnimationEvent>> {
        let guard = self.begin("animate image", false)?;

        let animator = Animator::new(
            self.backend.clone(),
            self.state.clone(),
            self.config.api_key.clone().unwrap_or_default(),
            Duration::from_secs(self.config.poll_interval_secs),
        );
        let inner = animator
            .animate(prompt_text, image_path, aspect_ratio)
            .await;

        Ok(forward_with_guard(inner, guard))
    }

    /// Send a chat message, streaming reply fragments. Lazily creates the
    /// session on first use; the guard rejects overlapping sends.
    pub async fn send_chat_message(&self, message: &str) -> Result<ReceiverStream<ChatEvent>> {
        let guard = self.begin("chat", false)?;
        let session = self.chat_session();
        let inner = session.send_message_stream(message).await?;
        Ok(forward_with_guard(inner, guard))
    }

    /// The lazily created chat session (for history access and seeding).
    pub fn chat_session(&self) -> ChatSession {
        let mut chat = self.chat.lock();
        chat.get_or_insert_with(|| {
            ChatSession::new(self.backend.clone(), self.state.clone())
        })
        .clone()
    }
}

/// Forward a stream through a fresh channel, holding the guard until the
/// source ends or the consumer drops the output.
fn forward_with_guard<T: Send + 'static>(
    mut inner: ReceiverStream<T>,
    guard: OpGuard,
) -> ReceiverStream<T> {
    use tokio_stream::StreamExt;

    let (tx, rx) = tokio::sync::mpsc::channel(16);
    tokio::spawn(async move {
        let _guard = guard;
        while let Some(event) = inner.next().await {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
    ReceiverStream::new(rx)
}
