//! Long-running image-to-video animation.
//!
//! Produces a lazy sequence of status updates: preparing, starting, then a
//! repeated processing status on a fixed delay while the remote operation
//! is incomplete, terminating with exactly one success-with-URL or error
//! event. Dropping the receiver cancels the polling loop.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_stream::wrappers::ReceiverStream;

use crate::client::{AnimationRequest, AspectRatio, GenerativeBackend, OperationStatus};
use crate::error::CoreError;
use crate::media::MediaPayload;
use crate::state::AppState;

pub const STATUS_PREPARING: &str = "Preparing image for animation...";
pub const STATUS_STARTING: &str = "Starting video generation... This may take several minutes.";
pub const STATUS_PROCESSING: &str = "Processing video... Please wait.";
pub const STATUS_COMPLETE: &str = "Complete";
pub const STATUS_ERROR: &str = "Error";

/// Stored in application error state when animation fails.
pub const ANIMATION_ERROR_MESSAGE: &str = "Failed to animate image.";

/// One status update from the animation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationEvent {
    pub status: String,
    /// Present only on the successful terminal event.
    pub video_url: Option<String>,
}

impl AnimationEvent {
    fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            video_url: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status == STATUS_COMPLETE || self.status == STATUS_ERROR
    }
}

/// Drives a single image animation, streaming status updates.
pub struct Animator {
    backend: Arc<dyn GenerativeBackend>,
    state: Arc<AppState>,
    api_key: String,
    poll_interval: Duration,
}

impl Animator {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        state: Arc<AppState>,
        api_key: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            state,
            api_key: api_key.into(),
            poll_interval,
        }
    }

    /// Animate a still image into a short video.
    ///
    /// The returned stream yields the full status sequence. Every exit path
    /// clears the loading flag; dropping the stream stops further polling.
    pub async fn animate(
        &self,
        prompt: String,
        image_path: &Path,
        aspect_ratio: AspectRatio,
    ) -> ReceiverStream<AnimationEvent> {
        let (tx, rx) = tokio::sync::mpsc::channel(16);

        self.state.is_loading.set(true);
        self.state.error.set(None);

        let backend = self.backend.clone();
        let state = self.state.clone();
        let api_key = self.api_key.clone();
        let poll_interval = self.poll_interval;
        let image_path = image_path.to_path_buf();

        tokio::spawn(async move {
            let result = run_animation(
                &backend,
                &tx,
                prompt,
                &image_path,
                aspect_ratio,
                &api_key,
                poll_interval,
            )
            .await;

            if let Err(e) = result {
                tracing::warn!(error = %e, "image animation failed");
                state.error.set(Some(ANIMATION_ERROR_MESSAGE.to_string()));
                let _ = tx.send(AnimationEvent::status(STATUS_ERROR)).await;
            }
            state.is_loading.set(false);
        });

        ReceiverStream::new(rx)
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_animation(
    backend: &Arc<dyn GenerativeBackend>,
    tx: &tokio::sync::mpsc::Sender<AnimationEvent>,
    prompt: String,
    image_path: &Path,
    aspect_ratio: AspectRatio,
    api_key: &str,
    poll_interval: Duration,
) -> crate::error::Result<()> {
    if !aspect_ratio.supports_video() {
        return Err(CoreError::AnimationFailed {
            detail: format!("aspect ratio {} is not supported for video", aspect_ratio),
        });
    }

    if tx
        .send(AnimationEvent::status(STATUS_PREPARING))
        .await
        .is_err()
    {
        return Ok(()); // consumer gone, stop before any network call
    }
    let image = MediaPayload::from_path(image_path).await?;

    if tx
        .send(AnimationEvent::status(STATUS_STARTING))
        .await
        .is_err()
    {
        return Ok(());
    }
    let handle = backend
        .start_animation(AnimationRequest {
            prompt,
            image,
            aspect_ratio,
        })
        .await?;

    loop {
        match backend.poll_animation(&handle).await? {
            OperationStatus::Pending => {
                if tx
                    .send(AnimationEvent::status(STATUS_PROCESSING))
                    .await
                    .is_err()
                {
                    // Receiver dropped: cancel polling entirely
                    tracing::debug!(operation = %handle.name, "animation consumer gone, stopping polls");
                    return Ok(());
                }
                tokio::time::sleep(poll_interval).await;
            }
            OperationStatus::Complete { video_uri } => {
                let video_url = format!("{}&key={}", video_uri, api_key);
                let _ = tx
                    .send(AnimationEvent {
                        status: STATUS_COMPLETE.to_string(),
                        video_url: Some(video_url),
                    })
                    .await;
                return Ok(());
            }
            OperationStatus::Failed { detail } => {
                return Err(CoreError::AnimationFailed { detail });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockBackend, MockOperation};
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;

    fn write_test_image(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("frame.png");
        std::fs::write(&path, [0x89u8, 0x50, 0x4e, 0x47]).unwrap();
        path
    }

    fn animator(backend: Arc<MockBackend>) -> (Animator, Arc<AppState>) {
        let state = Arc::new(AppState::new());
        let animator = Animator::new(
            backend,
            state.clone(),
            "test-key",
            Duration::from_millis(1),
        );
        (animator, state)
    }

    #[tokio::test]
    async fn successful_run_produces_the_full_sequence() {
        let backend = Arc::new(MockBackend::new());
        backend.set_poll_sequence(vec![
            OperationStatus::Pending,
            OperationStatus::Pending,
            OperationStatus::Complete {
                video_uri: "https://example.com/v.mp4?alt=media".to_string(),
            },
        ]);
        let dir = tempfile::tempdir().unwrap();
        let image = write_test_image(&dir);
        let (animator, state) = animator(backend);

        let stream = animator
            .animate("wave gently".to_string(), &image, AspectRatio::Landscape)
            .await;
        let events: Vec<AnimationEvent> = stream.collect().await;

        assert_eq!(events[0].status, STATUS_PREPARING);
        assert_eq!(events[1].status, STATUS_STARTING);
        assert_eq!(events[2].status, STATUS_PROCESSING);
        assert_eq!(events[3].status, STATUS_PROCESSING);

        let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminal.len(), 1);
        assert_eq!(terminal[0].status, STATUS_COMPLETE);
        assert_eq!(
            terminal[0].video_url.as_deref(),
            Some("https://example.com/v.mp4?alt=media&key=test-key")
        );
        assert_eq!(state.error.get(), None);
        assert!(!state.is_loading.get());
    }

    #[tokio::test]
    async fn remote_failure_yields_single_error_terminal() {
        let backend = Arc::new(MockBackend::new());
        backend.set_poll_sequence(vec![
            OperationStatus::Pending,
            OperationStatus::Failed {
                detail: "quota exceeded".to_string(),
            },
        ]);
        let dir = tempfile::tempdir().unwrap();
        let image = write_test_image(&dir);
        let (animator, state) = animator(backend);

        let stream = animator
            .animate("spin".to_string(), &image, AspectRatio::Portrait)
            .await;
        let events: Vec<AnimationEvent> = stream.collect().await;

        let last = events.last().unwrap();
        assert_eq!(last.status, STATUS_ERROR);
        assert_eq!(last.video_url, None);
        assert_eq!(
            events.iter().filter(|e| e.is_terminal()).count(),
            1
        );
        assert_eq!(
            state.error.get(),
            Some(ANIMATION_ERROR_MESSAGE.to_string())
        );
        assert!(!state.is_loading.get());
    }

    #[tokio::test]
    async fn start_failure_skips_polling() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_next(MockOperation::StartAnimation);
        let dir = tempfile::tempdir().unwrap();
        let image = write_test_image(&dir);
        let (animator, _state) = animator(backend.clone());

        let stream = animator
            .animate("zoom".to_string(), &image, AspectRatio::Landscape)
            .await;
        let events: Vec<AnimationEvent> = stream.collect().await;

        assert_eq!(events.last().unwrap().status, STATUS_ERROR);
        assert_eq!(backend.poll_count(), 0);
    }

    #[tokio::test]
    async fn square_ratio_is_rejected_for_video() {
        let backend = Arc::new(MockBackend::new());
        let dir = tempfile::tempdir().unwrap();
        let image = write_test_image(&dir);
        let (animator, _state) = animator(backend);

        let stream = animator
            .animate("pan".to_string(), &image, AspectRatio::Square)
            .await;
        let events: Vec<AnimationEvent> = stream.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, STATUS_ERROR);
    }

    #[tokio::test]
    async fn dropping_the_stream_cancels_polling() {
        let backend = Arc::new(MockBackend::new());
        // Endless pending: the only way the worker stops is cancellation
        backend.set_poll_sequence(vec![OperationStatus::Pending; 64]);
        let dir = tempfile::tempdir().unwrap();
        let image = write_test_image(&dir);
        let (animator, _state) = animator(backend.clone());

        let mut stream = animator
            .animate("loop".to_string(), &image, AspectRatio::Landscape)
            .await;
        // Read up to the first processing status, then abandon the stream
        while let Some(event) = stream.next().await {
            if event.status == STATUS_PROCESSING {
                break;
            }
        }
        drop(stream);

        // Give the worker a chance to notice the closed channel
        tokio::time::sleep(Duration::from_millis(20)).await;
        let polls_after_drop = backend.poll_count();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.poll_count(), polls_after_drop);
    }
}
