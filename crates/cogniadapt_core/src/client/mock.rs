//! Scriptable backend substitute for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{
    AnimationRequest, AspectRatio, GenerateRequest, GenerativeBackend, OperationHandle,
    OperationStatus, TextFragmentStream,
};
use crate::error::{CoreError, Result};

/// Which backend operation a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOperation {
    Generate,
    GenerateImage,
    StartAnimation,
}

#[derive(Debug, Default)]
struct MockState {
    generate_responses: VecDeque<String>,
    stream_scripts: VecDeque<Vec<Result<String>>>,
    image_responses: VecDeque<Vec<u8>>,
    poll_sequence: VecDeque<OperationStatus>,
    fail_next: Vec<MockOperation>,
    generate_requests: Vec<GenerateRequest>,
    poll_count: usize,
}

/// A backend whose responses are scripted up front.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, text: impl Into<String>) {
        self.state.lock().generate_responses.push_back(text.into());
    }

    /// Script a stream that yields these fragments then ends cleanly.
    pub fn push_stream(&self, fragments: &[&str]) {
        self.state
            .lock()
            .stream_scripts
            .push_back(fragments.iter().map(|f| Ok(f.to_string())).collect());
    }

    /// Script a stream that yields these fragments then fails mid-stream.
    pub fn push_failing_stream(&self, fragments: &[&str]) {
        let mut script: Vec<Result<String>> =
            fragments.iter().map(|f| Ok(f.to_string())).collect();
        script.push(Err(CoreError::malformed_response(
            "mock",
            "scripted mid-stream failure",
        )));
        self.state.lock().stream_scripts.push_back(script);
    }

    pub fn push_image(&self, bytes: Vec<u8>) {
        self.state.lock().image_responses.push_back(bytes);
    }

    /// Script the poll results, in order. The final entry should be a
    /// terminal status.
    pub fn set_poll_sequence(&self, sequence: Vec<OperationStatus>) {
        self.state.lock().poll_sequence = sequence.into();
    }

    pub fn fail_next(&self, operation: MockOperation) {
        self.state.lock().fail_next.push(operation);
    }

    /// Requests seen by `generate` and `generate_stream`, for assertions
    /// on prompt, turns, and schema.
    pub fn generate_requests(&self) -> Vec<GenerateRequest> {
        self.state.lock().generate_requests.clone()
    }

    pub fn poll_count(&self) -> usize {
        self.state.lock().poll_count
    }

    fn take_failure(&self, operation: MockOperation) -> bool {
        let mut state = self.state.lock();
        if let Some(pos) = state.fail_next.iter().position(|op| *op == operation) {
            state.fail_next.remove(pos);
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        self.state.lock().generate_requests.push(request);
        if self.take_failure(MockOperation::Generate) {
            return Err(CoreError::malformed_response("mock", "scripted failure"));
        }
        self.state
            .lock()
            .generate_responses
            .pop_front()
            .ok_or_else(|| CoreError::malformed_response("mock", "no scripted response"))
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextFragmentStream> {
        let mut state = self.state.lock();
        state.generate_requests.push(request);
        let script = state
            .stream_scripts
            .pop_front()
            .ok_or_else(|| CoreError::malformed_response("mock", "no scripted stream"))?;
        Ok(Box::pin(futures::stream::iter(script)))
    }

    async fn generate_image(&self, _prompt: &str, _aspect_ratio: AspectRatio) -> Result<Vec<u8>> {
        if self.take_failure(MockOperation::GenerateImage) {
            return Err(CoreError::malformed_response("mock", "scripted failure"));
        }
        self.state
            .lock()
            .image_responses
            .pop_front()
            .ok_or_else(|| CoreError::malformed_response("mock", "no scripted image"))
    }

    async fn start_animation(&self, _request: AnimationRequest) -> Result<OperationHandle> {
        if self.take_failure(MockOperation::StartAnimation) {
            return Err(CoreError::malformed_response("mock", "scripted failure"));
        }
        Ok(OperationHandle {
            name: "operations/mock-animation".to_string(),
        })
    }

    async fn poll_animation(&self, _handle: &OperationHandle) -> Result<OperationStatus> {
        let mut state = self.state.lock();
        state.poll_count += 1;
        Ok(state
            .poll_sequence
            .pop_front()
            .unwrap_or(OperationStatus::Complete {
                video_uri: "https://example.com/video.mp4".to_string(),
            }))
    }
}
