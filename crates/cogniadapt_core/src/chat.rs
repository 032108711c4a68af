//! Stateful chat with the assistant persona.
//!
//! The session is created lazily on first send and stays ready for its
//! lifetime. Each send streams fragments into the in-progress bot message;
//! a mid-stream failure overwrites that message with a fixed apology and
//! terminates the stream.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_stream::wrappers::ReceiverStream;

use crate::client::{GenerateRequest, GenerativeBackend, Turn};
use crate::content::{ChatMessage, Sender};
use crate::error::Result;
use crate::prompt::CHAT_SYSTEM_INSTRUCTION;
use crate::state::AppState;

/// Shown in place of a bot message that failed mid-stream.
pub const CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Stored in application error state when a send fails.
pub const CHAT_ERROR_MESSAGE: &str =
    "Failed to get a response from the chatbot. Please try again.";

/// Events produced while a bot reply streams in.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Append this fragment to the in-progress message.
    Fragment { text: String },
    /// The in-progress message was replaced with the apology; the stream
    /// ends after this event.
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    Uninitialized,
    Ready,
}

#[derive(Debug)]
struct SessionInner {
    phase: SessionPhase,
    history: Vec<ChatMessage>,
}

/// A chat session backed by the generative service.
#[derive(Debug, Clone)]
pub struct ChatSession {
    backend: Arc<dyn GenerativeBackend>,
    state: Arc<AppState>,
    inner: Arc<Mutex<SessionInner>>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn GenerativeBackend>, state: Arc<AppState>) -> Self {
        Self {
            backend,
            state,
            inner: Arc::new(Mutex::new(SessionInner {
                phase: SessionPhase::Uninitialized,
                history: Vec::new(),
            })),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock().phase == SessionPhase::Ready
    }

    /// Snapshot of the conversation so far.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.inner.lock().history.clone()
    }

    /// Seed a message without calling the backend (e.g. the greeting).
    pub fn push_bot_message(&self, text: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.history.push(ChatMessage {
            sender: Sender::Bot,
            text: text.into(),
            is_streaming: false,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Send a user message and stream the reply.
    ///
    /// The returned stream yields [`ChatEvent`]s in arrival order. The
    /// session history is updated as fragments arrive; end-of-stream
    /// finalizes the bot message.
    pub async fn send_message_stream(&self, message: &str) -> Result<ReceiverStream<ChatEvent>> {
        let request = {
            let mut inner = self.inner.lock();
            if inner.phase == SessionPhase::Uninitialized {
                tracing::debug!("initializing chat session");
                inner.phase = SessionPhase::Ready;
            }

            inner.history.push(ChatMessage::user(message));

            // Seeded bot messages (the greeting) are display-only; the
            // model conversation starts at the first user turn
            let first_user = inner
                .history
                .iter()
                .position(|msg| msg.sender == Sender::User)
                .unwrap_or(0);
            let turns: Vec<Turn> = inner.history[first_user..]
                .iter()
                .map(|msg| match msg.sender {
                    Sender::User => Turn::user(msg.text.clone()),
                    Sender::Bot => Turn::model(msg.text.clone()),
                })
                .collect();

            inner.history.push(ChatMessage::bot_streaming());

            GenerateRequest {
                system: Some(CHAT_SYSTEM_INSTRUCTION.to_string()),
                turns,
                media: None,
                response_schema: None,
            }
        };

        self.state.error.set(None);

        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let backend = self.backend.clone();
        let state = self.state.clone();
        let inner = self.inner.clone();

        tokio::spawn(async move {
            use tokio_stream::StreamExt;

            let fail = |inner: &Arc<Mutex<SessionInner>>, state: &Arc<AppState>| {
                let mut inner = inner.lock();
                if let Some(last) = inner.history.last_mut() {
                    last.text = CHAT_APOLOGY.to_string();
                    last.is_streaming = false;
                }
                state.error.set(Some(CHAT_ERROR_MESSAGE.to_string()));
            };

            let mut stream = match backend.generate_stream(request).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "chat send failed to start");
                    fail(&inner, &state);
                    let _ = tx
                        .send(ChatEvent::Failed {
                            message: CHAT_APOLOGY.to_string(),
                        })
                        .await;
                    return;
                }
            };

            while let Some(fragment) = stream.next().await {
                match fragment {
                    Ok(text) => {
                        {
                            let mut inner = inner.lock();
                            if let Some(last) = inner.history.last_mut() {
                                last.text.push_str(&text);
                            }
                        }
                        if tx.send(ChatEvent::Fragment { text }).await.is_err() {
                            // Consumer stopped reading; finalize what we have
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "chat stream failed mid-flight");
                        fail(&inner, &state);
                        let _ = tx
                            .send(ChatEvent::Failed {
                                message: CHAT_APOLOGY.to_string(),
                            })
                            .await;
                        return;
                    }
                }
            }

            // End of stream: finalize the in-progress message
            let mut inner = inner.lock();
            if let Some(last) = inner.history.last_mut() {
                last.is_streaming = false;
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockBackend;
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;

    fn session_with(backend: MockBackend) -> (ChatSession, Arc<AppState>) {
        let state = Arc::new(AppState::new());
        let session = ChatSession::new(Arc::new(backend), state.clone());
        (session, state)
    }

    #[tokio::test]
    async fn fragments_concatenate_into_the_final_message() {
        let backend = MockBackend::new();
        backend.push_stream(&["Pho", "tosyn", "thesis."]);
        let (session, state) = session_with(backend);

        let mut stream = session.send_message_stream("explain").await.unwrap();
        let mut collected = String::new();
        while let Some(event) = stream.next().await {
            match event {
                ChatEvent::Fragment { text } => collected.push_str(&text),
                ChatEvent::Failed { .. } => panic!("unexpected failure"),
            }
        }

        let history = session.history();
        let last = history.last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, "Photosynthesis.");
        assert_eq!(last.text, collected);
        assert!(!last.is_streaming);
        assert_eq!(state.error.get(), None);
    }

    #[tokio::test]
    async fn mid_stream_failure_overwrites_with_apology() {
        let backend = MockBackend::new();
        backend.push_failing_stream(&["partial "]);
        let (session, state) = session_with(backend);

        let mut stream = session.send_message_stream("explain").await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }

        // Terminates with exactly one failure event
        assert_eq!(
            events.last(),
            Some(&ChatEvent::Failed {
                message: CHAT_APOLOGY.to_string()
            })
        );
        let last = session.history().last().cloned().unwrap();
        assert_eq!(last.text, CHAT_APOLOGY);
        assert!(!last.is_streaming);
        assert_eq!(state.error.get(), Some(CHAT_ERROR_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn session_becomes_ready_on_first_send_only() {
        let backend = MockBackend::new();
        backend.push_stream(&["hi"]);
        let (session, _state) = session_with(backend);

        assert!(!session.is_ready());
        let mut stream = session.send_message_stream("hello").await.unwrap();
        while stream.next().await.is_some() {}
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn seeded_greeting_is_display_only() {
        let backend = Arc::new(MockBackend::new());
        backend.push_stream(&["answer"]);
        let state = Arc::new(AppState::new());
        let session = ChatSession::new(backend.clone(), state);
        session.push_bot_message("Hello! How can I help?");

        let mut stream = session.send_message_stream("question").await.unwrap();
        while stream.next().await.is_some() {}

        // The greeting stays in history but never reaches the backend,
        // and the conversation sent starts with a user turn
        let requests = backend.generate_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].turns[0].role, crate::client::Role::User);
        assert!(
            requests[0]
                .turns
                .iter()
                .all(|turn| turn.text != "Hello! How can I help?")
        );
        assert_eq!(session.history()[0].text, "Hello! How can I help?");
    }

    #[tokio::test]
    async fn history_records_user_then_bot() {
        let backend = MockBackend::new();
        backend.push_stream(&["answer"]);
        let (session, _state) = session_with(backend);
        session.push_bot_message("Hello! How can I help?");

        let mut stream = session.send_message_stream("question").await.unwrap();
        while stream.next().await.is_some() {}

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].sender, Sender::Bot);
        assert_eq!(history[1].sender, Sender::User);
        assert_eq!(history[1].text, "question");
        assert_eq!(history[2].text, "answer");
    }
}
