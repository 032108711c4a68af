//! CogniAdapt Core - Cognitive-Accessibility Content Adaptation
//!
//! This crate adapts educational text to six cognitive-accessibility
//! profiles by driving a generative backend: structured text transforms,
//! media analysis, image generation, image-to-video animation, and a
//! streaming support chat.

pub mod adapter;
pub mod animation;
pub mod chat;
pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod media;
pub mod profile;
pub mod prompt;
pub mod schema;
pub mod state;
pub mod storage;

pub use adapter::AdapterClient;
pub use animation::{AnimationEvent, Animator};
pub use chat::{ChatEvent, ChatSession};
pub use client::{
    AnimationRequest, AspectRatio, GenerateRequest, GenerativeBackend, GeminiBackend,
    MockBackend, OperationHandle, OperationStatus, Role, TextFragmentStream, Turn,
};
pub use config::{CogniConfig, load_config, save_config};
pub use content::{ChatMessage, Concept, QuizQuestion, Sender, TransformedContent};
pub use error::{CoreError, Result};
pub use media::{MediaKind, MediaPayload};
pub use profile::{CognitiveProfile, ProfileInfo};
pub use state::{AppState, Route, Signal};
pub use storage::{FileProfileStore, MemoryProfileStore, ProfileStore};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        AdapterClient, AnimationEvent, AppState, AspectRatio, ChatEvent, ChatMessage,
        ChatSession, CogniConfig, CognitiveProfile, Concept, CoreError, GeminiBackend,
        GenerateRequest, GenerativeBackend, MediaPayload, QuizQuestion, Result, Route, Sender,
        TransformedContent,
    };
}
