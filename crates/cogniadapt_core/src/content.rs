//! Parsed transformation results and chat history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::profile::CognitiveProfile;

/// One element of the `concepts` array.
///
/// Plain strings for every profile except Visual, which gets the structured
/// record. The variants are untagged because the wire payload is either a
/// bare string or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Concept {
    Plain(String),
    Visual {
        title: String,
        description: String,
        #[serde(rename = "visualIdea")]
        visual_idea: String,
    },
}

impl Concept {
    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Visual { .. })
    }
}

/// A multiple-choice question generated from the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    /// Exactly four options, and the correct answer must be one of them.
    pub fn validate(&self) -> Result<()> {
        if self.options.len() != 4 {
            return Err(CoreError::content_invalid(format!(
                "question '{}' has {} options, expected exactly 4",
                self.question,
                self.options.len()
            )));
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(CoreError::content_invalid(format!(
                "correct answer '{}' is not among the options for '{}'",
                self.correct_answer, self.question
            )));
        }
        Ok(())
    }
}

/// The structured result of adapting input text to a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedContent {
    pub summary: String,
    pub concepts: Vec<Concept>,
    pub questions: Vec<QuizQuestion>,
    pub profile: CognitiveProfile,
}

/// The payload as it comes back from the model, before the profile tag is
/// attached.
#[derive(Debug, Clone, Deserialize)]
struct RawTransformPayload {
    summary: String,
    concepts: Vec<Concept>,
    questions: Vec<QuizQuestion>,
}

impl TransformedContent {
    /// Parse a model payload, attach the profile, and validate the result.
    pub fn from_json(payload: &str, profile: CognitiveProfile) -> Result<Self> {
        let raw: RawTransformPayload = serde_json::from_str(payload.trim()).map_err(|e| {
            CoreError::malformed_response("transform", format!("invalid JSON payload: {}", e))
        })?;

        let content = Self {
            summary: raw.summary,
            concepts: raw.concepts,
            questions: raw.questions,
            profile,
        };
        content.validate()?;
        Ok(content)
    }

    /// Enforce the concepts-variant invariant and quiz validity.
    pub fn validate(&self) -> Result<()> {
        let expect_visual = self.profile.uses_visual_concepts();
        for concept in &self.concepts {
            if concept.is_visual() != expect_visual {
                return Err(CoreError::content_invalid(format!(
                    "profile {} expects {} concepts, found a mixed or wrong variant",
                    self.profile,
                    if expect_visual { "structured" } else { "plain" }
                )));
            }
        }
        for question in &self.questions {
            question.validate()?;
        }
        Ok(())
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One entry in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    /// Possibly empty while a bot message is still receiving fragments.
    pub text: String,
    /// True only while a bot message is mid-stream.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_streaming: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            is_streaming: false,
            timestamp: Utc::now(),
        }
    }

    pub fn bot_streaming() -> Self {
        Self {
            sender: Sender::Bot,
            text: String::new(),
            is_streaming: true,
            timestamp: Utc::now(),
        }
    }
}
