//! The six cognitive-accessibility profiles and their catalog metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A content-adaptation mode for a neurodiverse learner.
///
/// Serialized as the literal tag the rest of the system (prompts, storage,
/// transformed content) uses, e.g. `"ADHD"` or `"Dyslexia"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CognitiveProfile {
    #[serde(rename = "ADHD")]
    Adhd,
    Dyslexia,
    Visual,
    Auditory,
    Kinesthetic,
    Autism,
}

impl CognitiveProfile {
    pub const ALL: [CognitiveProfile; 6] = [
        Self::Adhd,
        Self::Dyslexia,
        Self::Visual,
        Self::Auditory,
        Self::Kinesthetic,
        Self::Autism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adhd => "ADHD",
            Self::Dyslexia => "Dyslexia",
            Self::Visual => "Visual",
            Self::Auditory => "Auditory",
            Self::Kinesthetic => "Kinesthetic",
            Self::Autism => "Autism",
        }
    }

    /// Catalog entry shown on the selection screen.
    pub fn info(&self) -> ProfileInfo {
        match self {
            Self::Adhd => ProfileInfo {
                profile: *self,
                name: "ADHD Focus",
                icon: "🎯",
                description: "Bite-sized summaries, key points, and focus tools.",
            },
            Self::Dyslexia => ProfileInfo {
                profile: *self,
                name: "Dyslexia Friendly",
                icon: "📖",
                description: "Clear fonts, simpler text, and audio options.",
            },
            Self::Visual => ProfileInfo {
                profile: *self,
                name: "Visual Learner",
                icon: "🎨",
                description: "Visual breakdowns, mind maps, and concept cards.",
            },
            Self::Auditory => ProfileInfo {
                profile: *self,
                name: "Auditory Learner",
                icon: "🎧",
                description: "Podcast-style summaries, mnemonics, and verbal cues.",
            },
            Self::Kinesthetic => ProfileInfo {
                profile: *self,
                name: "Kinesthetic Learner",
                icon: "👐",
                description: "Hands-on activities and real-world challenges.",
            },
            Self::Autism => ProfileInfo {
                profile: *self,
                name: "Structured Clarity",
                icon: "🧩",
                description: "Literal, predictable, and logically structured content.",
            },
        }
    }

    /// Whether the transformed `concepts` array carries structured visual
    /// records instead of plain strings.
    pub fn uses_visual_concepts(&self) -> bool {
        matches!(self, Self::Visual)
    }
}

impl fmt::Display for CognitiveProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CognitiveProfile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADHD" => Ok(Self::Adhd),
            "Dyslexia" => Ok(Self::Dyslexia),
            "Visual" => Ok(Self::Visual),
            "Auditory" => Ok(Self::Auditory),
            "Kinesthetic" => Ok(Self::Kinesthetic),
            "Autism" => Ok(Self::Autism),
            other => Err(CoreError::unknown_profile(other)),
        }
    }
}

/// Display metadata for a profile on the selection screen.
#[derive(Debug, Clone, Copy)]
pub struct ProfileInfo {
    pub profile: CognitiveProfile,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_through_tag() {
        for profile in CognitiveProfile::ALL {
            let parsed: CognitiveProfile = profile.as_str().parse().unwrap();
            assert_eq!(parsed, profile);
        }
    }

    #[test]
    fn serde_uses_the_literal_tags() {
        let json = serde_json::to_string(&CognitiveProfile::Adhd).unwrap();
        assert_eq!(json, "\"ADHD\"");
        let back: CognitiveProfile = serde_json::from_str("\"Kinesthetic\"").unwrap();
        assert_eq!(back, CognitiveProfile::Kinesthetic);
    }

    #[test]
    fn rejects_unknown_tags() {
        let result = "Tactile".parse::<CognitiveProfile>();
        assert!(matches!(
            result,
            Err(CoreError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn only_visual_uses_structured_concepts() {
        for profile in CognitiveProfile::ALL {
            assert_eq!(
                profile.uses_visual_concepts(),
                profile == CognitiveProfile::Visual
            );
        }
    }
}
