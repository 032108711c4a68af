//! Response-shape descriptors passed to the backend to constrain generation.
//!
//! These use the Gemini response-schema dialect (uppercase type names). The
//! same descriptor is the implicit contract `TransformedContent::from_json`
//! validates the parsed payload against.

use serde_json::{Value, json};

use crate::profile::CognitiveProfile;

fn question_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": { "type": "STRING" },
            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
            "correctAnswer": { "type": "STRING" },
            "explanation": { "type": "STRING" }
        },
        "required": ["question", "options", "correctAnswer", "explanation"]
    })
}

fn concepts_schema(profile: CognitiveProfile) -> Value {
    if profile.uses_visual_concepts() {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "visualIdea": { "type": "STRING" }
                },
                "required": ["title", "description", "visualIdea"]
            }
        })
    } else {
        json!({ "type": "ARRAY", "items": { "type": "STRING" } })
    }
}

/// The full response schema for a transformation request.
pub fn response_schema(profile: CognitiveProfile) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "concepts": concepts_schema(profile),
            "questions": { "type": "ARRAY", "items": question_schema() }
        },
        "required": ["summary", "concepts", "questions"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn visual_profile_gets_structured_concept_items() {
        let schema = response_schema(CognitiveProfile::Visual);
        let items = &schema["properties"]["concepts"]["items"];
        assert_eq!(items["type"], "OBJECT");
        assert_eq!(
            items["required"],
            json!(["title", "description", "visualIdea"])
        );
    }

    #[test]
    fn all_other_profiles_get_plain_string_items() {
        for profile in CognitiveProfile::ALL {
            if profile == CognitiveProfile::Visual {
                continue;
            }
            let schema = response_schema(profile);
            assert_eq!(
                schema["properties"]["concepts"]["items"],
                json!({ "type": "STRING" }),
                "{} should use plain concepts",
                profile
            );
        }
    }

    #[test]
    fn top_level_fields_are_required() {
        let schema = response_schema(CognitiveProfile::Adhd);
        assert_eq!(schema["required"], json!(["summary", "concepts", "questions"]));
        let question = &schema["properties"]["questions"]["items"];
        assert_eq!(
            question["required"],
            json!(["question", "options", "correctAnswer", "explanation"])
        );
    }
}
