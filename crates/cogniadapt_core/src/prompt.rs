//! Prompt construction for profile-driven content transformation.
//!
//! The transform prompt has three segments: a fixed preamble demanding
//! strict JSON, a profile-specific block of formatting rules, and a fixed
//! trailing quiz instruction. The segments are assembled with a minijinja
//! template so the skeleton stays data, not string concatenation code.

use std::collections::HashMap;

use minijinja::Environment;

use crate::error::Result;
use crate::profile::CognitiveProfile;

/// System instruction for the chat assistant session.
pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are Cogni-Chat, a friendly and helpful AI assistant for the Cogni-Adapt application. Your goal is to help users understand complex topics by providing clear, concise, and accessible explanations. Avoid jargon and be encouraging.";

const BASE_INSTRUCTION: &str = "You are an AI assistant specialized in adapting educational content for neurodiverse learners. Your task is to transform the provided text for a user with the selected profile. The output must be a valid JSON object that strictly adheres to the provided schema. Do not include any markdown formatting (like ```json) in the JSON output.";

const QUIZ_INSTRUCTION: &str = "The 'questions' array must contain 3-5 multiple-choice questions based on the key concepts in the text. Each question object must have 'question', 'options' (an array of 4 strings), 'correctAnswer' (one of the options), and a brief 'explanation'.";

const TRANSFORM_TEMPLATE: &str =
    "{{ base }}\n{{ rules }}\n{{ quiz }}\n\nHere is the text to transform:\n\n{{ text }}";

/// The formatting rules unique to a profile.
pub fn profile_rules(profile: CognitiveProfile) -> &'static str {
    match profile {
        CognitiveProfile::Adhd => {
            r#"Profile: ADHD - "Focus Flow"
Transform the text with:
- STRUCTURE: Use a maximum of 2 sentences per bullet point. Group into "chunks" of 3-5 bullets.
- ENGAGEMENT: Start each concept with a relevant emoji as a visual anchor. Bold **key terms** using markdown.
- FOCUS AIDS: Include "Why This Matters" or "Quick Win" micro-sections where appropriate.

JSON Requirements:
- The 'summary' should be short, energetic, and highly engaging.
- The 'concepts' array must contain strings. Each string is a concise bullet point."#
        }
        CognitiveProfile::Dyslexia => {
            r#"Profile: Dyslexia - "Clear Path"
Transform the text with:
- TYPOGRAPHY: Ensure one main idea per line or short paragraph. Use extra spacing for visual breathing room.
- VOCABULARY: Use short sentences (max 15 words) and active voice. Replace complex words with simpler alternatives. Define technical terms immediately in parentheses.

JSON Requirements:
- The 'summary' should be simple, direct, and easy to read.
- The 'concepts' array must contain strings. Each string is a short, easily digestible paragraph."#
        }
        CognitiveProfile::Visual => {
            r#"Profile: Visual - "Picture Perfect"
Transform the text by breaking it into core concepts and suggesting visuals for each.
- VISUAL DESCRIPTIONS: For each concept, describe a helpful visual like a diagram, chart, illustration, or mind map.
- STRUCTURE: Focus on hierarchy and spatial relationships.

JSON Requirements:
- The 'summary' should provide a high-level overview.
- The 'concepts' array must contain objects, each with 'title', 'description', and a creative 'visualIdea' for a helpful diagram, icon, or illustration."#
        }
        CognitiveProfile::Auditory => {
            r#"Profile: Auditory - "Sound Learning"
Transform the text for an auditory learner with:
- RHYTHM: Write in natural, conversational speaking patterns.
- ENGAGEMENT: Include verbal mnemonics, rhymes, or acronyms to aid memory. Add "say this out loud" prompts.
- STRUCTURE: Use a conversational tone, like a podcast script.

JSON Requirements:
- The 'summary' should be like a podcast intro.
- The 'concepts' array must contain strings. Use special prefixes for certain concepts: '[Mnemonic]:' for memory aids, '[Say Aloud]:' for verbal prompts."#
        }
        CognitiveProfile::Kinesthetic => {
            r#"Profile: Kinesthetic - "Learn by Doing"
Transform the text for a kinesthetic learner with:
- ACTIVITIES: For each main concept, suggest a simple, hands-on activity or a real-world application challenge.
- INTERACTION: Frame concepts as problems to solve or things to build.
- ENGAGEMENT: Use active, command-oriented language.

JSON Requirements:
- The 'summary' should set up a challenge or goal.
- The 'concepts' array must contain strings. Use special prefixes: '[Activity]:' for hands-on tasks, and '[Challenge]:' for real-world application problems."#
        }
        CognitiveProfile::Autism => {
            r#"Profile: Autism - "Structured Clarity"
Transform the text for a learner who thrives on structure and clarity:
- PREDICTABILITY: Use consistent formatting. No ambiguous language, idioms, or metaphors. Be literal and precise.
- DETAIL: Break down all processes into logical, numbered, step-by-step instructions.
- SENSORY: Keep the language direct and unadorned. Focus on facts and patterns.

JSON Requirements:
- The 'summary' must state the topic and the key takeaways very clearly.
- The 'concepts' array must contain strings. Each string should be a literal, precise, and logical statement or a step in a process."#
        }
    }
}

/// A named prompt template rendered with minijinja.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub template: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let template = template.into();

        // Validate the template compiles before first use
        let mut env = Environment::new();
        env.add_template("validate", &template)
            .map_err(|e| crate::error::CoreError::TemplateError {
                template: name.clone(),
                cause: e,
            })?;

        Ok(Self { name, template })
    }

    pub fn render(&self, context: &HashMap<String, serde_json::Value>) -> Result<String> {
        let mut env = Environment::new();
        env.add_template(&self.name, &self.template).map_err(|e| {
            crate::error::CoreError::TemplateError {
                template: self.name.clone(),
                cause: e,
            }
        })?;

        let jinja_context = minijinja::value::Value::from_serialize(context);

        let tmpl = env
            .get_template(&self.name)
            .map_err(|e| crate::error::CoreError::TemplateError {
                template: self.name.clone(),
                cause: e,
            })?;

        tmpl.render(jinja_context)
            .map_err(|e| crate::error::CoreError::TemplateError {
                template: self.name.clone(),
                cause: e,
            })
    }
}

/// Build the full transformation instruction for a profile and source text.
pub fn build_transform_prompt(profile: CognitiveProfile, text: &str) -> Result<String> {
    let template = PromptTemplate::new("transform", TRANSFORM_TEMPLATE)?;

    let mut context = HashMap::new();
    context.insert("base".to_string(), serde_json::json!(BASE_INSTRUCTION));
    context.insert(
        "rules".to_string(),
        serde_json::json!(profile_rules(profile)),
    );
    context.insert("quiz".to_string(), serde_json::json!(QUIZ_INSTRUCTION));
    context.insert("text".to_string(), serde_json::json!(text));

    template.render(&context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // The quoted code name that only one profile's rule block carries
    fn marker(profile: CognitiveProfile) -> &'static str {
        match profile {
            CognitiveProfile::Adhd => "\"Focus Flow\"",
            CognitiveProfile::Dyslexia => "\"Clear Path\"",
            CognitiveProfile::Visual => "\"Picture Perfect\"",
            CognitiveProfile::Auditory => "\"Sound Learning\"",
            CognitiveProfile::Kinesthetic => "\"Learn by Doing\"",
            CognitiveProfile::Autism => "\"Structured Clarity\"",
        }
    }

    #[test]
    fn prompt_contains_only_its_own_profile_block() {
        for profile in CognitiveProfile::ALL {
            let prompt = build_transform_prompt(profile, "some text").unwrap();
            assert!(
                prompt.contains(marker(profile)),
                "{} prompt missing its own block",
                profile
            );
            for other in CognitiveProfile::ALL {
                if other != profile {
                    assert!(
                        !prompt.contains(marker(other)),
                        "{} prompt leaked the {} block",
                        profile,
                        other
                    );
                }
            }
        }
    }

    #[test]
    fn prompt_has_all_three_segments_and_the_text() {
        let prompt =
            build_transform_prompt(CognitiveProfile::Autism, "Photosynthesis converts light.")
                .unwrap();
        assert!(prompt.starts_with(BASE_INSTRUCTION));
        assert!(prompt.contains(QUIZ_INSTRUCTION));
        assert!(prompt.ends_with("Photosynthesis converts light."));
    }

    #[test]
    fn preamble_forbids_markdown_fencing() {
        let prompt = build_transform_prompt(CognitiveProfile::Adhd, "x").unwrap();
        assert!(prompt.contains("Do not include any markdown formatting"));
        assert!(prompt.contains("valid JSON object"));
    }

    #[test]
    fn quiz_instruction_pins_the_option_count() {
        let prompt = build_transform_prompt(CognitiveProfile::Dyslexia, "x").unwrap();
        assert!(prompt.contains("3-5 multiple-choice questions"));
        assert!(prompt.contains("an array of 4 strings"));
    }

    #[test]
    fn template_render_substitutes_variables() {
        let template = PromptTemplate::new("greeting", "Hello {{ name }}!").unwrap();
        let mut context = HashMap::new();
        context.insert("name".to_string(), serde_json::json!("World"));
        assert_eq!(template.render(&context).unwrap(), "Hello World!");
    }
}
