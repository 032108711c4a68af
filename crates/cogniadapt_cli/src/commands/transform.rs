use std::path::Path;

use cogniadapt_core::{AdapterClient, Concept, TransformedContent};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Transform study text for the selected profile and render the result
pub async fn run(
    client: &AdapterClient,
    text: Option<&str>,
    file: Option<&Path>,
    quiz: bool,
) -> Result<()> {
    let output = Output::new();

    let text = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await.into_diagnostic()?,
        (None, None) => {
            // Fall back to stdin so the command composes with pipes
            let mut buffer = String::new();
            tokio::io::AsyncReadExt::read_to_string(&mut tokio::io::stdin(), &mut buffer)
                .await
                .into_diagnostic()?;
            buffer
        }
    };

    output.status("Transforming content...");
    client.transform_text(&text).await?;

    let state = client.state();
    if let Some(message) = state.error.get() {
        output.error(&message);
        return Ok(());
    }
    let Some(content) = state.transformed_content.get() else {
        output.error("No content was produced");
        return Ok(());
    };

    render(&content, &output);

    if quiz && !content.questions.is_empty() {
        super::quiz::run(&content.questions, &output)?;
    } else if !content.questions.is_empty() {
        println!();
        output.status("Run with --quiz to test your knowledge");
    }

    Ok(())
}

fn render(content: &TransformedContent, output: &Output) {
    let info = content.profile.info();

    output.section(&format!("Adapted for {} {}", info.icon, info.name));
    println!();
    output.markdown(&content.summary);

    output.section("Key Concepts");
    for concept in &content.concepts {
        match concept {
            Concept::Plain(text) => output.list_item(text),
            Concept::Visual {
                title,
                description,
                visual_idea,
            } => {
                println!("    {} {}", "▸".bright_cyan(), title.bold());
                println!("      {}", description);
                println!("      {} {}", "Visual:".dimmed(), visual_idea.italic());
            }
        }
    }
}
