use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use cogniadapt_core::{AdapterClient, AspectRatio};
use miette::{IntoDiagnostic, Result, miette};
use tokio_stream::StreamExt;

use crate::output::Output;

const DEFAULT_IMAGE_PROMPT: &str = "Describe this image in detail.";
const DEFAULT_VIDEO_PROMPT: &str = "Summarize what happens in this video.";

/// Describe or answer a question about an image
pub async fn analyze_image(
    client: &AdapterClient,
    path: &Path,
    prompt: Option<&str>,
) -> Result<()> {
    let output = Output::new();

    output.status("Analyzing image...");
    let text = client
        .analyze_image(prompt.unwrap_or(DEFAULT_IMAGE_PROMPT), path)
        .await?;

    report(client, &output, &text);
    Ok(())
}

/// Transcribe an audio recording
pub async fn transcribe_audio(client: &AdapterClient, path: &Path) -> Result<()> {
    let output = Output::new();

    output.status("Transcribing audio...");
    let text = client.transcribe_audio(path).await?;

    report(client, &output, &text);
    Ok(())
}

/// Summarize or answer a question about a video
pub async fn analyze_video(
    client: &AdapterClient,
    path: &Path,
    prompt: Option<&str>,
) -> Result<()> {
    let output = Output::new();

    output.status("Analyzing video...");
    let text = client
        .analyze_video(prompt.unwrap_or(DEFAULT_VIDEO_PROMPT), path)
        .await?;

    report(client, &output, &text);
    Ok(())
}

fn report(client: &AdapterClient, output: &Output, text: &str) {
    if let Some(message) = client.state().error.get() {
        output.error(&message);
    }
    if !text.is_empty() {
        output.bot_message("CogniAdapt", text);
    }
}

/// Generate an image and write it to disk
pub async fn generate_image(
    client: &AdapterClient,
    prompt: &str,
    aspect_ratio: AspectRatio,
    out: &Path,
) -> Result<()> {
    let output = Output::new();

    output.status("Generating image...");
    let data_uri = client.generate_image(prompt, aspect_ratio).await?;

    if data_uri.is_empty() {
        if let Some(message) = client.state().error.get() {
            output.error(&message);
        }
        return Ok(());
    }

    let encoded = data_uri
        .rsplit_once("base64,")
        .map(|(_, data)| data)
        .ok_or_else(|| miette!("unexpected image payload format"))?;
    let bytes = BASE64.decode(encoded).into_diagnostic()?;
    tokio::fs::write(out, &bytes).await.into_diagnostic()?;

    output.success(&format!("Image written to {}", out.display()));
    Ok(())
}

/// Animate a still image into a short video, showing progress as it goes
pub async fn animate(
    client: &AdapterClient,
    image: &Path,
    prompt: &str,
    aspect_ratio: AspectRatio,
) -> Result<()> {
    let output = Output::new();

    let mut stream = client
        .animate_image(prompt.to_string(), image, aspect_ratio)
        .await?;

    while let Some(event) = stream.next().await {
        match event.video_url {
            Some(url) => {
                output.success("Animation complete");
                output.kv("Video", &url);
            }
            None if event.is_terminal() => {
                if let Some(message) = client.state().error.get() {
                    output.error(&message);
                } else {
                    output.error(&event.status);
                }
            }
            None => output.status(&event.status),
        }
    }

    Ok(())
}
