use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use cogniadapt_core::CogniConfig;
use cogniadapt_core::config::save_config;

use crate::output::Output;

/// Show current configuration
pub async fn show(config: &CogniConfig) -> Result<()> {
    let output = Output::new();

    output.section("Current Configuration");
    println!();

    // Display the current config in TOML format, with the key held back
    let mut display = config.clone();
    if display.api_key.is_some() {
        display.api_key = Some("[set]".to_string());
    }
    let toml_str = toml::to_string_pretty(&display).into_diagnostic()?;
    println!("{}", toml_str);

    Ok(())
}

/// Save current configuration to file
pub async fn save(config: &CogniConfig, path: &PathBuf) -> Result<()> {
    let output = Output::new();

    output.info(
        "💾",
        &format!("Saving configuration to: {}", path.display()),
    );

    // The API key stays in the environment, never in the file
    let mut to_save = config.clone();
    to_save.api_key = None;
    save_config(&to_save, path).await?;

    output.success("Configuration saved successfully!");
    println!();
    println!("To use this configuration, run:");
    println!(
        "  {} --config {}",
        "cogniadapt".bright_green(),
        path.display()
    );

    Ok(())
}
