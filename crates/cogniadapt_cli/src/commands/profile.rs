use cogniadapt_core::{AdapterClient, CognitiveProfile};
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// List the available learning profiles, marking the selected one
pub async fn list(client: &AdapterClient) -> Result<()> {
    let output = Output::new();
    let selected = client.state().selected_profile.get();

    output.section("Learning Profiles");
    for profile in CognitiveProfile::ALL {
        let info = profile.info();
        let marker = if selected == Some(profile) {
            format!("{}", "●".bright_green())
        } else {
            " ".to_string()
        };
        println!(
            "  {} {} {} ({})",
            marker,
            info.icon,
            info.name.bold(),
            profile.as_str().dimmed()
        );
        println!("      {}", info.description.dimmed());
    }
    println!();
    output.status("Select one with: cogniadapt profile select <name>");

    Ok(())
}

/// Select and persist a profile
pub async fn select(client: &AdapterClient, tag: &str) -> Result<()> {
    let output = Output::new();
    let profile: CognitiveProfile = tag.parse()?;

    client.select_profile(profile).await?;

    let info = profile.info();
    output.success(&format!("Profile set to {} {}", info.icon, info.name));
    output.status(&info.description);

    Ok(())
}

/// Show the currently selected profile
pub async fn show(client: &AdapterClient) -> Result<()> {
    let output = Output::new();

    match client.state().selected_profile.get() {
        Some(profile) => {
            let info = profile.info();
            output.section("Current Profile");
            output.kv("Name", &format!("{} {}", info.icon, info.name));
            output.kv("Tag", profile.as_str());
            output.kv("Description", info.description);
        }
        None => {
            output.warning("No profile selected yet");
            output.status("Run: cogniadapt profile select <name>");
        }
    }

    Ok(())
}
