mod chat;
mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cogniadapt_core::storage::{FileProfileStore, ProfileStore};
use cogniadapt_core::{AdapterClient, AppState, AspectRatio, CogniConfig, GeminiBackend, config};
use miette::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "cogniadapt")]
#[command(about = "CogniAdapt cognitive-accessibility learning CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Learning profile management
    Profile {
        #[command(subcommand)]
        cmd: ProfileCommands,
    },
    /// Transform study text for the selected profile
    Transform {
        /// Text to transform
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(long)]
        file: Option<PathBuf>,

        /// Run the knowledge check after transforming
        #[arg(long)]
        quiz: bool,
    },
    /// Interactive chat with the support bot
    Chat,
    /// Analyze an image, audio recording, or video
    Analyze {
        #[command(subcommand)]
        cmd: AnalyzeCommands,
    },
    /// Generate an image from a prompt
    GenerateImage {
        prompt: String,

        /// Output framing (1:1, 16:9, 9:16, 4:3, 3:4)
        #[arg(long, default_value = "1:1")]
        aspect_ratio: String,

        /// Where to write the image
        #[arg(long, default_value = "generated_image.jpg")]
        out: PathBuf,
    },
    /// Animate a still image into a short video
    Animate {
        /// Image to animate
        image: PathBuf,

        /// How the image should move
        prompt: String,

        /// Output framing (16:9 or 9:16)
        #[arg(long, default_value = "16:9")]
        aspect_ratio: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List the available profiles
    List,
    /// Select a profile (ADHD, Dyslexia, Visual, Auditory, Kinesthetic, Autism)
    Select { name: String },
    /// Show the selected profile
    Show,
}

#[derive(Subcommand)]
enum AnalyzeCommands {
    /// Describe or answer a question about an image
    Image {
        path: PathBuf,
        /// Question to ask about the image
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Transcribe an audio recording
    Audio { path: PathBuf },
    /// Summarize or answer a question about a video
    Video {
        path: PathBuf,
        /// Question to ask about the video
        #[arg(long)]
        prompt: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Save current configuration to file
    Save {
        /// Path to save configuration
        #[arg(default_value = "cogniadapt.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if cli.debug {
        EnvFilter::new("cogniadapt_core=debug,cogniadapt_cli=debug")
    } else {
        EnvFilter::new("cogniadapt_core=info,cogniadapt_cli=info,warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        info!("Loading config from standard locations");
        config::load_config_from_standard_locations().await?
    };
    config.resolve_api_key();

    let client = build_client(&config)?;
    client.init().await?;

    match &cli.command {
        Commands::Profile { cmd } => match cmd {
            ProfileCommands::List => commands::profile::list(&client).await?,
            ProfileCommands::Select { name } => commands::profile::select(&client, name).await?,
            ProfileCommands::Show => commands::profile::show(&client).await?,
        },
        Commands::Transform { text, file, quiz } => {
            commands::transform::run(&client, text.as_deref(), file.as_deref(), *quiz).await?
        }
        Commands::Chat => chat::run(&client).await?,
        Commands::Analyze { cmd } => match cmd {
            AnalyzeCommands::Image { path, prompt } => {
                commands::media::analyze_image(&client, path, prompt.as_deref()).await?
            }
            AnalyzeCommands::Audio { path } => {
                commands::media::transcribe_audio(&client, path).await?
            }
            AnalyzeCommands::Video { path, prompt } => {
                commands::media::analyze_video(&client, path, prompt.as_deref()).await?
            }
        },
        Commands::GenerateImage {
            prompt,
            aspect_ratio,
            out,
        } => {
            let ratio: AspectRatio = aspect_ratio.parse()?;
            commands::media::generate_image(&client, prompt, ratio, out).await?
        }
        Commands::Animate {
            image,
            prompt,
            aspect_ratio,
        } => {
            let ratio: AspectRatio = aspect_ratio.parse()?;
            commands::media::animate(&client, image, prompt, ratio).await?
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config::show(&config).await?,
            ConfigCommands::Save { path } => commands::config::save(&config, path).await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

fn build_client(config: &CogniConfig) -> Result<AdapterClient> {
    let backend = Arc::new(GeminiBackend::new(config)?);
    let store: Arc<dyn ProfileStore> = match &config.profile_path {
        Some(path) => Arc::new(FileProfileStore::new(path)),
        None => Arc::new(FileProfileStore::new(FileProfileStore::default_path())),
    };
    Ok(AdapterClient::new(
        backend,
        Arc::new(AppState::new()),
        store,
        config.clone(),
    ))
}
