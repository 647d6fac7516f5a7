//! hack-proxy CLI - Serve structured hack ideas generated by Gemini

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hack_proxy::{
    api::GeminiClient,
    config::Config,
    orchestrator::{GenerationOutcome, Orchestrator},
    server::{self, AppState},
    tui::{TerminalRenderer, ThinkingSpinner},
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "hack-proxy")]
#[command(about = "Edge proxy that turns prompts into structured hack ideas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Config file (default: ~/.config/hack-proxy/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP endpoint
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate one hack and print it
    Generate {
        /// Prompt text (default from config)
        #[arg(short, long)]
        prompt: Option<String>,

        /// Language hint: auto, en, mr, ...
        #[arg(long)]
        lang: Option<String>,

        /// Print JSON instead of rendered markdown
        #[arg(long)]
        json: bool,
    },

    /// List the models each namespace advertises
    Models,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Serve { host, port } => {
            run_serve(&config_path, host, port).await?;
        }
        Commands::Generate { prompt, lang, json } => {
            run_generate(&config_path, prompt, lang, json).await?;
        }
        Commands::Models => {
            run_models(&config_path).await?;
        }
        Commands::Config(cmd) => {
            run_config_command(&config_path, cmd)?;
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_from(path.to_path_buf())
        .with_context(|| format!("loading {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn build_orchestrator(config: &Config) -> Orchestrator<GeminiClient> {
    let client = Arc::new(GeminiClient::new(config.api_config()));
    Orchestrator::new(config.orchestrator_config(), client)
}

async fn run_serve(path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    if config.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; every request will fail with 500");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(
        "Upstream {} (namespaces: {})",
        config.gemini.base_url,
        config.gemini.namespaces.join(", ")
    );

    let state = Arc::new(AppState::new(
        build_orchestrator(&config),
        config.prompt.clone(),
    ));
    server::serve(state, &addr, &config.server.route)
        .await
        .with_context(|| format!("serving on {}", addr))?;

    Ok(())
}

async fn run_generate(
    path: &Path,
    prompt: Option<String>,
    lang: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(path)?;
    let prompt = prompt.unwrap_or_else(|| config.prompt.default_prompt.clone());
    let lang = lang.unwrap_or_else(|| config.prompt.default_lang_hint.clone());
    let orchestrator = build_orchestrator(&config);

    let mut spinner = ThinkingSpinner::new();
    if !json {
        spinner.start("Asking Gemini for a hack...");
    }
    let result = orchestrator.generate(&prompt, Some(&lang)).await;
    spinner.stop();

    let generation = result?;

    if json {
        let body = match &generation.outcome {
            GenerationOutcome::Idea(idea) => serde_json::to_value(idea)?,
            GenerationOutcome::Diagnostic { reason, raw } => json!({ "error": reason, "raw": raw }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let renderer = TerminalRenderer::new();
    match &generation.outcome {
        GenerationOutcome::Idea(idea) => renderer.render_idea(idea, &generation.model),
        GenerationOutcome::Diagnostic { reason, raw } => {
            renderer.render_diagnostic(reason, raw, &generation.model)
        }
    }

    Ok(())
}

async fn run_models(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let orchestrator = build_orchestrator(&config);

    let mut spinner = ThinkingSpinner::new();
    spinner.start("Listing models...");
    let result = orchestrator.survey().await;
    spinner.stop();

    let survey = result?;

    TerminalRenderer::new().render_survey(&survey);
    Ok(())
}

fn run_config_command(path: &Path, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            config_init(path, force)?;
        }
        ConfigCommands::Show => {
            config_show(path)?;
        }
        ConfigCommands::Path => {
            config_path(path);
        }
    }
    Ok(())
}

fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    Config::default().save_to(path.to_path_buf())?;

    println!("Configuration file created at: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add gemini.api_key to the config file, or");
    println!("  2. Set the environment variable:");
    println!("     export GEMINI_API_KEY=your_key");
    println!();
    println!("Then start the endpoint:");
    println!("  hack-proxy serve");

    Ok(())
}

fn config_show(path: &Path) -> Result<()> {
    let mut config = Config::load_from(path.to_path_buf())?;

    // Mask API key in display
    if config.gemini.api_key.is_some() {
        config.gemini.api_key = Some("***".to_string());
    }
    println!("{}", toml::to_string_pretty(&config)?);

    println!("\n--- Environment Variables ---");
    for name in ["GEMINI_API_KEY", "GEMINI_BASE_URL", "HACK_PROXY_HOST", "HACK_PROXY_PORT"] {
        let status = if std::env::var(name).is_ok() { "set" } else { "not set" };
        println!("{}: {}", name, status);
    }

    Ok(())
}

fn config_path(path: &Path) {
    println!("{}", path.display());

    if path.exists() {
        println!("(file exists)");
    } else {
        println!("(file does not exist - run 'config init' to create)");
    }
}
