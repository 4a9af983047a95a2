#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use medgate::config::Config;
use medgate::gateway::AppState;
use medgate::media::ArtifactStore;
use medgate::providers::{self, AvatarClient, SpeechSynthesizer, TextGenerator, Transcriber};
use medgate::reports::ReportArchive;
use medgate::session::{self, SessionStore};
use medgate::{doctor, gateway, health};

#[derive(Parser, Debug)]
#[command(name = "medgate")]
#[command(version = "0.1.0")]
#[command(about = "Demo medical assistant gateway.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Bind address override
        #[arg(long)]
        host: Option<String>,

        /// Port override
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check configuration, directories, and backend connectivity
    Doctor,

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respects RUST_LOG, defaults to INFO.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut config = Config::load_or_init()?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config).await
        }
        Commands::Doctor => doctor::run(&config).await,
        Commands::Status => {
            print_status(&config);
            Ok(())
        }
    }
}

fn print_status(config: &Config) {
    let key_flag = |key: &Option<String>| {
        if key.as_deref().is_some_and(|k| !k.is_empty()) {
            "configured"
        } else {
            "missing"
        }
    };
    let avatar = &config.avatar;
    let avatar_complete =
        avatar.api_key.is_some() && avatar.agent_id.is_some() && avatar.client_key.is_some();

    println!("🩺 MedGate Status");
    println!();
    println!("Version:   {}", env!("CARGO_PKG_VERSION"));
    println!("Config:    {}", config.config_path.display());
    println!();
    println!(
        "🤖 Generative:     {} ({})",
        config.generative.provider, config.generative.model
    );
    println!("   API key:        {}", key_flag(&config.generative.api_key));
    println!(
        "🎙️  Transcription:  {} ({})",
        config.transcription.provider, config.transcription.model
    );
    println!("   API key:        {}", key_flag(&config.transcription.api_key));
    println!(
        "🔊 Synthesis:      {} ({})",
        config.synthesis.provider, config.synthesis.language
    );
    println!(
        "🎭 Avatar:         {}",
        if avatar_complete { "complete" } else { "incomplete" }
    );
    println!();
    println!(
        "Server:    http://{}:{}",
        config.server.host, config.server.port
    );
    println!(
        "Sessions:  {} (max {})",
        config.session.backend, config.session.max_sessions
    );
    println!("Media:     {}", config.media.dir.display());
    println!(
        "Reports:   {} (history {})",
        config.reports.dir.display(),
        config.reports.history_limit
    );
}

async fn serve(config: Config) -> Result<()> {
    let generator: Arc<dyn TextGenerator> =
        Arc::from(providers::create_generator(&config.generative)?);
    let transcriber: Arc<dyn Transcriber> =
        Arc::from(providers::create_transcriber(&config.transcription)?);
    let synthesizer: Arc<dyn SpeechSynthesizer> =
        Arc::from(providers::create_synthesizer(&config.synthesis)?);
    let avatar = Arc::new(AvatarClient::new(&config.avatar));
    let sessions: Arc<dyn SessionStore> = Arc::from(session::create_session_store(&config.session));
    let media = Arc::new(ArtifactStore::new(config.media.dir.clone())?);
    let reports = Arc::new(ReportArchive::new(
        config.reports.dir.clone(),
        config.reports.history_limit,
    )?);

    info!(
        "starting medgate: generator '{}', transcriber '{}', synthesizer '{}'",
        generator.name(),
        transcriber.name(),
        synthesizer.name()
    );

    // Connectivity probe. A dead backend still serves; the consultation
    // endpoints degrade per request.
    match generator.warmup().await {
        Ok(_) => {
            health::mark_ok("generative");
            info!("generative backend reachable");
        }
        Err(err) => {
            health::mark_error("generative", &err);
            warn!("generative warmup failed: {err}");
        }
    }

    let state = AppState {
        config: Arc::new(config),
        generator,
        transcriber,
        synthesizer,
        avatar,
        sessions,
        media,
        reports,
    };
    gateway::run(state).await
}
