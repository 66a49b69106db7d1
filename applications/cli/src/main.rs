/// Vibefy - terminal music client
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibefy_audio_desktop::RodioSession;
use vibefy_cli::{
    config::CliConfig,
    display::{entry_row, page, page_count, PAGE_SIZE},
    player::Player,
};
use vibefy_playback::{AudioSession, NullSession, PlaybackService};
use vibefy_server_client::{HttpTrackLoader, ServerConfig, VibefyClient};

#[derive(Parser)]
#[command(name = "vibefy")]
#[command(about = "Vibefy music client", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server URL (overrides the configuration)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "VIBEFY_PASSWORD")]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "VIBEFY_PASSWORD")]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List your songs
    List {
        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Upload an audio file
    Upload {
        /// File to upload
        path: PathBuf,
    },
    /// Play your library interactively
    Play {
        /// Start with this song id
        #[arg(long, conflicts_with = "index")]
        id: Option<String>,
        /// Start with the song at this list position (1-based)
        #[arg(long)]
        index: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibefy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let client = connect(&config).await?;

    match cli.command {
        Commands::Login { email, password } => {
            let response = client.login(&email, &password).await?;
            config
                .save_session(&response.session)
                .await
                .with_context(|| format!("Failed to write {}", config.session_file.display()))?;
            println!("{}", response.message);
        }
        Commands::Signup {
            email,
            username,
            password,
        } => {
            let message = client.signup(&email, &username, &password).await?;
            println!("{message}");
        }
        Commands::Logout => {
            config.clear_session().await?;
            println!("Logged out");
        }
        Commands::List { page: number } => list(&client, number).await?,
        Commands::Upload { path } => {
            let receipt = client.upload(&path).await?;
            println!("{}", receipt.message);
        }
        Commands::Play { id, index } => play(&config, client, id, index).await?,
    }

    Ok(())
}

async fn connect(config: &CliConfig) -> anyhow::Result<VibefyClient> {
    let server = match config.resolve_session().await {
        Some(session) => ServerConfig::with_session(&config.server_url, session),
        None => ServerConfig::new(&config.server_url),
    };
    Ok(VibefyClient::new(server)?)
}

async fn list(client: &VibefyClient, number: usize) -> anyhow::Result<()> {
    let catalog = client.song_list().await?;
    if catalog.is_empty() {
        println!("No songs yet. Upload one with `vibefy upload <file>`.");
        return Ok(());
    }

    let pages = page_count(catalog.len(), PAGE_SIZE);
    let number = number.clamp(1, pages);
    let offset = (number - 1) * PAGE_SIZE;
    for (i, entry) in page(&catalog.entries, number, PAGE_SIZE).iter().enumerate() {
        println!("{}", entry_row(offset + i, entry));
    }
    println!("Page {number} of {pages}");
    Ok(())
}

async fn play(
    config: &CliConfig,
    client: VibefyClient,
    id: Option<String>,
    index: Option<usize>,
) -> anyhow::Result<()> {
    let catalog = client.song_list().await?;
    let loader = Arc::new(HttpTrackLoader::new(client.clone()));

    let (handle, task) = PlaybackService::spawn(
        config.playback_config(),
        |events| -> Box<dyn AudioSession> {
            match RodioSession::new(events) {
                Ok(session) => Box::new(session),
                Err(e) => {
                    warn!(error = %e, "No audio output, continuing silently");
                    Box::new(NullSession::new())
                }
            }
        },
        Arc::clone(&loader),
    );

    handle.set_queue(catalog.tracks())?;
    match (id, index) {
        (Some(id), _) => handle.play_by_id(id)?,
        (None, Some(position)) if position > 0 => handle.play_at_index(position - 1)?,
        _ => {}
    }
    info!(tracks = catalog.len(), "Player ready");

    let result = Player::new(handle.clone(), client).run().await;

    handle.shutdown().await?;
    task.await?;
    info!(live_handles = loader.live_handles(), "Player stopped");
    result
}
