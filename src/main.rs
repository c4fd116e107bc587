use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use opsboard::api;
use opsboard::config::{CONFIG_FILE, OpsConfig};

#[derive(Parser)]
#[command(name = "opsboard")]
#[command(version, about = "Team operations dashboard service")]
pub struct Cli {
    /// Directory holding opsboard.toml (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to serve on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Dev mode: bind 0.0.0.0 and allow permissive CORS
        #[arg(long)]
        dev: bool,

        /// Use the in-memory store instead of the GitHub repository
        #[arg(long)]
        offline: bool,

        /// Open the dashboard in a browser after the server starts
        #[arg(long)]
        open: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default opsboard.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "opsboard=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Serve {
            port,
            dev,
            offline,
            open,
        } => {
            let mut config = OpsConfig::load_or_default(&project_dir)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if dev {
                config.server.dev = true;
            }
            for warning in config.validate() {
                warn!("{}", warning);
            }

            // Spawn browser open before starting the server (which blocks).
            if open && !config.server.dev {
                let url = format!("http://localhost:{}", config.server.port);
                tokio::spawn(async move {
                    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
                    if let Err(e) = open::that(&url) {
                        eprintln!("Failed to open browser: {}", e);
                    }
                });
            }

            api::start_server(config, offline).await?;
        }
        Commands::Config { command } => {
            let config_path = project_dir.join(CONFIG_FILE);
            match command.unwrap_or(ConfigCommands::Show) {
                ConfigCommands::Show => {
                    let config = OpsConfig::load_or_default(&project_dir)?;
                    let rendered = toml::to_string_pretty(&config)
                        .context("Failed to render configuration")?;
                    println!("{}", rendered);
                }
                ConfigCommands::Validate => {
                    let config = OpsConfig::load_or_default(&project_dir)?;
                    let warnings = config.validate();
                    if warnings.is_empty() {
                        println!("Configuration OK");
                    } else {
                        for warning in warnings {
                            println!("warning: {}", warning);
                        }
                    }
                }
                ConfigCommands::Init => {
                    if config_path.exists() {
                        println!("{} already exists", config_path.display());
                    } else {
                        OpsConfig::default().save(&config_path)?;
                        println!("Initialized {}", config_path.display());
                    }
                }
            }
        }
    }

    Ok(())
}
