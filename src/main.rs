//! linguaplay - language-learning backend and terminal role-play.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use linguaplay::config::Config;
use linguaplay::gamification::BadgeCatalog;
use linguaplay::{cli, server};

#[derive(Parser)]
#[command(name = "linguaplay")]
#[command(about = "Chat, pronunciation practice and role-play with XP, levels and badges", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/linguaplay/config.toml)
    #[arg(long, global = true, env = "LINGUAPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides server.port and $PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List role-play scenarios
    Scenarios,

    /// List the badge catalog
    Badges,

    /// Play a role-play scenario in the terminal
    Play {
        /// Scenario id, e.g. market-shopping
        scenario_id: String,
    },

    /// Print the effective configuration
    Config,
}

fn init_logging(verbose: u8, json: bool, interactive: bool) {
    let default = match (verbose, interactive) {
        (0, true) => "linguaplay=warn",
        (0, false) => "linguaplay=info,tower_http=info",
        (1, _) => "linguaplay=debug,tower_http=debug",
        _ => "linguaplay=trace,tower_http=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let interactive = !matches!(args.command, Commands::Serve { .. });
    init_logging(args.verbose, args.log_json, interactive);

    let mut config = Config::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting linguaplay");
            server::serve(&config).await
        }
        Commands::Scenarios => {
            cli::print_scenarios(&config.roleplay.load_scenarios()?);
            Ok(())
        }
        Commands::Badges => {
            cli::print_badges(BadgeCatalog::builtin());
            Ok(())
        }
        Commands::Play { scenario_id } => cli::play::run(
            &config.roleplay.load_scenarios()?,
            &scenario_id,
            config.profile.defaults(),
            config.roleplay.badge_threshold,
        ),
        Commands::Config => {
            let rendered =
                toml::to_string_pretty(&config).context("failed to render configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}
