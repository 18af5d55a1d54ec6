//! `statwatch` command-line entry point.
//!
//! One invocation runs one command against the configured snapshot store:
//!
//! - `statwatch track <NAME>...`
//! - `statwatch faction <ID>`
//! - `statwatch clear <NAME>`
//! - `statwatch export [--out FILE]`
//! - `statwatch top [-n N] [--metric METRIC]`
//! - `statwatch status <NAME>`

mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap::Subcommand;
use statwatch_core::AppConfig;
use statwatch_core::Clock;
use statwatch_core::ConfigLoader;
use statwatch_core::MetricSelector;
use statwatch_core::RankingError;
use statwatch_core::SnapshotStore;
use statwatch_core::SystemClock;
use statwatch_core::TornClient;
use statwatch_core::TrackOutcome;
use statwatch_core::Tracker;

#[derive(Debug, Parser)]
#[command(name = "statwatch", version, about = "Track Torn player stat growth between lookups")]
struct Cli {
    /// Config file. Defaults to ./statwatch.toml, then the user config dir.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch players, report growth since the last lookup and store the result.
    Track {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// Track every member of a faction.
    Faction {
        #[arg(value_name = "FACTION_ID")]
        id: u64,
    },
    /// Forget the stored snapshot for a player.
    Clear {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Dump every stored snapshot as CSV.
    Export {
        /// Write to FILE instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Rank stored players by a metric.
    Top {
        #[arg(short = 'n', long = "count", default_value_t = 10)]
        n: usize,
        #[arg(long, default_value_t = MetricSelector::TotalStats)]
        metric: MetricSelector,
    },
    /// Show a player's current status.
    Status {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

impl Command {
    fn needs_api(&self) -> bool {
        matches!(
            self,
            Command::Track { .. } | Command::Faction { .. } | Command::Status { .. }
        )
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => ConfigLoader::new().with_file(path).load(),
        None => ConfigLoader::load_default(),
    };
    config.context("loading configuration")
}

fn build_tracker(config: &AppConfig) -> Result<Tracker> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = TornClient::from_config(config, clock).context("building HTTP client")?;
    let store = SnapshotStore::open(config.store.data_dir.clone()).with_context(|| {
        format!(
            "opening snapshot store at {}",
            config.store.data_dir.display()
        )
    })?;
    Ok(Tracker::new(client, store, config.store.key_mode))
}

/// Print outcomes; true when every input succeeded.
fn report(outcomes: &[TrackOutcome]) -> bool {
    for o in outcomes {
        println!("{}", render::outcome(o));
    }
    outcomes.iter().all(|o| o.result.is_ok())
}

async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_ref())?;
    if cli.command.needs_api() && config.api.key.is_none() {
        bail!("no API key configured; set api.key in the config file or STATWATCH_API__KEY");
    }
    let tracker = build_tracker(&config)?;

    match cli.command {
        Command::Track { names } => Ok(report(&tracker.track(&names).await)),
        Command::Faction { id } => {
            let outcomes = tracker.track_faction(id).await?;
            if outcomes.is_empty() {
                println!("faction {id} has no members");
            }
            Ok(report(&outcomes))
        }
        Command::Clear { name } => {
            if tracker.clear(&name).await? {
                println!("{name}: cleared");
            } else {
                println!("{name}: nothing stored");
            }
            Ok(true)
        }
        Command::Export { out } => match tracker.export() {
            Ok(table) => {
                let csv = table.to_csv();
                match out {
                    Some(path) => {
                        std::fs::write(&path, csv)
                            .with_context(|| format!("writing {}", path.display()))?;
                        println!("exported {} rows to {}", table.rows.len(), path.display());
                    }
                    None => print!("{csv}"),
                }
                Ok(true)
            }
            Err(RankingError::EmptyStore) => {
                println!("nothing to export");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        },
        Command::Top { n, metric } => match tracker.top(n, metric) {
            Ok(entries) => {
                print!("{}", render::ranking(&entries, &metric.to_string()));
                Ok(true)
            }
            Err(RankingError::EmptyStore) => {
                println!("no tracked players");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        },
        Command::Status { name } => {
            let status = tracker.status(&name).await?;
            println!("{}", render::status(&name, &status));
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
