mod batch;
mod cache;
mod client;
mod config;
mod db;
mod error;
mod fetcher;
mod normalize;
mod pipeline;
mod scorer;
mod types;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::batch::BatchSummary;
use crate::client::ReqwestTransport;
use crate::config::Config;
use crate::db::{EphemerisSource, MemoryStore, SqliteStore, Store};
use crate::error::Result;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "ingest")]
#[command(about = "Sports data ingestion: schedules, game detail, player scores")]
#[command(version)]
struct Cli {
    /// Keep everything in process memory instead of SQLite
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized schedule for a day as JSON
    Schedule {
        /// YYYY-MM-DD, defaults to today (UTC)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Fetch every scheduled game's detail and persist it
    SyncGames {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Recompute impact and influence scores
    ScorePlayers {
        /// Comma-separated player ids; all registered players when omitted
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<String>>,

        /// Ephemeris date, defaults to today (UTC)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// sync-games followed by score-players for every registered player
    Run {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cli, cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cfg: Config) -> Result<()> {
    // --- Store ---
    let memory = cli.memory.then(|| Arc::new(MemoryStore::new()));
    let (store, ephemeris): (Arc<dyn Store>, Arc<dyn EphemerisSource>) = match &memory {
        Some(m) => {
            info!("Using in-memory store");
            (m.clone() as Arc<dyn Store>, m.clone() as Arc<dyn EphemerisSource>)
        }
        None => {
            let sqlite = Arc::new(SqliteStore::connect(&cfg.db_path).await?);
            (sqlite.clone() as Arc<dyn Store>, sqlite as Arc<dyn EphemerisSource>)
        }
    };

    let transport = Arc::new(ReqwestTransport::new(cfg.request_timeout)?);
    let pipeline = Pipeline::new(&cfg, transport, store, ephemeris);
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Schedule { date } => {
            let games = pipeline.schedule(date.unwrap_or(today)).await;
            println!("{}", serde_json::to_string_pretty(&games)?);
        }
        Commands::SyncGames { date } => {
            report("sync-games", &pipeline.sync_games(date.unwrap_or(today)).await);
        }
        Commands::ScorePlayers { ids, date } => {
            report("score-players", &pipeline.score_players(ids, date.unwrap_or(today)).await);
        }
        Commands::Run { date } => {
            let date = date.unwrap_or(today);
            report("sync-games", &pipeline.sync_games(date).await);
            report("score-players", &pipeline.score_players(None, date).await);
        }
    }

    if let Some(m) = &memory {
        info!(games = m.game_count(), scores = m.score_count(), "In-memory store contents (discarded on exit)");
    }
    Ok(())
}

fn report(stage: &str, s: &BatchSummary) {
    info!(stage, updated = s.updated, errors = s.errors, "Stage finished");
}
