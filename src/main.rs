use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod db;
mod error;
mod models;
mod overview;
mod report;
mod rollups;
mod stats;
mod trend;

use config::Config;

#[derive(Parser)]
#[command(name = "review-pulse")]
#[command(about = "Review analytics for the business dashboard", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("scope")
        .args(["owner", "business"])
        .required(true)
        .multiple(false)
))]
struct Scope {
    /// Every business owned by this user
    #[arg(long)]
    owner: Option<Uuid>,
    /// Explicit business ids (repeatable)
    #[arg(long)]
    business: Vec<Uuid>,
}

impl Scope {
    fn label(&self) -> String {
        match self.owner {
            Some(owner) => format!("owner {owner}"),
            None => format!("{} business(es)", self.business.len()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import reviews from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the dashboard overview as JSON
    Overview {
        #[command(flatten)]
        scope: Scope,
        #[arg(long)]
        pretty: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scope: Scope,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn resolve_business_ids(pool: &PgPool, scope: &Scope) -> anyhow::Result<Vec<Uuid>> {
    match scope.owner {
        Some(owner) => db::fetch_business_ids(pool, owner).await,
        None => Ok(scope.business.clone()),
    }
}

async fn load_overview(
    pool: &PgPool,
    scope: &Scope,
    config: &Config,
    now: DateTime<Utc>,
) -> anyhow::Result<models::DashboardOverview> {
    let business_ids = resolve_business_ids(pool, scope).await?;

    let input = if business_ids.is_empty() {
        info!("no businesses in scope; returning an empty dashboard");
        None
    } else {
        Some(db::fetch_overview_input(pool, &business_ids).await?)
    };

    Ok(overview::overview_for_businesses(
        &business_ids,
        input.as_ref(),
        now,
        &config.dashboard,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config)?;
    debug!(?config, "configuration loaded");

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted (owner {}).", db::SEED_OWNER_ID);
        }
        Commands::Import { csv } => {
            let summary = db::import_csv(&pool, &csv).await?;
            println!(
                "Inserted {} reviews from {} ({} duplicates, {} rejected).",
                summary.inserted,
                csv.display(),
                summary.duplicates,
                summary.rejected
            );
        }
        Commands::Overview { scope, pretty } => {
            let overview = load_overview(&pool, &scope, &config, Utc::now()).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&overview)?
            } else {
                serde_json::to_string(&overview)?
            };
            println!("{json}");
        }
        Commands::Report { scope, out } => {
            let now = Utc::now();
            let overview = load_overview(&pool, &scope, &config, now).await?;
            let report = report::build_report(&scope.label(), now, &overview);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
