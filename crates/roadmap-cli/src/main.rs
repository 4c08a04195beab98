mod config;
mod decode_cmd;
mod input;
mod roadmap_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use roadmap_core::store::PgRoadmapStore;
use roadmap_db::config::DbConfig;
use roadmap_db::pool;

use config::RoadmapConfig;

#[derive(Parser)]
#[command(name = "roadmap", about = "Milestone roadmap plans and progress")]
struct Cli {
    /// Database URL (overrides ROADMAP_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a roadmap config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and run migrations
    DbInit,
    /// Decode and normalize a raw plan cell without touching the database
    Decode {
        /// File holding the raw cell (omit or `-` for stdin)
        file: Option<String>,
        /// Print the full report with recovery diagnostics
        #[arg(long)]
        trace: bool,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Show a user's plan and progress
    Show {
        user_id: String,
    },
    /// Mark a milestone complete for a user
    Complete {
        user_id: String,
        /// Milestone number (1-based)
        milestone: String,
    },
    /// Run the HTTP API
    Serve {
        /// Address to bind (default from config, else 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (default from config, else 3000)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Store a raw plan cell for a user, exactly as given
    Set {
        user_id: String,
        /// File holding the raw cell (`-` for stdin)
        file: String,
    },
}

/// Execute the `roadmap init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection::default(),
    };
    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server = {}:{}", cfg.server.bind, cfg.server.port);
    println!();
    println!("Next: run `roadmap db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `roadmap db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = RoadmapConfig::resolve(cli_db_url)?;

    println!("Initializing roadmap database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let summary = pool::row_summary(&db_pool).await?;
    println!(
        "Database ready. roadmaps: {} rows ({} with a plan, {} with progress)",
        summary.total, summary.with_plan, summary.with_progress
    );

    db_pool.close().await;

    println!("roadmap db-init complete.");
    Ok(())
}

async fn connect(cli_db_url: Option<&str>) -> anyhow::Result<(RoadmapConfig, PgRoadmapStore)> {
    let resolved = RoadmapConfig::resolve(cli_db_url)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    Ok((resolved, PgRoadmapStore::new(db_pool)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_url = cli.database_url.as_deref();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(db_url).await?;
        }
        Commands::Decode { file, trace } => {
            decode_cmd::run_decode(file.as_deref(), trace)?;
        }
        Commands::Plan { command } => {
            let (_, store) = connect(db_url).await?;
            let result = roadmap_cmds::run_plan_command(command, &store).await;
            store.pool().close().await;
            result?;
        }
        Commands::Show { user_id } => {
            let (_, store) = connect(db_url).await?;
            let result = roadmap_cmds::run_show(&store, &user_id).await;
            store.pool().close().await;
            result?;
        }
        Commands::Complete { user_id, milestone } => {
            let (_, store) = connect(db_url).await?;
            let result = roadmap_cmds::run_complete(&store, &user_id, &milestone).await;
            store.pool().close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let (resolved, store) = connect(db_url).await?;
            let resolved = resolved.with_server_overrides(bind, port);
            let db_pool = store.pool().clone();
            let result =
                serve_cmd::run_serve(Arc::new(store), &resolved.server.bind, resolved.server.port)
                    .await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
