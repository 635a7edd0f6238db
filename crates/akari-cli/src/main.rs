mod engine;
mod query;
mod schedule;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::query::{CircleCommands, CompetitorsCommands, ProfileCommands, RunsCommands};

#[derive(Debug, Parser)]
#[command(name = "akari-cli")]
#[command(about = "Akari circle and similarity engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute one full engine run now
    Run {
        /// Override the rescoring quota for this run
        #[arg(long)]
        batch_size: Option<usize>,
        /// List the projects a run would process without calling out or writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the engine on the configured cron schedule until interrupted
    Schedule,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Inspect the global circle
    Circle {
        #[command(subcommand)]
        command: CircleCommands,
    },
    /// Inspect a project's competitors
    Competitors {
        #[command(subcommand)]
        command: CompetitorsCommands,
    },
    /// Inspect recorded engine runs
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Inspect a stored profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert projects from the projects file
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("akari-cli: no command given; see --help");
        return Ok(());
    };

    let config = akari_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = akari_db::PoolConfig::from_app_config(&config);
    let pool = akari_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Run {
            batch_size,
            dry_run,
        } => {
            if dry_run {
                engine::run_dry(&pool).await?;
            } else {
                let options = akari_circles::RunOptions { batch_size };
                let summary = engine::run_engine_once(&pool, &config, "cli", &options).await?;
                engine::print_summary(&summary);
            }
        }
        Commands::Schedule => schedule::run_schedule(pool, config).await?,
        Commands::Db { command } => run_db(&pool, &config, command).await?,
        Commands::Circle {
            command: CircleCommands::Show { limit },
        } => query::show_circle(&pool, limit).await?,
        Commands::Competitors {
            command: CompetitorsCommands::Show { slug },
        } => query::show_competitors(&pool, &slug).await?,
        Commands::Runs {
            command: RunsCommands::List { limit },
        } => query::list_runs(&pool, limit).await?,
        Commands::Runs {
            command: RunsCommands::Show { id },
        } => query::show_run(&pool, id).await?,
        Commands::Profile {
            command: ProfileCommands::Show { handle },
        } => query::show_profile(&pool, &handle).await?,
    }

    Ok(())
}

async fn run_db(
    pool: &sqlx::PgPool,
    config: &akari_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            akari_db::ping(pool).await?;
            println!("database connection ok");
        }
        DbCommands::Migrate => {
            let applied = akari_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Seed => {
            let file = akari_core::load_projects(&config.projects_path)?;
            let count = akari_db::seed_projects(pool, &file.projects).await?;
            tracing::info!(
                count,
                path = %config.projects_path.display(),
                "projects seeded"
            );
            println!("seeded {count} project(s)");
        }
    }
    Ok(())
}

/// Mark a run failed, logging (not propagating) any error doing so.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = akari_db::fail_engine_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark engine run as failed"
        );
    }
}
