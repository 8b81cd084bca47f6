//! Operator CLI for the portfolio store.
//!
//! # Responsibility
//! - Open the configured database and run one ordering command.
//! - Print results as JSON on stdout and errors on stderr.

use clap::{Parser, Subcommand};
use log::{error, info};
use portfolio_core::db::open_db;
use portfolio_core::{
    init_logging_from_config, PortfolioConfig, ProjectService, SqliteProjectRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Database file.
    #[arg(long, global = true, env = "PORTFOLIO_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage info.
    Ping,
    /// List projects in display order.
    List {
        #[arg(long)]
        featured: Option<bool>,
    },
    /// Renumber both partitions to 1..=n.
    Rebalance,
    /// Apply a full ordering to one partition.
    Reorder {
        #[arg(long)]
        featured: bool,
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Move a project to the other partition.
    Toggle { id: Uuid },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if let Command::Ping = args.command {
        println!("portfolio_core ping={}", portfolio_core::ping());
        println!("portfolio_core version={}", portfolio_core::core_version());
        return Ok(());
    }

    let mut config = PortfolioConfig::from_env()?;
    if let Some(db) = args.db {
        config.db_path = db;
    }
    init_logging_from_config(&config)?;
    info!(
        "event=config_load module=cli status=ok db_path={} log_level={}",
        config.db_path.display(),
        config.log_level
    );

    let conn = open_db(&config.db_path)?;
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn)?);

    let output = match args.command {
        Command::Ping => return Ok(()),
        Command::List { featured } => {
            serde_json::to_string_pretty(&service.list_projects(featured)?)?
        }
        Command::Rebalance => serde_json::to_string_pretty(&service.rebalance_all()?)?,
        Command::Reorder { featured, ids } => {
            serde_json::to_string_pretty(&service.reorder_projects(&ids, featured)?)?
        }
        Command::Toggle { id } => serde_json::to_string_pretty(&service.toggle_featured(id)?)?,
    };
    println!("{output}");
    Ok(())
}
