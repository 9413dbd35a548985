//! Operator CLI for the molstore structure registry.
//!
//! # Responsibility
//! - Expose core structure operations against a local SQLite file.
//! - Print records as JSON lines for scripting.

use clap::{Parser, Subcommand};
use molstore_core::db::open_db;
use molstore_core::{
    init_logging_from_config, CoreConfig, PageRequest, SqliteStructureRepository,
    StructureFields, StructureId, StructureRecord, StructureService,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "molstore", version, about = "Chemical structure registry")]
struct Cli {
    /// SQLite database path (defaults to MOLSTORE_DB_PATH or molstore.db).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check core linkage.
    Ping,
    /// Add one structure.
    Add {
        notation: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one structure by id.
    Get { id: StructureId },
    /// List one page of structures.
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Delete one structure by id.
    Delete { id: StructureId },
    /// Stored structures contained in the query structure.
    Substructures { notation: String },
    /// Stored structures that contain the query structure.
    Containers { notation: String },
    /// Import a CSV file with `notation` and `name` columns.
    Import { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    init_logging_from_config(&config)?;

    if let Command::Ping = cli.command {
        println!(
            "molstore_core ping={} version={}",
            molstore_core::ping(),
            molstore_core::core_version()
        );
        return Ok(());
    }

    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());
    let conn = open_db(&db_path)?;
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn)?);

    match cli.command {
        Command::Ping => {}
        Command::Add {
            notation,
            name,
            description,
        } => {
            let record = service.create(StructureFields {
                notation,
                name,
                description,
            })?;
            print_record(&record)?;
        }
        Command::Get { id } => print_record(&service.find_by_id(id)?)?,
        Command::List { page, page_size } => {
            let request = match page_size {
                Some(size) => PageRequest::new(page, size),
                None => config.page(page),
            };
            for record in service.find_all(request)? {
                print_record(&record)?;
            }
        }
        Command::Delete { id } => {
            service.delete(id)?;
            log::info!("event=cli_delete module=cli status=ok id={id}");
        }
        Command::Substructures { notation } => {
            for record in service.find_substructure_matches(&notation)? {
                print_record(&record)?;
            }
        }
        Command::Containers { notation } => {
            for record in service.find_container_matches(&notation)? {
                print_record(&record)?;
            }
        }
        Command::Import { path } => {
            let bytes = std::fs::read(&path)?;
            let report = service.import_csv_report(&bytes)?;
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    Ok(())
}

fn print_record(record: &StructureRecord) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}
