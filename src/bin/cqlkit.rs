//! cqlkit: offline CQL statement compiler
//!
//! Reads table schemas from a TOML catalog file and prints the statements
//! they produce. Nothing is sent to a cluster.
//!
//! # Usage
//!
//! ```bash
//! # List configured tables with their definitions
//! cqlkit tables
//!
//! # CREATE TABLE for one table
//! cqlkit create users --if-not-exists
//!
//! # INSERT a JSON record, with a TTL
//! cqlkit insert users '{"id": "...", "username": "frodo"}' --ttl 3600
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use cqlkit::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cqlkit")]
#[command(version)]
#[command(about = "Compile schema-checked CQL statements", long_about = None)]
#[command(after_help = "EXAMPLES:
    cqlkit tables
    cqlkit create users --if-not-exists
    cqlkit find users '{\"username\": \"frodo\"}'")]
struct Cli {
    /// Catalog file with [tables.<name>] sections
    #[arg(short, long, env = "CQLKIT_CONFIG", default_value = "cqlkit.toml")]
    config: PathBuf,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured tables and their definitions
    Tables,
    /// Print the CREATE TABLE statement for a table
    Create {
        table: String,
        #[arg(long)]
        if_not_exists: bool,
    },
    /// Print the INSERT statement for a JSON record
    Insert {
        table: String,
        /// JSON object of column values
        record: String,
        /// Expire the row after this many seconds
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Print the SELECT statement matching every field of a JSON record
    Find { table: String, record: String },
    /// Check a JSON record against a table schema
    Validate { table: String, record: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::from_file(&cli.config)
        .with_context(|| format!("reading {}", cli.config.display()))?;
    let mut catalog = Catalog::from_config(&config)?;

    match &cli.command {
        Commands::Tables => {
            let tables = catalog.tables();
            if tables.is_empty() {
                println!("{}", "(no tables configured)".dimmed());
            }
            for table in tables {
                println!("{}", table.name().cyan().bold());
                println!("  {}", table.create(false)?.to_cql().white());
            }
        }
        Commands::Create {
            table,
            if_not_exists,
        } => {
            let table = catalog.table(table, None)?;
            println!("{}", table.create(*if_not_exists)?);
        }
        Commands::Insert { table, record, ttl } => {
            let model = model_for(&mut catalog, table)?;
            println!("{}", model.save(parse_record(record)?, *ttl)?);
        }
        Commands::Find { table, record } => {
            let model = model_for(&mut catalog, table)?;
            println!("{}", model.find(parse_record(record)?)?);
        }
        Commands::Validate { table, record } => {
            let table = catalog.table(table, None)?;
            table.schema().validate(parse_record(record)?)?;
            println!("{} record is valid for {}", "✓".green(), table.name().cyan());
        }
    }

    Ok(())
}

fn model_for(catalog: &mut Catalog, table: &str) -> Result<Model> {
    let bound = catalog.table(table, None)?;
    Ok(catalog.model(table, Some(bound))?)
}

fn parse_record(json: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
    serde_json::from_str(json).context("record must be a JSON object")
}
