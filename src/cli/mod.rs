//! Command line interface
//!
//! Every command but `init` seeds a fresh order collection from the
//! configuration, then works against it:
//!
//! ```text
//! gridbind query --request request.json   # one read, printed as JSON
//! gridbind run --script ops.jsonl         # JSON-lines batch, one result per line
//! gridbind dump                           # the seeded collection
//! gridbind init                           # write a default gridbind.toml
//! ```
//!
//! JSON goes to stdout; status and logs go to stderr.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use gridbind_core::QueryRequest;

use crate::adaptor::GridAdaptor;
use crate::batch::run_script;
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::order::Order;
use crate::seed::seed_orders;

#[derive(Parser, Debug)]
#[command(name = "gridbind")]
#[command(about = "In-memory query engine for grid data binding", long_about = None)]
pub struct CliArgs {
    /// Directory holding gridbind.toml and .env
    #[arg(long, global = true, default_value = ".")]
    pub config: PathBuf,

    /// Number of synthetic orders to seed
    #[arg(long, global = true)]
    pub seed_count: Option<usize>,

    /// Fixed RNG seed for reproducible customer codes
    #[arg(long, global = true)]
    pub rng_seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one read request and print the result
    Query {
        /// Request JSON file, or '-' for stdin (default: empty request)
        #[arg(long, short)]
        request: Option<PathBuf>,
    },

    /// Run a JSON-lines script of operations
    Run {
        /// Script file, or '-' for stdin
        #[arg(long, short)]
        script: PathBuf,
    },

    /// Print the seeded collection
    Dump,

    /// Write a default gridbind.toml into the config directory
    Init,
}

pub fn execute(args: CliArgs) -> anyhow::Result<()> {
    match &args.command {
        Command::Query { request } => cmd_query(&seeded(&args)?, request.as_deref()),
        Command::Run { script } => cmd_run(&seeded(&args)?, script),
        Command::Dump => cmd_dump(&seeded(&args)?),
        Command::Init => cmd_init(&args.config),
    }
}

fn seeded(args: &CliArgs) -> anyhow::Result<GridAdaptor<Order>> {
    build_adaptor(&load_config(args)?)
}

/// Config file and environment, then command line flags on top.
pub fn load_config(args: &CliArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(&args.config)?;
    if let Some(count) = args.seed_count {
        config.seed.count = count;
    }
    if let Some(seed) = args.rng_seed {
        config.seed.rng_seed = Some(seed);
    }
    Ok(config)
}

pub fn build_adaptor(config: &Config) -> anyhow::Result<GridAdaptor<Order>> {
    let orders = seed_orders(&config.seed);
    Ok(GridAdaptor::with_records(orders, config.engine.clone())?)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_request(path: Option<&Path>) -> anyhow::Result<QueryRequest> {
    let content = match path {
        None => return Ok(QueryRequest::default()),
        Some(p) if is_stdin(p) => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| anyhow::anyhow!("{}: {}", p.display(), e))?,
    };

    if content.trim().is_empty() {
        return Ok(QueryRequest::default());
    }
    Ok(serde_json::from_str(&content)?)
}

fn cmd_query(adaptor: &GridAdaptor<Order>, path: Option<&Path>) -> anyhow::Result<()> {
    let request = read_request(path)?;
    let value = adaptor.read(&request)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_run(adaptor: &GridAdaptor<Order>, path: &Path) -> anyhow::Result<()> {
    let results = if is_stdin(path) {
        run_script(adaptor, io::stdin().lock())
    } else {
        let file = File::open(path).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        run_script(adaptor, BufReader::new(file))
    };

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return Err(e.into());
        }
    };

    for value in &results {
        println!("{}", serde_json::to_string(value)?);
    }
    eprintln!(
        "{} {} operation(s), {} record(s) remaining",
        "✓".green(),
        results.len(),
        adaptor.len()
    );
    Ok(())
}

/// Initialize a config directory
fn cmd_init(dir: &Path) -> anyhow::Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}\nRemove it first if you want to reinitialize.",
            config_path.display()
        );
    }

    Config::default().save(dir)?;
    eprintln!("{} Created {}", "✓".green(), config_path.display());
    Ok(())
}

fn cmd_dump(adaptor: &GridAdaptor<Order>) -> anyhow::Result<()> {
    let records = adaptor.records();
    println!("{}", serde_json::to_string_pretty(&records)?);
    eprintln!("{} {} record(s)", "•".dimmed(), records.len());
    Ok(())
}
