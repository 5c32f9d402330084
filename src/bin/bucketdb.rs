//! bucketdb CLI
//!
//! Builds a hash index from a comma-separated employee file and looks up
//! employees by id.

use std::path::PathBuf;
use std::process::ExitCode;

use bucketdb::common::config::DEFAULT_INDEX_FILE;
use bucketdb::{ingest, HashIndex, IndexConfig, LookupReport, DEFAULT_BUCKET_COUNT};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// bucketdb CLI
#[derive(Parser, Debug)]
#[command(name = "bucketdb")]
#[command(about = "Static hash index over fixed-size pages")]
#[command(version)]
struct Args {
    /// Index data file
    #[arg(short, long, default_value = DEFAULT_INDEX_FILE)]
    index: PathBuf,

    /// Number of hash buckets (fixed for the life of the index)
    #[arg(short, long, default_value_t = DEFAULT_BUCKET_COUNT)]
    buckets: usize,

    /// fsync after every page write
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the index from a CSV file, then look up ids
    Run {
        /// Employee CSV file (id,name,bio,manager_id)
        #[arg(short, long)]
        csv: PathBuf,

        /// Ids to look up
        ids: Vec<i32>,
    },

    /// Rebuild the index from a CSV file and save its directory
    Build {
        /// Employee CSV file (id,name,bio,manager_id)
        #[arg(short, long)]
        csv: PathBuf,
    },

    /// Look up ids in an index saved by `build`
    Lookup {
        /// Ids to look up
        #[arg(required = true)]
        ids: Vec<i32>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> bucketdb::Result<()> {
    let persist = !matches!(args.command, Commands::Run { .. });
    let config = IndexConfig::builder()
        .path(&args.index)
        .bucket_count(args.buckets)
        .sync_writes(args.sync)
        .persist_directory(persist)
        .build();

    match args.command {
        Commands::Run { csv, ids } => {
            let mut index = HashIndex::open(config)?;
            let summary = ingest::load_csv_path(&mut index, &csv)?;
            println!("{}", summary.pages);
            report(&index, &ids)?;
            index.close()
        }
        Commands::Build { csv } => {
            if config.directory_path().exists() {
                std::fs::remove_file(config.directory_path())?;
            }
            let mut index = HashIndex::open(config)?;
            let summary = ingest::load_csv_path(&mut index, &csv)?;
            println!(
                "Indexed {} records into {} pages",
                summary.records, summary.pages
            );
            index.close()
        }
        Commands::Lookup { ids } => {
            if !config.directory_path().exists() {
                return Err(bucketdb::Error::Config(format!(
                    "no saved directory for {}; run `build` first",
                    config.path.display()
                )));
            }
            let index = HashIndex::open(config)?;
            report(&index, &ids)
        }
    }
}

fn report(index: &HashIndex, ids: &[i32]) -> bucketdb::Result<()> {
    for &id in ids {
        let record = index.lookup(id)?;
        println!("{}", LookupReport::new(id, record.as_ref()));
    }
    Ok(())
}
