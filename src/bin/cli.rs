//! tracewal CLI
//!
//! Seal, list, scan and query WAL blocks on local disk.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracewal::{Config, ReplayBlock, Result, TraceWalError, Wal};
use tracing_subscriber::{fmt, EnvFilter};

/// tracewal CLI
#[derive(Parser, Debug)]
#[command(name = "tracewal-cli")]
#[command(about = "Inspect and manage sealed WAL blocks")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./tracewal_data")]
    data_dir: String,

    /// Objects per indexed chunk
    #[arg(long, default_value = "100")]
    downsample: usize,

    /// Bloom filter false positive rate
    #[arg(long, default_value = "0.01")]
    bloom_fp: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal objects from a file into a new block
    Seal {
        /// Tenant owning the block
        #[arg(short, long)]
        tenant: String,

        /// Input file of `id<TAB>payload` lines
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List blocks in the data directory
    List,

    /// Print every object of one block
    Scan {
        /// Block file name (`{blockID}:{tenantID}`)
        block: String,
    },

    /// Seal objects from a file and look one up by id
    Find {
        /// Tenant owning the block
        #[arg(short, long)]
        tenant: String,

        /// Input file of `id<TAB>payload` lines
        #[arg(short, long)]
        input: PathBuf,

        /// The id to look up
        id: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tracewal=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .index_downsample(args.downsample)
        .bloom_false_positive_rate(args.bloom_fp)
        .build();

    let wal = Wal::open(config)?;

    match args.command {
        Commands::Seal { tenant, input } => {
            let block = wal.seal(tenant, read_objects(&input)?)?;
            let info = block.write_info();

            println!("block_id: {}", info.block_id);
            println!("tenant_id: {}", info.tenant_id);
            println!("path: {}", info.path.display());
            println!("objects: {}", block.meta().total_objects);
            println!("records: {}", info.records.len());
            for record in info.records {
                println!(
                    "  {} start={} length={}",
                    String::from_utf8_lossy(&record.id),
                    record.start,
                    record.length
                );
            }
        }
        Commands::List => {
            for block in wal.replay_blocks()? {
                println!("{}  tenant={}", block.block_id(), block.tenant_id());
            }
        }
        Commands::Scan { block } => {
            let found = wal
                .replay_blocks()?
                .into_iter()
                .find(|b| b.full_filename().file_name().and_then(|n| n.to_str()) == Some(block.as_str()))
                .ok_or_else(|| TraceWalError::InvalidBlockName(format!("no such block: {}", block)))?;

            let mut count = 0u64;
            for object in found.iter()? {
                let (id, payload) = object?;
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&id),
                    String::from_utf8_lossy(&payload)
                );
                count += 1;
            }
            tracing::info!("scanned {} objects", count);
        }
        Commands::Find { tenant, input, id } => {
            let block = wal.seal(tenant, read_objects(&input)?)?;
            let result = block.find(id.as_bytes());
            block.clear()?;

            match result? {
                Some(payload) => println!("{}", String::from_utf8_lossy(&payload)),
                None => println!("(not found)"),
            }
        }
    }

    Ok(())
}

/// Parse `id<TAB>payload` lines, skipping blank ones
fn read_objects(path: &Path) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let content = fs::read_to_string(path)?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            line.split_once('\t')
                .map(|(id, payload)| (id.as_bytes().to_vec(), payload.as_bytes().to_vec()))
                .ok_or_else(|| {
                    TraceWalError::Config(format!(
                        "{}:{}: expected `id<TAB>payload`",
                        path.display(),
                        n + 1
                    ))
                })
        })
        .collect()
}
