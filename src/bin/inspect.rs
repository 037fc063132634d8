//! blobindex snapshot inspector
//!
//! Validates a partition's index snapshot and prints its contents.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use blobindex::persist::{read_snapshot, Snapshot};
use blobindex::{BlobId, BlobIdFactory, IndexConfig, IndexError};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// blobindex snapshot inspector
#[derive(Parser, Debug)]
#[command(name = "blobindex-inspect")]
#[command(about = "Validate and dump blob index snapshots")]
#[command(version)]
struct Args {
    /// Partition data directory
    #[arg(short, long, default_value = "./blobindex_data")]
    data_dir: PathBuf,

    /// Snapshot file name inside the data directory
    #[arg(short, long, default_value = "index_current")]
    file: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the snapshot decodes and print a summary
    Verify,

    /// Print entries in log offset order
    List {
        /// Only entries at or after this log offset
        #[arg(short, long, default_value = "0")]
        since: u64,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blobindex=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = IndexConfig::builder()
        .data_dir(&args.data_dir)
        .snapshot_file_name(&args.file)
        .build();
    let path = config.snapshot_path();

    let snapshot = match load(&path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Snapshot is not usable");
            std::process::exit(1);
        }
    };

    match args.command {
        Commands::Verify => {
            println!("path:       {}", path.display());
            println!("version:    {}", snapshot.version);
            println!("entries:    {}", snapshot.entries.len());
            println!("end offset: {}", snapshot.end_offset);
        }
        Commands::List { since } => {
            let mut entries: Vec<_> = snapshot
                .entries
                .iter()
                .filter(|(_, v)| v.offset >= since)
                .collect();
            entries.sort_by_key(|(_, v)| v.offset);

            for (key, value) in entries {
                println!(
                    "{} offset={} size={} flags={:#04x} ttl={}",
                    key, value.offset, value.size, value.flags, value.time_to_live
                );
            }
        }
    }
}

fn load(path: &std::path::Path) -> blobindex::Result<Snapshot<BlobId>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IndexError::SnapshotNotFound(path.to_path_buf()),
        _ => IndexError::Io(e),
    })?;
    read_snapshot(BufReader::new(file), &BlobIdFactory)
}
