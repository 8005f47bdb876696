//! Print the `name` of the first record with a given id in a JSON array file.
//!
//! Usage:
//!   find_record 42                         # searches data/input.json
//!   find_record 42 --file big.json
//!
//! Prints `Aucune donnée trouvée` when nothing matches; exits non-zero only
//! when the file cannot be read or is not a JSON array.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use canigo_scan::{find_in_file, NOT_FOUND_MESSAGE};

#[derive(Parser)]
#[command(name = "find_record")]
#[command(about = "Find a record by id in a large JSON array without loading it")]
struct Args {
    /// Numeric id to look for
    id: f64,

    /// JSON file holding a top-level array of records
    #[arg(short = 'f', long, default_value = "data/input.json")]
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,canigo_scan=info".into()),
        )
        .init();

    let args = Args::parse();
    let found = find_in_file(&args.file, args.id)
        .with_context(|| format!("scanning {}", args.file.display()))?;

    match found {
        Some(found) => {
            tracing::debug!(index = found.index, "match");
            println!("{}", found.display_name());
        }
        None => println!("{NOT_FOUND_MESSAGE}"),
    }
    Ok(())
}
