//! Lending Engine CLI
//!
//! Runs a batch of lend requests against a library stored as CSV files and
//! writes one result row per request.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- library-data/ requests.csv > results.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info` or `debug` to see refusals and payments

use lending_engine::error::AppError;
use lending_engine::{process_requests, CsvLibrary, LendingEngine};
use log::info;
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(AppError::MissingArgument);
    }

    let library = CsvLibrary::open(&args[1])?;
    let reader = BufReader::new(File::open(&args[2])?);

    let engine = LendingEngine::with_system_clock(library);

    let stdout = io::stdout();
    let handle = stdout.lock();
    let summary = process_requests(&engine, reader, handle)?;

    info!(
        "Processed requests: {} lent, {} renewed, {} refused, {} skipped",
        summary.lent, summary.renewed, summary.refused, summary.skipped
    );

    Ok(())
}
