use clap::Parser;
use csvloader::cli::{args::Args, commands};
use csvloader::constants::exit_codes;
use std::process;

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(exit_codes::FATAL);
    });

    let result = runtime.block_on(commands::run(args));

    match result {
        Ok(summary) if summary.aborted => {
            // Partial progress was reported accurately; the distinct status
            // lets automation tell an aborted run from a clean one
            process::exit(exit_codes::ABORTED);
        }
        Ok(_) => {
            process::exit(exit_codes::SUCCESS);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(exit_codes::FATAL);
        }
    }
}
