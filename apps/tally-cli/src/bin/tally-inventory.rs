//! Inventory manager.
//!
//! ```bash
//! tally-inventory add --barcode 8901 --name "Rice 1kg" --quantity 10 --price 62.50
//! tally-inventory list rice
//! ```

use std::process::ExitCode;

use clap::Parser;
use tally_cli::commands::inventory::{run, InventoryCli};
use tally_cli::logging::init_tracing;

fn main() -> ExitCode {
    init_tracing();
    let cli = InventoryCli::parse();

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) if cli.json => {
            match serde_json::to_string(&err) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("Error {}", err),
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error {}", err);
            ExitCode::FAILURE
        }
    }
}
