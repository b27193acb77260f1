//! Interactive billing terminal.
//!
//! Reads one command per line from stdin until `quit` or end of input.
//! Piping a script works too:
//!
//! ```bash
//! printf 'add 8901 2\ntax on\ngenerate\n' | tally-billing
//! ```

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tally_cli::commands::billing::{BillingSession, Outcome};
use tally_cli::commands::PathArgs;
use tally_cli::logging::init_tracing;
use tally_cli::CliResult;
use tally_store::{ArchiveConfig, BillingEngine, BillsArchive, CsvInventoryFile, InventoryRepository};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Billing terminal for Tally POS.
#[derive(Debug, Parser)]
#[command(name = "tally-billing", version, about = "Build carts and generate bills")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = cli.paths.load_config()?;

    let inventory = InventoryRepository::open(CsvInventoryFile::new(&config.paths.inventory))?;
    let archive = BillsArchive::open(ArchiveConfig::new(&config.paths.bills)).await?;
    let engine = BillingEngine::new(inventory, archive, config.billing_policy());
    let mut session = BillingSession::new(engine, &config);

    print!("{}", session.banner());
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                break;
            }
        };

        match session.handle_line(&line).await {
            Ok(Outcome::Continue(text)) => print!("{}", text),
            Ok(Outcome::Quit) => break,
            Err(err) => eprintln!("Error {}", err),
        }
        prompt();
    }

    if !session.engine().cart().is_empty() {
        info!(lines = session.engine().cart().len(), "Session ended with an unbilled cart");
    }
    session.engine().archive().close().await;
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
