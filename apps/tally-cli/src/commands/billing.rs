//! # Billing Session
//!
//! Interactive cart over a [`BillingEngine`], one command per line.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Session                                  │
//! │                                                                         │
//! │   stdin line ──► parse_command ──► BillingSession::execute              │
//! │                                         │                               │
//! │        ┌────────────────────────────────┼──────────────────────┐        │
//! │        ▼                ▼               ▼                      ▼        │
//! │   add / search     cart / total     generate            export/backup   │
//! │   (reload file)    (in memory)      (archive + stock)   (files)         │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                              Outcome::Continue(text)                    │
//! │                              Outcome::Quit                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed command prints its error and the session carries on with the
//! cart as it was.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tally_core::validation::validate_search_query;
use tally_store::{backup_file, export_bill_csv, BillingEngine, InventoryBackend};
use tracing::debug;

use super::{format_bill_rows, format_inventory, render_table};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Text printed by `help`.
pub const HELP: &str = "\
Commands:
  add [BARCODE] [QTY]      Add to cart (bare `add` uses the last single search match)
  search QUERY             Find items by barcode or name
  cart                     Show the cart
  tax on|off               Include or exclude tax
  total                    Show subtotal, tax and grand total
  generate                 Finalize the cart into an archived bill
  export PATH              Write the cart as a bill CSV
  show-bill SHEET          Print an archived bill
  export-bill SHEET PATH   Write an archived bill as CSV
  backup PATH              Copy the bills archive
  bills                    List archived bills
  clear                    Empty the cart
  help                     Show this help
  quit                     Leave the session
";

// =============================================================================
// Command Parsing
// =============================================================================

/// One input line. Multicall makes the first word the subcommand name.
#[derive(Debug, Parser)]
#[command(multicall = true, disable_help_subcommand = true)]
struct SessionLine {
    #[command(subcommand)]
    command: BillingCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Session commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum BillingCommand {
    /// Add to cart
    Add {
        barcode: Option<String>,

        #[arg(default_value_t = 1, allow_hyphen_values = true)]
        quantity: i64,
    },

    /// Find items by barcode or name
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show the cart
    Cart,

    /// Include or exclude tax
    Tax {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Show totals
    Total,

    /// Finalize the cart
    Generate,

    /// Write the cart as a bill CSV
    Export { path: PathBuf },

    /// Print an archived bill
    ShowBill { sheet: String },

    /// Write an archived bill as CSV
    ExportBill { sheet: String, path: PathBuf },

    /// Copy the bills archive
    Backup { path: PathBuf },

    /// List archived bills
    Bills,

    /// Empty the cart
    Clear,

    /// Show help
    Help,

    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> CliResult<Option<BillingCommand>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    match SessionLine::try_parse_from(words) {
        Ok(parsed) => Ok(Some(parsed.command)),
        Err(err) => Err(CliError::usage(
            err.to_string()
                .lines()
                .next()
                .unwrap_or("invalid command")
                .trim_start_matches("error: ")
                .to_string()
                + " (type `help` for commands)",
        )),
    }
}

// =============================================================================
// Session
// =============================================================================

/// Result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

/// Interactive billing state on top of the engine.
pub struct BillingSession<B> {
    engine: BillingEngine<B>,
    apply_tax: bool,
    remembered: Option<String>,
    currency: String,
    store_name: String,
}

impl<B: InventoryBackend> BillingSession<B> {
    /// Tax starts off; `tax on` enables it.
    pub fn new(engine: BillingEngine<B>, config: &AppConfig) -> Self {
        BillingSession {
            engine,
            apply_tax: false,
            remembered: None,
            currency: config.billing.currency_symbol.clone(),
            store_name: config.store.name.clone(),
        }
    }

    pub fn engine(&self) -> &BillingEngine<B> {
        &self.engine
    }

    pub fn apply_tax(&self) -> bool {
        self.apply_tax
    }

    /// Barcode a bare `add` will use.
    pub fn remembered_barcode(&self) -> Option<&str> {
        self.remembered.as_deref()
    }

    pub fn banner(&self) -> String {
        format!(
            "{} - Billing\nInventory: {}\nBills:     {}\nType `help` for commands.\n",
            self.store_name,
            self.engine.inventory().backend().location(),
            self.engine.archive().path().display()
        )
    }

    /// Parses and runs one input line.
    pub async fn handle_line(&mut self, line: &str) -> CliResult<Outcome> {
        match parse_command(line)? {
            Some(command) => self.execute(command).await,
            None => Ok(Outcome::Continue(String::new())),
        }
    }

    pub async fn execute(&mut self, command: BillingCommand) -> CliResult<Outcome> {
        debug!(?command, "Billing command");

        let text = match command {
            BillingCommand::Add { barcode, quantity } => {
                let barcode = barcode
                    .or_else(|| self.remembered.clone())
                    .ok_or_else(|| CliError::validation("Barcode is required"))?;
                let line = self.engine.add_item(&barcode, quantity)?;
                format!(
                    "Added {} x {} ({})\n{}",
                    line.quantity,
                    line.name,
                    line.line_total().with_symbol(&self.currency),
                    self.total_line()
                )
            }

            BillingCommand::Search { query } => {
                let query = validate_search_query(&query.join(" "))?;
                let matches = self.engine.search_inventory(&query)?;
                self.remembered = match matches.items() {
                    [only] => Some(only.barcode.clone()),
                    _ => None,
                };
                let mut text = format_inventory(&matches, &self.currency);
                if let Some(barcode) = &self.remembered {
                    text.push_str(&format!("`add` will use {}\n", barcode));
                }
                text
            }

            BillingCommand::Cart => self.render_cart(),

            BillingCommand::Tax { state } => {
                self.apply_tax = state == Toggle::On;
                format!(
                    "{} {}\n{}",
                    self.engine.tax_label(),
                    if self.apply_tax { "included" } else { "excluded" },
                    self.total_line()
                )
            }

            BillingCommand::Total => {
                let totals = self.engine.totals(self.apply_tax);
                format!(
                    "Subtotal:    {}\n{}: {}\nGrand Total: {}\n",
                    totals.subtotal.with_symbol(&self.currency),
                    self.engine.tax_label(),
                    totals.tax.with_symbol(&self.currency),
                    totals.grand_total.with_symbol(&self.currency)
                )
            }

            BillingCommand::Generate => {
                let generated = self.engine.generate_bill(self.apply_tax).await?;
                format!(
                    "Bill generated successfully!\nBill ID: {}\nSheet:   {}\nGrand Total: {}\n",
                    generated.bill.id,
                    generated.sheet_name,
                    generated.bill.totals.grand_total.with_symbol(&self.currency)
                )
            }

            BillingCommand::Export { path } => {
                let rows = self.engine.export_cart_csv(&path, self.apply_tax)?;
                format!("Bill exported to {} ({} rows)\n", path.display(), rows)
            }

            BillingCommand::ShowBill { sheet } => {
                let archived = self.engine.archive().read_sheet(&sheet).await?;
                let mut text = String::new();
                for cell in &archived.cells {
                    text.push_str(&format!("{} {}\n", cell.label, cell.value));
                }
                text + &format_bill_rows(&archived.rows)
            }

            BillingCommand::ExportBill { sheet, path } => {
                let archived = self.engine.archive().read_sheet(&sheet).await?;
                let rows = export_bill_csv(&archived.rows, &path)?;
                format!("{} exported to {} ({} rows)\n", sheet, path.display(), rows)
            }

            BillingCommand::Backup { path } => {
                let bytes = backup_file(self.engine.archive().path(), &path)?;
                format!("Bills archive backed up to {} ({} bytes)\n", path.display(), bytes)
            }

            BillingCommand::Bills => self.render_bills().await?,

            BillingCommand::Clear => {
                self.engine.clear_cart();
                "Cart cleared.\n".to_string()
            }

            BillingCommand::Help => HELP.to_string(),

            BillingCommand::Quit => return Ok(Outcome::Quit),
        };

        Ok(Outcome::Continue(text))
    }

    /// "Total: ₹25.00" or "Total (GST included): ₹29.50"
    fn total_line(&self) -> String {
        let totals = self.engine.totals(self.apply_tax);
        let amount = totals.grand_total.with_symbol(&self.currency);
        if self.apply_tax {
            format!("Total ({} included): {}\n", self.engine.policy().tax_name, amount)
        } else {
            format!("Total: {}\n", amount)
        }
    }

    fn render_cart(&self) -> String {
        let cart = self.engine.cart();
        if cart.is_empty() {
            return format!("Cart is empty.\n{}", self.total_line());
        }
        let rows: Vec<[String; 4]> = cart
            .lines()
            .iter()
            .map(|line| {
                [
                    line.barcode.clone(),
                    line.name.clone(),
                    line.quantity.to_string(),
                    line.line_total().with_symbol(&self.currency),
                ]
            })
            .collect();
        format!(
            "Cart since {} ({} units)\n{}{}",
            cart.created_at().format("%H:%M:%S"),
            cart.total_quantity(),
            render_table(["Barcode", "Name", "Qty", "Price"], &rows),
            self.total_line()
        )
    }

    async fn render_bills(&self) -> CliResult<String> {
        let sheets = self.engine.archive().list_sheets().await?;
        if sheets.is_empty() {
            return Ok("No bills yet.\n".to_string());
        }
        let rows: Vec<[String; 4]> = sheets
            .iter()
            .map(|sheet| {
                [
                    sheet.name.clone(),
                    sheet.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    sheet.tax().with_symbol(&self.currency),
                    sheet.grand_total().with_symbol(&self.currency),
                ]
            })
            .collect();
        Ok(render_table(["Sheet", "Created", "Tax", "Grand Total"], &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_core::{InventoryTable, Money};
    use tally_store::{
        ArchiveConfig, BillingPolicy, BillsArchive, InventoryRepository, MemoryBackend,
    };

    async fn session() -> (BillingSession<MemoryBackend>, MemoryBackend) {
        let mut table = InventoryTable::new();
        table
            .upsert("B1", "Rice 1kg", 10, Money::from_cents(1000))
            .unwrap();
        table
            .upsert("B2", "Iodized Salt", 5, Money::from_cents(500))
            .unwrap();
        let backend = MemoryBackend::new(table);
        let repo = InventoryRepository::open(backend.clone()).unwrap();
        let archive = BillsArchive::open(ArchiveConfig::in_memory()).await.unwrap();
        let engine = BillingEngine::new(repo, archive, BillingPolicy::default());
        (BillingSession::new(engine, &AppConfig::default()), backend)
    }

    fn text(outcome: Outcome) -> String {
        match outcome {
            Outcome::Continue(text) => text,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(
            parse_command("add B1 3").unwrap(),
            Some(BillingCommand::Add {
                barcode: Some("B1".into()),
                quantity: 3
            })
        );
        assert_eq!(
            parse_command("add").unwrap(),
            Some(BillingCommand::Add {
                barcode: None,
                quantity: 1
            })
        );
        assert_eq!(
            parse_command("search iodized salt").unwrap(),
            Some(BillingCommand::Search {
                query: vec!["iodized".into(), "salt".into()]
            })
        );
        assert_eq!(
            parse_command("tax on").unwrap(),
            Some(BillingCommand::Tax { state: Toggle::On })
        );
        assert_eq!(parse_command("exit").unwrap(), Some(BillingCommand::Quit));
    }

    #[test]
    fn test_parse_errors_are_usage() {
        let err = parse_command("frobnicate").unwrap_err();
        assert_eq!(err.code, ErrorCode::Usage);

        let err = parse_command("add B1 lots").unwrap_err();
        assert_eq!(err.code, ErrorCode::Usage);

        assert!(parse_command("tax maybe").is_err());
    }

    #[tokio::test]
    async fn test_add_and_cart_view() {
        let (mut session, _) = session().await;

        session.handle_line("add B1 2").await.unwrap();
        session.handle_line("add B2").await.unwrap();

        let out = text(session.handle_line("cart").await.unwrap());
        assert!(out.contains("Rice 1kg"));
        assert!(out.contains("₹20.00"));
        assert!(out.ends_with("Total: ₹25.00\n"));

        assert!(out.contains("(3 units)"));

        let out = text(session.handle_line("tax on").await.unwrap());
        assert!(session.apply_tax());
        assert!(out.contains("Total (GST included): ₹29.50"));

        let out = text(session.handle_line("total").await.unwrap());
        assert!(out.contains("GST (18%): ₹4.50"));
    }

    #[tokio::test]
    async fn test_failed_add_keeps_cart() {
        let (mut session, _) = session().await;
        session.handle_line("add B1 1").await.unwrap();

        let err = session.handle_line("add NOPE").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = session.handle_line("add B2 6").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = session.handle_line("add B2 0").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert_eq!(session.engine().cart().len(), 1);
    }

    #[tokio::test]
    async fn test_search_remembers_single_match() {
        let (mut session, _) = session().await;

        let err = session.handle_line("add").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let out = text(session.handle_line("search SALT").await.unwrap());
        assert!(out.contains("`add` will use B2"));
        assert_eq!(session.remembered_barcode(), Some("B2"));

        session.handle_line("add").await.unwrap();
        assert_eq!(session.engine().cart().quantity_of("B2"), 1);

        session.handle_line("search B").await.unwrap();
        assert_eq!(session.remembered_barcode(), None);
    }

    #[tokio::test]
    async fn test_generate_and_list_bills() {
        let (mut session, backend) = session().await;

        let err = session.handle_line("generate").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(err.message, "Cart is empty!");

        session.handle_line("add B1 2").await.unwrap();
        session.handle_line("tax on").await.unwrap();
        let out = text(session.handle_line("generate").await.unwrap());
        assert!(out.starts_with("Bill generated successfully!"));
        assert!(out.contains("₹23.60"));
        assert!(session.engine().cart().is_empty());
        assert_eq!(backend.snapshot().unwrap().find("B1").unwrap().quantity, 8);

        let out = text(session.handle_line("bills").await.unwrap());
        assert!(out.contains("Bill_"));
        assert!(out.contains("₹23.60"));

        let sheet = session.engine().archive().list_sheets().await.unwrap()[0]
            .name
            .clone();
        let out = text(session.handle_line(&format!("show-bill {}", sheet)).await.unwrap());
        assert!(out.starts_with("Bill ID: "));
        assert!(out.contains("GST (18%)"));
        assert!(out.contains("23.60"));
    }

    #[tokio::test]
    async fn test_generate_retries_stock_update_without_rearchiving() {
        let (mut session, backend) = session().await;
        session.handle_line("add B1 2").await.unwrap();

        backend.set_fail_saves(true);
        let err = session.handle_line("generate").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BillGeneration);
        assert!(err.message.contains("generate again"));
        assert!(session.engine().cart().is_empty());

        backend.set_fail_saves(false);
        let out = text(session.handle_line("generate").await.unwrap());
        assert!(out.starts_with("Bill generated successfully!"));
        assert_eq!(session.engine().archive().sheet_count().await.unwrap(), 1);
        assert_eq!(backend.snapshot().unwrap().find("B1").unwrap().quantity, 8);
    }

    #[tokio::test]
    async fn test_export_cart_and_archived_bill() {
        let (mut session, _) = session().await;
        let dir = tempfile::tempdir().unwrap();

        let err = session
            .handle_line(&format!("export {}", dir.path().join("empty.csv").display()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        session.handle_line("add B2 2").await.unwrap();
        let cart_csv = dir.path().join("cart.csv");
        session
            .handle_line(&format!("export {}", cart_csv.display()))
            .await
            .unwrap();
        let written = std::fs::read_to_string(&cart_csv).unwrap();
        assert!(written.starts_with("Barcode,Name,Qty,Unit Price,Total"));
        assert!(written.contains(",,,Grand Total,10.00"));

        session.handle_line("generate").await.unwrap();
        let sheet = session.engine().archive().list_sheets().await.unwrap()[0]
            .name
            .clone();
        let bill_csv = dir.path().join("bill.csv");
        session
            .handle_line(&format!("export-bill {} {}", sheet, bill_csv.display()))
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&bill_csv)
            .unwrap()
            .contains("B2,Iodized Salt,2,5.00,10.00"));

        let err = session
            .handle_line(&format!("export-bill Bill_missing {}", bill_csv.display()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_clear_help_quit() {
        let (mut session, _) = session().await;
        session.handle_line("add B1").await.unwrap();

        session.handle_line("clear").await.unwrap();
        assert!(session.engine().cart().is_empty());

        let out = text(session.handle_line("help").await.unwrap());
        assert!(out.contains("generate"));

        assert_eq!(session.handle_line("quit").await.unwrap(), Outcome::Quit);
    }
}
