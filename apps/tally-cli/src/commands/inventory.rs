//! # Inventory Manager Commands
//!
//! One-shot subcommands over the inventory file.
//!
//! ## Commands
//! ```text
//! tally-inventory add --barcode 8901 --name "Rice 1kg" --quantity 10 --price 62.50
//! tally-inventory delete 8901
//! tally-inventory list [rice] [--json]
//! tally-inventory show 8901
//! tally-inventory export ./rice.csv --query rice
//! tally-inventory backup ./backup/inventory.csv
//! tally-inventory init-config
//! ```
//!
//! `add` on an existing barcode adds to its quantity and replaces its price.
//! Editing a row is the same operation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tally_core::validation::validate_search_query;
use tally_core::{InventoryItem, InventoryTable, ItemForm, UpsertOutcome};
use tally_store::{backup_file, export_inventory_csv, InventoryBackend, InventoryRepository};

use super::{format_inventory, PathArgs};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Inventory manager for Tally POS.
#[derive(Debug, Parser)]
#[command(name = "tally-inventory", version, about = "Manage the Tally POS inventory file")]
pub struct InventoryCli {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Print listings and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: InventoryCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum InventoryCommand {
    /// Add an item, or add stock to an existing barcode
    Add {
        #[arg(long)]
        barcode: String,

        #[arg(long)]
        name: String,

        /// Units to add (1 - 100000)
        #[arg(long, allow_hyphen_values = true)]
        quantity: String,

        /// Unit price, e.g. 62.50
        #[arg(long, allow_hyphen_values = true)]
        price: String,
    },

    /// Delete every row with this barcode
    Delete { barcode: String },

    /// List items, optionally filtered by barcode or name
    List { query: Option<String> },

    /// Show one item
    Show { barcode: String },

    /// Export the (filtered) inventory to a CSV file
    Export {
        path: PathBuf,

        #[arg(long)]
        query: Option<String>,
    },

    /// Copy the inventory file to another location
    Backup { path: PathBuf },

    /// Write a config file with the current settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// JSON view of an item with a decimal price.
#[derive(Debug, Serialize)]
struct ItemView<'a> {
    barcode: &'a str,
    name: &'a str,
    quantity: i64,
    price: String,
}

impl<'a> From<&'a InventoryItem> for ItemView<'a> {
    fn from(item: &'a InventoryItem) -> Self {
        ItemView {
            barcode: &item.barcode,
            name: &item.name,
            quantity: item.quantity,
            price: item.price.to_string(),
        }
    }
}

/// Loads config, opens the inventory file and runs the command.
pub fn run(cli: &InventoryCli) -> CliResult<String> {
    if let InventoryCommand::InitConfig { force } = cli.command {
        return init_config(&cli.paths, force);
    }

    let config = cli.paths.load_config()?;
    let mut repo = InventoryRepository::open(tally_store::CsvInventoryFile::new(
        &config.paths.inventory,
    ))?;
    execute(&mut repo, &cli.command, &config, cli.json)
}

/// Runs a command against an open repository.
pub fn execute<B: InventoryBackend>(
    repo: &mut InventoryRepository<B>,
    command: &InventoryCommand,
    config: &AppConfig,
    json: bool,
) -> CliResult<String> {
    let currency = &config.billing.currency_symbol;

    match command {
        InventoryCommand::Add {
            barcode,
            name,
            quantity,
            price,
        } => {
            let form = ItemForm::parse(barcode, name, quantity, price)?;
            let outcome = repo.upsert(&form)?;
            let item = repo
                .table()
                .find(form.barcode())
                .ok_or_else(|| CliError::internal("Saved item missing from inventory"))?;
            let verb = match outcome {
                UpsertOutcome::Inserted => "Added",
                UpsertOutcome::Updated => "Updated",
            };
            Ok(format!(
                "{} {} ({}): stock {}, price {}\n",
                verb,
                item.barcode,
                item.name,
                item.quantity,
                item.price.with_symbol(currency)
            ))
        }

        InventoryCommand::Delete { barcode } => {
            let removed = repo.delete(barcode.trim())?;
            if removed == 0 {
                Ok(format!("No item with barcode {}; nothing deleted\n", barcode.trim()))
            } else {
                Ok(format!("Deleted {} ({} row(s))\n", barcode.trim(), removed))
            }
        }

        InventoryCommand::List { query } => {
            let table = filtered(repo, query.as_deref())?;
            if json {
                render_json(&table)
            } else {
                Ok(format_inventory(&table, currency))
            }
        }

        InventoryCommand::Show { barcode } => {
            let item = repo
                .table()
                .find(barcode.trim())
                .ok_or_else(|| CliError::not_found("Item", barcode.trim()))?;
            if json {
                Ok(serde_json::to_string_pretty(&ItemView::from(item))? + "\n")
            } else {
                Ok(format!(
                    "Barcode:  {}\nName:     {}\nQuantity: {}\nPrice:    {}\n",
                    item.barcode,
                    item.name,
                    item.quantity,
                    item.price.with_symbol(currency)
                ))
            }
        }

        InventoryCommand::Export { path, query } => {
            let table = filtered(repo, query.as_deref())?;
            let written = export_inventory_csv(&table, path)?;
            Ok(format!("Exported {} item(s) to {}\n", written, path.display()))
        }

        InventoryCommand::Backup { path } => {
            let bytes = backup_file(&config.paths.inventory, path)?;
            Ok(format!(
                "Backed up {} to {} ({} bytes)\n",
                config.paths.inventory.display(),
                path.display(),
                bytes
            ))
        }

        InventoryCommand::InitConfig { force } => init_config_with(config, None, *force),
    }
}

fn filtered<B: InventoryBackend>(
    repo: &InventoryRepository<B>,
    query: Option<&str>,
) -> CliResult<InventoryTable> {
    match query {
        Some(query) => Ok(repo.search(&validate_search_query(query)?)),
        None => Ok(repo.table().clone()),
    }
}

fn render_json(table: &InventoryTable) -> CliResult<String> {
    let items: Vec<ItemView<'_>> = table.iter().map(ItemView::from).collect();
    Ok(serde_json::to_string_pretty(&items)? + "\n")
}

fn init_config(paths: &PathArgs, force: bool) -> CliResult<String> {
    let config = paths.load_config()?;
    init_config_with(&config, paths.config.clone(), force)
}

fn init_config_with(config: &AppConfig, target: Option<PathBuf>, force: bool) -> CliResult<String> {
    let target = target
        .or_else(AppConfig::default_config_path)
        .ok_or_else(|| CliError::internal("No config directory available"))?;

    if target.exists() && !force {
        return Err(CliError::validation(format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        )));
    }

    let written = config.save(Some(target.as_path()))?;
    Ok(format!("Wrote {}\n", written.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_core::Money;
    use tally_store::MemoryBackend;

    fn repo_with_rice() -> InventoryRepository<MemoryBackend> {
        let mut table = InventoryTable::new();
        table
            .upsert("B1", "Rice 1kg", 10, Money::from_cents(6250))
            .unwrap();
        table
            .upsert("B2", "Iodized Salt", 5, Money::from_cents(2000))
            .unwrap();
        InventoryRepository::open(MemoryBackend::new(table)).unwrap()
    }

    fn add(barcode: &str, name: &str, quantity: &str, price: &str) -> InventoryCommand {
        InventoryCommand::Add {
            barcode: barcode.into(),
            name: name.into(),
            quantity: quantity.into(),
            price: price.into(),
        }
    }

    #[test]
    fn test_add_new_and_existing() {
        let mut repo = repo_with_rice();
        let config = AppConfig::default();

        let out = execute(&mut repo, &add("B3", "Sugar", "4", "45"), &config, false).unwrap();
        assert!(out.starts_with("Added B3 (Sugar): stock 4, price ₹45.00"));

        let out = execute(&mut repo, &add("B1", "Other", "5", "60.00"), &config, false).unwrap();
        assert!(out.starts_with("Updated B1 (Rice 1kg): stock 15, price ₹60.00"));
        assert_eq!(repo.backend().snapshot().unwrap().find("B1").unwrap().quantity, 15);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut repo = repo_with_rice();
        let config = AppConfig::default();

        let err = execute(&mut repo, &add("B3", "Sugar", "0", "45"), &config, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = execute(&mut repo, &add("B3", "Sugar", "2", "abc"), &config, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = execute(&mut repo, &add("", "Sugar", "2", "1"), &config, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = execute(&mut repo, &add("AB 12", "Sugar", "2", "1"), &config, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(repo.table().len(), 2);
    }

    #[test]
    fn test_delete_unknown_is_a_notice() {
        let mut repo = repo_with_rice();
        let config = AppConfig::default();

        let delete = InventoryCommand::Delete {
            barcode: "B2".into(),
        };
        assert!(execute(&mut repo, &delete, &config, false).is_ok());
        assert!(repo.table().find("B2").is_none());

        let out = execute(&mut repo, &delete, &config, false).unwrap();
        assert_eq!(out, "No item with barcode B2; nothing deleted\n");
        assert_eq!(repo.table().len(), 1);
    }

    #[test]
    fn test_list_filter_and_json() {
        let mut repo = repo_with_rice();
        let config = AppConfig::default();

        let list = InventoryCommand::List {
            query: Some("SALT".into()),
        };
        let out = execute(&mut repo, &list, &config, false).unwrap();
        assert!(out.contains("Iodized Salt"));
        assert!(!out.contains("Rice"));

        let out = execute(&mut repo, &InventoryCommand::List { query: None }, &config, true).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["price"], "62.50");
    }

    #[test]
    fn test_show() {
        let mut repo = repo_with_rice();
        let config = AppConfig::default();

        let show = InventoryCommand::Show {
            barcode: "B1".into(),
        };
        let out = execute(&mut repo, &show, &config, false).unwrap();
        assert!(out.contains("Quantity: 10"));
        assert!(out.contains("₹62.50"));
    }

    #[test]
    fn test_export_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.inventory = dir.path().join("inventory.csv");

        let mut repo = InventoryRepository::open(tally_store::CsvInventoryFile::new(
            &config.paths.inventory,
        ))
        .unwrap();
        execute(&mut repo, &add("B1", "Rice 1kg", "3", "62.50"), &config, false).unwrap();

        let export = InventoryCommand::Export {
            path: dir.path().join("out/rice.csv"),
            query: Some("rice".into()),
        };
        let out = execute(&mut repo, &export, &config, false).unwrap();
        assert!(out.starts_with("Exported 1 item(s)"));

        let backup = InventoryCommand::Backup {
            path: dir.path().join("backup/inventory.csv"),
        };
        execute(&mut repo, &backup, &config, false).unwrap();
        assert_eq!(
            std::fs::read(&config.paths.inventory).unwrap(),
            std::fs::read(dir.path().join("backup/inventory.csv")).unwrap()
        );
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("tally.toml");
        let config = AppConfig::default();

        init_config_with(&config, Some(target.clone()), false).unwrap();
        let err = init_config_with(&config, Some(target.clone()), false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(init_config_with(&config, Some(target), true).is_ok());
    }

    #[test]
    fn test_cli_parses() {
        let cli = InventoryCli::try_parse_from([
            "tally-inventory",
            "--inventory",
            "/tmp/inv.csv",
            "add",
            "--barcode",
            "B1",
            "--name",
            "Rice",
            "--quantity",
            "2",
            "--price",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.paths.inventory, Some(PathBuf::from("/tmp/inv.csv")));
        assert!(matches!(cli.command, InventoryCommand::Add { .. }));
    }
}
