//! # Seed Inventory Generator
//!
//! Writes a demo inventory file for development.
//!
//! ## Usage
//! ```bash
//! # 60 items (default) into ./inventory.csv
//! cargo run -p tally-store --bin seed
//!
//! # Custom amount and path
//! cargo run -p tally-store --bin seed -- --count 200 --file ./data/inventory.csv
//! ```
//!
//! ## Generated Items
//! - Barcode: `890` + category digit + 9-digit sequence (EAN-13 shaped, no
//!   valid checksum)
//! - Name: product + pack size
//! - Price: 5.00 - 104.99, deterministic per item
//! - Stock: 0 - 100

use std::env;
use std::path::PathBuf;

use tally_core::{InventoryTable, Money};
use tally_store::{CsvInventoryFile, InventoryBackend};

/// Product categories for realistic test data.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Staples",
        &["Basmati Rice", "Toor Dal", "Wheat Atta", "Moong Dal", "Poha", "Sooji"],
    ),
    (
        "Spices",
        &["Turmeric Powder", "Red Chilli Powder", "Garam Masala", "Cumin Seeds", "Iodized Salt"],
    ),
    (
        "Beverages",
        &["Assam Tea", "Filter Coffee", "Mango Drink", "Lemon Soda", "Buttermilk"],
    ),
    (
        "Snacks",
        &["Salted Peanuts", "Masala Chips", "Glucose Biscuits", "Namkeen Mix", "Rusk"],
    ),
    (
        "Household",
        &["Bath Soap", "Detergent Powder", "Dishwash Bar", "Toothpaste", "Hair Oil"],
    ),
];

/// Pack sizes with price add-on in paise.
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Regular", 2500), ("Family", 7500)];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut file = PathBuf::from("./inventory.csv");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--file" | "-f" => {
                if i + 1 < args.len() {
                    file = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Inventory Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>     Number of items to generate (default: 60)");
                println!("  -f, --file <PATH>   Inventory file path (default: ./inventory.csv)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally POS Seed Inventory Generator");
    println!("==================================");
    println!("File:  {}", file.display());
    println!("Items: {}", count);
    println!();

    let backend = CsvInventoryFile::new(&file);
    let existing = backend.load()?;
    if !existing.is_empty() {
        println!("⚠ Inventory already has {} items", existing.len());
        println!("  Skipping seed to avoid mixing demo data with real stock.");
        println!("  Delete the file to regenerate.");
        return Ok(());
    }

    let mut table = InventoryTable::new();
    let mut seq = 0usize;

    'outer: for (category_idx, (_, products)) in CATEGORIES.iter().enumerate() {
        for product in products.iter() {
            for (size, addon) in SIZES {
                if table.len() >= count {
                    break 'outer;
                }
                let barcode = format!("890{}{:09}", category_idx + 1, seq);
                let name = format!("{} {}", product, size);
                let price = Money::from_cents(500 + ((seq * 37) % 2500) as i64 + addon);
                let quantity = ((seq * 13) % 101) as i64;

                table.upsert(&barcode, &name, quantity, price)?;
                seq += 1;
            }
        }
    }

    backend.save(&table)?;

    println!("✓ Wrote {} items", table.len());
    println!("  Search 'rice': {} matches", table.search("rice").len());
    Ok(())
}
