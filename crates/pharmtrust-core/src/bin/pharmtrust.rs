//! Operator CLI for a PharmTrust registry backed by the in-memory ledger.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pharmtrust_core::{
    devnet_ledger, identity, logging, MedicineRegistry, NewBatch, RegistryConfig, UnitQrPayload,
    VerificationLink,
};

#[derive(Parser, Debug)]
#[command(name = "pharmtrust", about = "Register and verify medicine batches and units")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Artifact document, overriding the configured one
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a medicine batch
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        batch: String,
        #[arg(long)]
        units: Option<u64>,
        /// YYYY-MM or YYYY-MM-DD
        #[arg(long)]
        expiry: Option<String>,
    },
    /// Issue a unit of a registered batch
    Unit {
        medicine_id: String,
        /// Generated when omitted
        #[arg(long)]
        serial: Option<String>,
    },
    /// List registered batches with issuance counts
    List,
    /// Show one batch and its units
    Show { medicine_id: String },
    /// Verify a unit asset id
    Verify { unit_asset_id: String },
    /// Print the verification QR payload for a unit
    Qr { unit_asset_id: String },
    /// Show the creator account
    Balance,
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let mut config = match &cli.config {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    let ledger = devnet_ledger(&config)?;
    let registry = MedicineRegistry::open(config, ledger)?;

    match cli.command {
        Command::Add {
            name,
            batch,
            units,
            expiry,
        } => {
            let defaults = &registry.config().defaults;
            let request = NewBatch::new(
                name,
                batch,
                units.unwrap_or(defaults.total_units),
                expiry.unwrap_or_else(|| defaults.expiry_date.clone()),
            );
            let registered = registry.register_batch(request)?;
            println!("medicine_id:    {}", registered.medicine_id);
            println!("batch_asset_id: {}", registered.batch_asset_id);
        }

        Command::Unit {
            medicine_id,
            serial,
        } => {
            let serial = identity::resolve_unit_serial(serial.as_deref());
            let unit_asset_id = registry.issue_unit(&medicine_id, &serial)?.canonical();
            print_json(&UnitQrPayload::new(&medicine_id, &unit_asset_id, &serial))?;
        }

        Command::List => {
            let lines = registry.inventory_summary()?;
            if lines.is_empty() {
                println!("No medicines registered");
            }
            for line in lines {
                println!(
                    "{}  asset={}  units={}/{}  expires={}",
                    line.medicine_id,
                    line.batch_asset_id,
                    line.issued_units,
                    line.total_units,
                    line.expiry_date
                );
            }
        }

        Command::Show { medicine_id } => {
            let batch = registry
                .get_medicine(&medicine_id)?
                .with_context(|| format!("medicine not found: {}", medicine_id))?;
            print_json(&batch)?;
        }

        Command::Verify { unit_asset_id } => match registry.verify(&unit_asset_id)? {
            Some(record) => print_json(&record)?,
            None => anyhow::bail!("unit asset {} was not issued by this registry", unit_asset_id),
        },

        Command::Qr { unit_asset_id } => {
            print_json(&VerificationLink::new(&unit_asset_id))?;
        }

        Command::Balance => {
            let info = registry.creator_balance()?;
            println!("address: {}", info.address);
            println!("balance: {:.6}", info.balance());
            for holding in &info.assets {
                println!("  asset {}: {}", holding.asset_id, holding.amount);
            }
        }
    }

    Ok(())
}
