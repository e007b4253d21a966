//! Bloblist CLI - terminal browser for blob tables plus a scripted demo

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bloblist::config::{self, BloblistConfig};
use bloblist::ui::{self, TableListRow, theme};
use bloblist::{BlobTable, demo};

#[derive(Parser)]
#[command(name = "bloblist")]
#[command(version = "0.1.0")]
#[command(about = "List-semantics object persistence over SQLite blob tables")]
#[command(long_about = r#"
Bloblist stores serializable values as blob rows addressed by insertion
order. This CLI browses and edits the raw tables and runs a scripted demo
of the indexed-table and cached-list layers.

Example usage:
  bloblist demo
  bloblist tables
  bloblist show --table PRODUCTS --start 0 --end 9
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (defaults to bloblist.toml, then bloblist.db)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a bloblist.toml config
    Init {
        /// Default table name to record in the config
        #[arg(short, long)]
        table: Option<String>,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// List all tables with their row counts
    Tables,

    /// Show raw rows of a table (positional range, end clamped)
    Show {
        /// Table name
        #[arg(short, long)]
        table: String,

        /// First logical position
        #[arg(long, default_value = "0")]
        start: usize,

        /// Last logical position, inclusive (defaults to the last row)
        #[arg(long)]
        end: Option<usize>,

        /// Output as JSON instead of a table
        #[arg(short, long)]
        json: bool,
    },

    /// Append a raw payload to a table
    Append {
        /// Table name
        #[arg(short, long)]
        table: String,

        /// Payload as hex bytes (empty string appends the absent payload)
        #[arg(long)]
        hex: String,
    },

    /// Delete one row by its identity
    DeleteRow {
        /// Table name
        #[arg(short, long)]
        table: String,

        /// Row identity
        #[arg(long)]
        id: i64,
    },

    /// Create an empty table
    Create {
        /// Table name
        #[arg(short, long)]
        table: String,
    },

    /// Drop a table permanently
    Drop {
        /// Table name
        #[arg(short, long)]
        table: String,
    },

    /// Empty a table, keeping it defined (drop then recreate)
    Clear {
        /// Table name
        #[arg(short, long)]
        table: String,
    },

    /// Run the scripted walkthrough on demo tables
    Demo,
}

fn resolve_database(cli_db: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli_db {
        return Ok(path);
    }

    if let Some(config) = config::load_config(None)? {
        if let Some(database) = config.database {
            return Ok(PathBuf::from(database));
        }
    }

    Ok(config::default_database_path())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let t = theme();

    if let Commands::Init { table, force } = &cli.command {
        let path = config::default_config_path();
        let config = BloblistConfig {
            database: cli.database.as_ref().map(|p| p.display().to_string()),
            table: table.clone(),
        };
        config::write_config(&path, &config, *force)?;
        println!("✅ Wrote {}", path.display());
        return Ok(());
    }

    let db_path = resolve_database(cli.database)?;
    config::ensure_db_dir(&db_path)?;
    let db = BlobTable::open(&db_path)?;
    tracing::debug!("Opened database {:?}", db_path);

    match cli.command {
        Commands::Init { .. } => unreachable!("handled before the database opens"),

        Commands::Tables => {
            let names = db.list_tables()?;
            if names.is_empty() {
                println!("∅ No tables in {:?}", db_path);
                return Ok(());
            }

            let mut rows = Vec::new();
            for name in names {
                let count = db
                    .count(&name)?
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string());
                rows.push(TableListRow { name, rows: count });
            }

            println!("{}", format!("🗄️  Tables in {:?}", db_path).style(t.header));
            println!("{}", ui::tables_overview(&rows));
        }

        Commands::Show { table, start, end, json } => {
            if !db.exists(&table)? {
                anyhow::bail!("table {} does not exist", table);
            }

            let last = db.count(&table)?.unwrap_or(0).saturating_sub(1);
            let end = end.unwrap_or(last);
            let rows = db.scan_range(&table, start, end)?;

            if json {
                let rows: Vec<serde_json::Value> = rows
                    .iter()
                    .enumerate()
                    .map(|(offset, row)| {
                        serde_json::json!({
                            "position": start + offset,
                            "identity": row.id,
                            "bytes": row.payload.len(),
                            "payload": hex::encode(&row.payload),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("∅ No rows in range [{}, {}]", start, end);
            } else {
                println!("{}", format!("📄 {} rows {}..={}", table, start, end).style(t.header));
                println!("{}", ui::rows_table(start, &rows));
            }
        }

        Commands::Append { table, hex } => {
            let payload = ::hex::decode(hex.trim())?;
            if db.append(&table, &payload)? {
                println!("✅ Appended {} bytes to {}", payload.len(), table);
            } else {
                anyhow::bail!("table {} does not exist", table);
            }
        }

        Commands::DeleteRow { table, id } => {
            if db.delete_by_identity(&table, id)? {
                println!("🗑️  Deleted row {} from {}", id, table);
            } else {
                anyhow::bail!("no row with identity {} in {}", id, table);
            }
        }

        Commands::Create { table } => {
            if db.create_table(&table)? {
                println!("✅ Created table {}", table.to_ascii_uppercase());
            } else {
                anyhow::bail!("table {} already exists", table);
            }
        }

        Commands::Drop { table } => {
            if db.drop_table(&table)? {
                println!("🗑️  Dropped table {}", table.to_ascii_uppercase());
            } else {
                anyhow::bail!("table {} does not exist", table);
            }
        }

        Commands::Clear { table } => {
            db.drop_table(&table)?;
            db.create_table(&table)?;
            println!("✅ Cleared table {}", table.to_ascii_uppercase());
        }

        Commands::Demo => {
            demo::run(&db)?;
        }
    }

    Ok(())
}
