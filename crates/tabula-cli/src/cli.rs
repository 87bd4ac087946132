//! `tabula` - browse and edit catalogued tables from the terminal

mod output;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tabula_catalog::{AppConfig, TableCatalog, TablePath};
use tabula_drivers::DriverRegistry;
use tabula_services::{CellEdit, ForeignKeyValidator, RowInsertData, TableService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tabula - edit any catalogued table through one generic grid
#[derive(Parser, Debug)]
#[command(name = "tabula", author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "tabula.toml", env = "TABULA_CONFIG")]
    config: PathBuf,

    /// Log at debug level regardless of the configuration
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the catalog's foreign-key lookups against the database
    Validate,
    /// List groups and their tables
    Menu,
    /// Print a table view
    Show {
        /// Navigation path, `/<group>/<table>`
        path: String,
        /// Print the full view as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Edit one cell; foreign-key columns take the display value
    Edit {
        path: String,
        row_id: String,
        column: String,
        #[arg(required_unless_present = "null")]
        value: Option<String>,
        /// Store NULL
        #[arg(long, conflicts_with = "value")]
        null: bool,
    },
    /// Show the insert form fields of a table
    Form { path: String },
    /// Insert a row from `column=value` pairs
    Insert {
        path: String,
        #[arg(value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected column=value, got '{}'", raw)),
    }
}

fn parse_path(raw: &str) -> Result<TablePath> {
    raw.parse()
        .with_context(|| format!("invalid table path '{}'", raw))
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration and catalog, connect, and validate before serving
async fn start(cli: &Cli) -> Result<TableService> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    init_tracing(cli.verbose || config.debug);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), config = %cli.config.display(), "starting tabula");

    let catalog = TableCatalog::load(&config.tables_file).with_context(|| {
        format!(
            "failed to load table catalog {}",
            config.tables_file.display()
        )
    })?;

    let registry = DriverRegistry::with_defaults();
    let connection = registry
        .connect(&config.connection_string)
        .await
        .context("failed to connect to the database")?;

    let validated = ForeignKeyValidator::validate(catalog, connection.as_ref())
        .await
        .context("table catalog failed validation")?;

    Ok(TableService::new(validated, connection))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let service = start(&cli).await?;

    match cli.command {
        Command::Validate => {
            let tables = service.catalog().tables().count();
            let lookups = service.catalog().foreign_keys().count();
            println!(
                "catalog OK: {} tables, {} foreign-key lookups",
                tables, lookups
            );
        }
        Command::Menu => print!("{}", output::render_menu(&service.menu())),
        Command::Show { path, json } => {
            let path = parse_path(&path)?;
            let Some(view) = service.load_table(&path).await? else {
                println!("group '{}' selected; pick a table", path.group());
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", view.table_title);
                println!("{}", output::render_view(&view));
            }
        }
        Command::Edit {
            path,
            row_id,
            column,
            value,
            null,
        } => {
            let path = parse_path(&path)?;
            let edit = CellEdit {
                column_id: column,
                row_id,
                new_value: if null { None } else { value },
            };
            service.update_cell(&path, edit.clone()).await?;
            println!("updated {}.{} of row {}", path, edit.column_id, edit.row_id);
        }
        Command::Form { path } => {
            let path = parse_path(&path)?;
            let fields = service.form_fields(&path).await?;
            println!("{}", output::render_form(&fields));
        }
        Command::Insert { path, values } => {
            let path = parse_path(&path)?;
            if path.table().is_none() {
                bail!("insert needs a table path, got {}", path);
            }
            let row = values
                .into_iter()
                .fold(RowInsertData::default(), |row, (column, value)| {
                    row.with_value(column, Some(&value))
                });
            service.insert_row(&path, row).await?;
            println!("inserted row into {}", path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert_eq!(
            parse_assignment("email="),
            Ok(("email".to_string(), String::new()))
        );
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("full_name").is_err());
    }

    #[test]
    fn edit_requires_value_or_null() {
        assert!(Cli::try_parse_from(["tabula", "edit", "/hr/employees", "5", "email"]).is_err());
        assert!(
            Cli::try_parse_from(["tabula", "edit", "/hr/employees", "5", "email", "--null"])
                .is_ok()
        );
        assert!(
            Cli::try_parse_from(["tabula", "edit", "/hr/employees", "5", "email", "x", "--null"])
                .is_err()
        );
    }
}
