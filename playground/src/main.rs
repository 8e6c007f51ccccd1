//! # Storefront query playground
//!
//! A catalog of short, independent demonstrations of the storefront
//! data-access layer: filtering, ordering, projection, subqueries, relation
//! loading, aggregation, annotation, typed expressions, mutation,
//! transactions, and raw SQL. Each demonstration runs against a seeded
//! SQLite database and logs what it found.
//!
//! ## Running
//!
//! ```bash
//! cargo run -p storefront-playground -- demo            # run everything
//! cargo run -p storefront-playground -- demo aggregation
//! cargo run -p storefront-playground -- serve           # landing page
//! cargo run -p storefront-playground -- seed            # seed a file database
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use storefront_backends::SqliteBackend;
use storefront_core::logging::setup_logging;
use storefront_core::Settings;
use storefront_playground::{demos, schema};

use storefront_playground::server::{build_router, build_templates, AppState};

#[derive(Parser)]
#[command(name = "playground", about = "Storefront query playground")]
struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the landing page.
    Serve,
    /// Run one demonstration, or all of them.
    Demo {
        /// The demonstration name (see --list).
        name: Option<String>,
        /// List the available demonstration names and exit.
        #[arg(long)]
        list: bool,
        /// Database to run against; defaults to an in-memory database.
        #[arg(long, default_value = ":memory:")]
        database: String,
    },
    /// Apply the schema and seed data to the configured database file.
    Seed,
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => {
            Settings::from_toml_file(path).with_context(|| format!("loading {}", path.display()))
        }
        None => {
            let default_path = PathBuf::from("storefront.toml");
            if default_path.exists() {
                Settings::from_toml_file(&default_path).context("loading storefront.toml")
            } else {
                Ok(Settings::default())
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_ref())?;
    setup_logging(&settings);

    match cli.command {
        Command::Serve => serve(&settings).await,
        Command::Demo {
            name,
            list,
            database,
        } => {
            if list {
                for name in demos::DEMO_NAMES {
                    println!("{name}");
                }
                return Ok(());
            }
            run_demos(name.as_deref(), &database).await
        }
        Command::Seed => {
            let db = SqliteBackend::open(&settings.database.name)
                .with_context(|| format!("opening {}", settings.database.name))?;
            schema::apply_schema(&db).await?;
            schema::seed(&db).await?;
            tracing::info!(database = %settings.database.name, "database seeded");
            Ok(())
        }
    }
}

async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        tera: build_templates(settings).context("building templates")?,
        site_name: settings.site_name.clone(),
    });
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("binding {}", settings.bind_address))?;
    tracing::info!(address = %settings.bind_address, "serving landing page");

    axum::serve(listener, router).await?;
    Ok(())
}

async fn run_demos(name: Option<&str>, database: &str) -> anyhow::Result<()> {
    let db = SqliteBackend::open(database).with_context(|| format!("opening {database}"))?;
    schema::apply_schema(&db).await?;
    schema::seed(&db).await?;

    match name {
        Some(name) => demos::run_one(&db, name).await?,
        None => demos::run_all(&db).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_settings_defaults_without_file() {
        let settings = load_settings(None).unwrap();
        assert_eq!(settings.database.engine, "sqlite");
    }

    #[test]
    fn test_load_settings_missing_explicit_file_errors() {
        let path = PathBuf::from("/nonexistent/storefront.toml");
        assert!(load_settings(Some(&path)).is_err());
    }

    #[tokio::test]
    async fn test_run_all_demos_in_memory() {
        run_demos(None, ":memory:").await.unwrap();
    }

    #[tokio::test]
    async fn test_run_single_demo() {
        run_demos(Some("aggregation"), ":memory:").await.unwrap();
    }

    #[tokio::test]
    async fn test_run_unknown_demo_errors() {
        assert!(run_demos(Some("nope"), ":memory:").await.is_err());
    }
}
