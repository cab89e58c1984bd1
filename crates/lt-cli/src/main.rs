use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lt_cli::commands::{lifecycle, record, report, students};
use lt_cli::{Cli, Commands, Config, StudentsAction};
use lt_db::NewArrival;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(lt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = lt_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = io::stdout();

    match &cli.command {
        Some(Commands::Record {
            class,
            nis,
            time,
            date,
            reason,
            note,
            by,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let tanggal = match date {
                Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("invalid date {raw}, expected YYYY-MM-DD"))?,
                None => Local::now().date_naive(),
            };
            let jam_datang = time
                .clone()
                .unwrap_or_else(|| Local::now().format("%H:%M").to_string());
            let input = NewArrival {
                tanggal,
                jam_datang,
                kelas: class.clone(),
                nis: nis.clone(),
                alasan: reason.clone(),
                catatan: note.clone(),
                recorded_by: by.clone(),
            };
            record::run(&mut stdout, &db, &config.engine, &input)?;
        }
        Some(Commands::Report {
            from,
            to,
            month,
            class,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let args = report::ReportArgs {
                from: from.clone(),
                to: to.clone(),
                month: month.clone(),
                class: class.clone(),
                json: *json,
            };
            report::run(&mut stdout, &db, &config.engine, &args)?;
        }
        Some(Commands::Students { action }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            match action {
                StudentsAction::Add { nis, name, class } => {
                    students::add(&mut stdout, &db, nis, name, class)?;
                }
                StudentsAction::Import { file } => {
                    students::import(&mut stdout, &mut db, &config.engine, file)?;
                }
                StudentsAction::List { json } => {
                    students::list(&mut stdout, &db, *json)?;
                }
            }
        }
        Some(Commands::SetStatus { nis, status }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            lifecycle::set_status(&mut stdout, &db, nis, status)?;
        }
        Some(Commands::Promote { from, to }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            lifecycle::promote(&mut stdout, &db, from, to)?;
        }
        Some(Commands::Graduate { class }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            lifecycle::graduate(&mut stdout, &db, class)?;
        }
        Some(Commands::GraduateSeniors { prefix }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            lifecycle::graduate_seniors(&mut stdout, &db, prefix)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
