//! CLI entry point for local import checks.
//!
//! # Responsibility
//! - Verify `cakeday_core` linkage without the Flutter/FFI runtime.
//! - Run date normalization and import previews against a local database.
//!
//! # Invariants
//! - Never writes birthdays; `preview` only reads the snapshot.
//! - Exit code is non-zero whenever a command fails.

use cakeday_core::db::open_db;
use cakeday_core::{
    default_log_level, init_logging, DateNormalizer, ImportConfig, ImportService,
    NormalizerOptions, SlashDateOrder, SqliteBirthdayRepository,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cakeday")]
#[command(about = "Birthday import core (CLI mode)")]
#[command(version)]
struct Cli {
    /// Absolute directory for rolling logs (logging stays off when omitted)
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core linkage info
    Ping,

    /// Normalize free-form birthdates to YYYY-MM-DD
    Normalize {
        /// Raw date strings, one per argument
        #[arg(required = true)]
        dates: Vec<String>,

        /// Reading order for numeric slash dates
        #[arg(long, value_enum, default_value_t = SlashOrder::MonthFirst)]
        slash_order: SlashOrder,
    },

    /// Validate and deduplicate an extraction payload without writing
    Preview {
        /// Extraction JSON file (`-` reads stdin)
        payload: PathBuf,

        /// Birthday database to compare against
        #[arg(long, env = "CAKEDAY_DB_PATH")]
        db: PathBuf,

        /// Reading order for numeric slash dates
        #[arg(long, value_enum, default_value_t = SlashOrder::MonthFirst)]
        slash_order: SlashOrder,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SlashOrder {
    MonthFirst,
    DayFirst,
}

impl From<SlashOrder> for SlashDateOrder {
    fn from(value: SlashOrder) -> Self {
        match value {
            SlashOrder::MonthFirst => Self::MonthFirst,
            SlashOrder::DayFirst => Self::DayFirst,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }

    let result = match cli.command.unwrap_or(Commands::Ping) {
        Commands::Ping => {
            println!("cakeday_core ping={}", cakeday_core::ping());
            println!("cakeday_core version={}", cakeday_core::core_version());
            Ok(())
        }
        Commands::Normalize { dates, slash_order } => normalize(&dates, slash_order),
        Commands::Preview {
            payload,
            db,
            slash_order,
        } => preview(&payload, &db, slash_order),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn normalize(dates: &[String], slash_order: SlashOrder) -> Result<(), String> {
    let normalizer = DateNormalizer::new(options(slash_order));
    let mut failed = 0usize;

    for raw in dates {
        match normalizer.normalize(raw) {
            Ok(date) => println!("{raw}\t{date}"),
            Err(err) => {
                failed += 1;
                eprintln!("{raw}\t{err}");
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} date(s) not recognized", dates.len()));
    }
    Ok(())
}

fn preview(payload: &Path, db: &Path, slash_order: SlashOrder) -> Result<(), String> {
    let text = read_payload(payload)?;
    let conn = open_db(db).map_err(|err| format!("opening `{}` failed: {err}", db.display()))?;
    let config = ImportConfig {
        normalizer: options(slash_order),
        ..ImportConfig::default()
    };
    let service = ImportService::with_config(SqliteBirthdayRepository::new(&conn), config)
        .map_err(|err| err.to_string())?;
    let preview = service.preview_payload(&text).map_err(|err| err.to_string())?;

    for dropped in &preview.validation.dropped {
        eprintln!(
            "dropped record #{}: {}",
            dropped.index,
            dropped.reason.as_str()
        );
    }
    eprintln!(
        "compared against {} existing: {} match(es), {} exact, {} new",
        preview.snapshot_size,
        preview.result.matches.len(),
        preview.result.exact_count(),
        preview.result.new_entries.len()
    );

    let json = serde_json::to_string_pretty(&preview.result).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

fn read_payload(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|err| format!("reading stdin failed: {err}"))?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(|err| format!("reading `{}` failed: {err}", path.display()))
}

fn options(slash_order: SlashOrder) -> NormalizerOptions {
    NormalizerOptions {
        slash_order: slash_order.into(),
        reference_year: None,
    }
}
