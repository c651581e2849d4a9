//! local-settings — command-line access to a settings file.
//!
//! Reads and writes one YAML settings file through the same
//! [`SettingStore`] an application would use, so values written here are
//! formatted exactly like values written by the application.
//!
//! # Usage
//!
//! ```text
//! local-settings --file <PATH> [--deferred] <COMMAND>
//!
//! Commands:
//!   get <KEY>                    Print the raw string value
//!   get-int <KEY>                Print the value as an integer (0 if missing)
//!   get-decimal <KEY>            Print the value as a decimal (0.00 if missing)
//!   get-date-time <KEY>          Print the value as a date-time
//!   set <KEY> <VALUE>            Store a string
//!   set-int <KEY> <VALUE>        Store an integer
//!   set-decimal <KEY> <VALUE>    Store a decimal
//!   set-date-time <KEY> <VALUE>  Store a date-time (RFC 3339 or local time)
//!   list                         Print every entry as `key = value`
//! ```
//!
//! # Environment variables
//!
//! | Variable              | Description                                   |
//! |-----------------------|-----------------------------------------------|
//! | `LOCAL_SETTINGS_FILE` | Default for `--file`                          |
//! | `RUST_LOG`            | Log filter for diagnostics on stderr (`warn`) |

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use local_settings::domain::value;
use local_settings::{SettingService, SettingStore, WriteMode};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Read and write a local settings file.
#[derive(Debug, Parser)]
#[command(
    name = "local-settings",
    about = "Read and write a local YAML settings file",
    version
)]
struct Cli {
    /// Path of the YAML settings file.  Created on the first write.
    #[arg(long, short, env = "LOCAL_SETTINGS_FILE")]
    file: PathBuf,

    /// Use deferred write mode and flush once after the command.
    #[arg(long)]
    deferred: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the raw string value of a key.
    Get { key: String },
    /// Print a key as an integer.
    GetInt { key: String },
    /// Print a key as a decimal.
    GetDecimal { key: String },
    /// Print a key as a date-time.
    GetDateTime { key: String },
    /// Store a string value.
    Set { key: String, value: String },
    /// Store an integer value.
    SetInt {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: i32,
    },
    /// Store a decimal value.
    SetDecimal {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
    /// Store a date-time value.
    SetDateTime { key: String, value: String },
    /// Print every entry in key order.
    List,
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Set { .. }
                | Command::SetInt { .. }
                | Command::SetDecimal { .. }
                | Command::SetDateTime { .. }
        )
    }
}

impl Cli {
    fn write_mode(&self) -> WriteMode {
        if self.deferred {
            WriteMode::Deferred
        } else {
            WriteMode::OnChange
        }
    }
}

// ── Command execution ─────────────────────────────────────────────────────────

/// Executes `cli` against its settings file, printing results to `out`.
fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let mode = cli.write_mode();
    let store = SettingStore::new();
    store
        .initialize_path(&cli.file, mode)
        .with_context(|| format!("failed to open settings file {}", cli.file.display()))?;
    debug!("opened {} in {mode} mode", cli.file.display());

    let flush = mode == WriteMode::Deferred && cli.command.mutates();

    match cli.command {
        Command::Get { key } => {
            let found = store
                .get(&key)?
                .ok_or_else(|| anyhow!("setting '{key}' not found"))?;
            writeln!(out, "{found}")?;
        }
        Command::GetInt { key } => writeln!(out, "{}", store.get_int(&key)?)?,
        Command::GetDecimal { key } => {
            writeln!(out, "{}", value::format_decimal(store.get_decimal(&key)?))?
        }
        Command::GetDateTime { key } => writeln!(
            out,
            "{}",
            value::format_date_time(&store.get_date_time(&key)?)
        )?,
        Command::Set { key, value } => store.set(&key, &value)?,
        Command::SetInt { key, value } => store.set_int(&key, value)?,
        Command::SetDecimal { key, value } => store.set_decimal(&key, value)?,
        Command::SetDateTime { key, value: text } => {
            let parsed = value::parse_date_time(&text)
                .ok_or_else(|| anyhow!("'{text}' is not a valid date-time"))?;
            store.set_date_time(&key, parsed)?;
        }
        Command::List => {
            for (key, value) in store.entries()? {
                writeln!(out, "{key} = {value}")?;
            }
        }
    }

    if flush {
        store
            .write_settings()
            .with_context(|| format!("failed to write {}", cli.file.display()))?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so stdout stays clean for values.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
