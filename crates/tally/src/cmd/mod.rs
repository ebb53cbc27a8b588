//! Command implementations for the `tally` binary.
//!
//! [`main`] parses the command line, loads the ledger, runs one command and
//! saves the ledger back when the command may have changed it.

pub mod distributed;
pub mod filter;
pub mod statement_cmd;
pub mod subtotal_cmd;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tally_store::{MemoryStore, Store, StoreOptions};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use distributed::ResetMode;
use filter::{EntryFilter, InstrumentFilter, RangeArgs};
use statement_cmd::StatementArgs;
use subtotal_cmd::SubtotalArgs;

/// Bookkeeping over a JSON ledger file.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The ledger file (defaults to the one named in the settings file)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub ledger: Option<PathBuf>,

    /// Settings file to use instead of the default one
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Run queries that would scan everything
    #[arg(long, global = true)]
    pub allow_dangerous: bool,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Commands of the `tally` binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List entries
    Entries {
        #[command(flatten)]
        filter: EntryFilter,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Show book values of instruments
    List {
        #[command(flatten)]
        filter: InstrumentFilter,
        /// Day to value on (default: after the last item)
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Show the schedules of instruments
    Show {
        #[command(flatten)]
        filter: InstrumentFilter,
    },
    /// Recompute schedules from instrument parameters
    Recal {
        #[command(flatten)]
        filter: InstrumentFilter,
    },
    /// Generate and edit the entries of schedule items
    Apply {
        #[command(flatten)]
        filter: InstrumentFilter,
        #[command(flatten)]
        range: RangeArgs,
        /// Fold items before the range into undated entries
        #[arg(long)]
        collapse: bool,
    },
    /// Verify generated entries without creating any
    Check {
        #[command(flatten)]
        filter: InstrumentFilter,
        /// Last day to check (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Link existing entries to schedule items
    Reg {
        #[command(flatten)]
        filter: InstrumentFilter,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Drop the links of schedule items
    Unreg {
        #[command(flatten)]
        filter: InstrumentFilter,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Rebuild asset acquisitions and dispositions from entries
    Import {
        #[command(flatten)]
        filter: InstrumentFilter,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Reset schedule links
    Reset {
        /// How far to reset
        #[arg(value_enum)]
        mode: ResetMode,
        #[command(flatten)]
        filter: InstrumentFilter,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Grouped totals of entry lines
    Subtotal(SubtotalArgs),
    /// Match an account statement against the ledger
    Statement(StatementArgs),
}

impl Command {
    /// Whether the command may change the ledger.
    pub const fn mutates(&self) -> bool {
        !matches!(
            self,
            Self::Entries { .. } | Self::List { .. } | Self::Show { .. } | Self::Subtotal(_)
        )
    }
}

/// Main entry point for the `tally` binary.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args, &mut io::stdout().lock()) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` unless `--verbose` asks for everything.
fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }
}

/// Run a parsed command line, writing the command's output.
///
/// Returns how many problems the command found.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let settings = Settings::load(args.config.as_deref())?;
    let path = args
        .ledger
        .clone()
        .or(settings.ledger)
        .context("no ledger file given; pass --ledger or set one in the settings file")?;
    let options = StoreOptions {
        allow_dangerous: args.allow_dangerous || settings.allow_dangerous,
    };
    let mut store = MemoryStore::load(&path)
        .with_context(|| format!("failed to load {}", path.display()))?
        .with_options(options);

    let problems = execute(&args.command, &mut store, out)?;

    if args.command.mutates() {
        store
            .save(&path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        tracing::debug!(path = %path.display(), "saved ledger");
    }

    Ok(problems)
}

fn execute<W: Write>(command: &Command, store: &mut MemoryStore, out: &mut W) -> Result<usize> {
    match command {
        Command::Entries { filter, range } => {
            for entry in store.select_entries(&filter.query(range.filter()))? {
                writeln!(out, "{entry}")?;
            }
            Ok(0)
        }
        Command::List { filter, on } => distributed::list(store, filter, *on, out),
        Command::Show { filter } => distributed::show(store, filter, out),
        Command::Recal { filter } => distributed::recal(store, filter, out),
        Command::Apply {
            filter,
            range,
            collapse,
        } => distributed::apply(store, filter, &range.filter(), *collapse, out),
        Command::Check { filter, today } => {
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            distributed::check(store, filter, today, out)
        }
        Command::Reg { filter, range } => distributed::register(store, filter, &range.filter(), out),
        Command::Unreg { filter, range } => {
            distributed::unregister(store, filter, &range.filter(), out)
        }
        Command::Import { filter, range } => distributed::import(store, filter, &range.filter(), out),
        Command::Reset {
            mode,
            filter,
            range,
        } => distributed::reset(store, *mode, filter, &range.filter(), out),
        Command::Subtotal(args) => subtotal_cmd::run(store, args, out),
        Command::Statement(args) => statement_cmd::run(store, args, out),
    }
}
