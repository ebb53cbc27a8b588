//! The subtotal report over entry lines.

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use std::io::Write;
use tally_core::DateFilter;
use tally_store::{MemoryStore, Store};
use tally_subtotal::{balances_of, AggregationType, GatheringType, GroupLevel, Subtotal, TextReport};

use super::filter::{EntryFilter, RangeArgs};

/// Terminal aggregation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Aggregation {
    /// Every line on its own
    None,
    /// Running balance on days with lines
    Changed,
    /// Running balance on every day of the range
    EveryDay,
}

/// Gathering flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Gathering {
    /// Sum amounts
    Sum,
    /// Count lines
    Count,
    /// Sum amounts, dropping zero totals
    NonZero,
}

/// Arguments of the subtotal command.
#[derive(Args, Debug, Clone)]
pub struct SubtotalArgs {
    /// Grouping levels, outermost first (title, sub-title, content, remark, day, week, month, year)
    #[arg(long, value_delimiter = ',', default_value = "title")]
    pub by: Vec<GroupLevel>,

    /// Terminal aggregation
    #[arg(long, value_enum, default_value = "none")]
    pub aggr: Aggregation,

    /// How lines contribute to totals
    #[arg(long, value_enum, default_value = "sum")]
    pub gather: Gathering,

    #[command(flatten)]
    pub lines: EntryFilter,

    #[command(flatten)]
    pub range: RangeArgs,
}

impl SubtotalArgs {
    /// The validated subtotal specification.
    pub fn subtotal(&self) -> Result<Subtotal> {
        let aggregation = match self.aggr {
            Aggregation::None => AggregationType::None,
            Aggregation::Changed => AggregationType::ChangedDay,
            Aggregation::EveryDay => {
                let (Some(from), Some(to)) = (self.range.since, self.range.until) else {
                    bail!("--aggr every-day needs both --since and --until");
                };
                AggregationType::EveryDay { from, to }
            }
        };
        let gathering = match self.gather {
            Gathering::Sum => GatheringType::Sum,
            Gathering::Count => GatheringType::Count,
            Gathering::NonZero => GatheringType::NonZero,
        };
        Ok(Subtotal::new(self.by.clone(), aggregation, gathering)?)
    }
}

/// Render the subtotal report of the selected lines.
pub fn run<W: Write>(store: &MemoryStore, args: &SubtotalArgs, out: &mut W) -> Result<usize> {
    let subtotal = args.subtotal()?;
    // the opening balance of a daily running balance comes from before the range
    let range = match subtotal.aggregation() {
        AggregationType::EveryDay { to, .. } => DateFilter::new(None, Some(to)),
        _ => args.range.filter(),
    };
    let entries = store.select_entries(&args.lines.query(range))?;
    let lines = args.lines.lines();
    let balances = balances_of(&entries, lines.as_ref());
    tracing::debug!(entries = entries.len(), balances = balances.len(), "subtotal input");
    write!(out, "{}", TextReport::render(&subtotal, balances))?;
    Ok(0)
}
