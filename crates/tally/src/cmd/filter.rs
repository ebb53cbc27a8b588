//! Query trees built from command-line flags.

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use tally_core::{DateFilter, EntryKind, EntryLine, InstrumentKind};
use tally_query::{Direction, DistributedAtom, EntryAtom, LineAtom, Query};

/// Instrument kind flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Depreciable assets
    Asset,
    /// Amortizations
    Amortization,
}

impl From<KindArg> for InstrumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Asset => Self::Asset,
            KindArg::Amortization => Self::Amortization,
        }
    }
}

/// Which instruments a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct InstrumentFilter {
    /// Instrument id prefix
    #[arg(long)]
    pub id: Option<String>,

    /// Pattern the instrument name must match
    #[arg(long)]
    pub name: Option<String>,

    /// Instrument kind
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
}

impl InstrumentFilter {
    /// The query selecting the instruments.
    pub fn query(&self) -> anyhow::Result<Query<DistributedAtom>> {
        let mut atom = match &self.name {
            Some(pattern) => DistributedAtom::by_name(pattern)?,
            None => DistributedAtom::default(),
        };
        atom.id.clone_from(&self.id);
        atom.kind = self.kind.map(Into::into);
        Ok(Query::Atom(atom))
    }
}

/// Date range of a command.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First day of the range
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// Last day of the range
    #[arg(long)]
    pub until: Option<NaiveDate>,

    /// Only undated records
    #[arg(long, conflicts_with_all = ["since", "until"])]
    pub undated: bool,
}

impl RangeArgs {
    /// The date filter of the range.
    pub const fn filter(&self) -> DateFilter {
        if self.undated {
            DateFilter::null_only()
        } else {
            DateFilter::new(self.since, self.until)
        }
    }
}

/// Which entries and lines a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct EntryFilter {
    /// Line title
    #[arg(long)]
    pub title: Option<u32>,

    /// Line sub-title
    #[arg(long)]
    pub sub_title: Option<u32>,

    /// Line content
    #[arg(long)]
    pub content: Option<String>,

    /// Line remark
    #[arg(long)]
    pub remark: Option<String>,

    /// Only debit lines
    #[arg(long)]
    pub debit: bool,

    /// Only credit lines
    #[arg(long, conflicts_with = "debit")]
    pub credit: bool,

    /// Entry kind
    #[arg(long)]
    pub entry_kind: Option<EntryKind>,
}

impl EntryFilter {
    /// The line query, if any line flag is given.
    pub fn lines(&self) -> Option<Query<LineAtom>> {
        let line = EntryLine {
            title: self.title,
            sub_title: self.sub_title,
            content: self.content.clone(),
            remark: self.remark.clone(),
            ..EntryLine::default()
        };
        let direction = if self.debit {
            Some(Direction::Debit)
        } else if self.credit {
            Some(Direction::Credit)
        } else {
            None
        };
        if line.is_wildcard() && direction.is_none() {
            return None;
        }
        Some(Query::Atom(LineAtom {
            filter: line,
            direction,
        }))
    }

    /// The entry query over a range.
    pub fn query(&self, range: DateFilter) -> Query<EntryAtom> {
        let mut atom = EntryAtom::in_range(range);
        atom.lines = self.lines();
        atom.kind = self.entry_kind;
        Query::Atom(atom)
    }
}

/// Parse a line pattern written `TITLE` or `TITLE:SUB`.
pub fn parse_line(s: &str) -> Result<EntryLine, String> {
    let (title, sub) = match s.split_once(':') {
        Some((t, s)) => (t, Some(s)),
        None => (s, None),
    };
    let title = title
        .parse::<u32>()
        .map_err(|e| format!("invalid title '{title}': {e}"))?;
    let mut line = EntryLine::pattern(title);
    if let Some(sub) = sub {
        let sub = sub
            .parse::<u32>()
            .map_err(|e| format!("invalid sub-title '{sub}': {e}"))?;
        line = line.with_sub_title(sub);
    }
    Ok(line)
}
