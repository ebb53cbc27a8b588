//! Atoms over entry lines, entries and instruments.

use regex::Regex;
use tally_core::amount;
use tally_core::{DateFilter, Entry, EntryKind, EntryLine, Instrument, InstrumentKind};

use crate::error::QueryError;
use crate::query::{Query, QueryAtom};

/// Required sign of a line amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Amount must be positive.
    Debit,
    /// Amount must be negative.
    Credit,
}

impl Direction {
    const fn sign(self) -> i8 {
        match self {
            Self::Debit => 1,
            Self::Credit => -1,
        }
    }
}

/// Filter over entry lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineAtom {
    /// Line-shaped filter; `None` fields are wildcards.
    pub filter: EntryLine,
    /// Required sign of the amount.
    pub direction: Option<Direction>,
}

impl LineAtom {
    /// A filter from a pattern line.
    #[must_use]
    pub const fn new(filter: EntryLine) -> Self {
        Self {
            filter,
            direction: None,
        }
    }

    /// Require a sign.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

impl QueryAtom for LineAtom {
    type Record = EntryLine;

    fn is_match(&self, line: &EntryLine) -> bool {
        if !line.is_match(&self.filter) {
            return false;
        }
        if self.filter.remark.is_some() && line.remark != self.filter.remark {
            return false;
        }
        if let Some(a) = self.filter.amount {
            if !line.amount_is_near(a) {
                return false;
            }
        }
        self.direction
            .map_or(true, |d| amount::sign(line.amount_or_zero()) == d.sign())
    }

    fn is_dangerous(&self) -> bool {
        self.filter.is_wildcard() && self.filter.amount.is_none() && self.direction.is_none()
    }
}

/// Filter over entries.
#[derive(Debug, Clone, Default)]
pub struct EntryAtom {
    /// Exact entry id.
    pub id: Option<String>,
    /// Category tag.
    pub kind: Option<EntryKind>,
    /// Exact remark.
    pub remark: Option<String>,
    /// Date range.
    pub range: DateFilter,
    /// Condition on the lines.
    pub lines: Option<Query<LineAtom>>,
    /// Every line must satisfy `lines` rather than at least one.
    pub for_all: bool,
}

impl EntryAtom {
    /// A filter over a date range.
    #[must_use]
    pub fn in_range(range: DateFilter) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    /// A filter on entries with at least one line matching a query.
    #[must_use]
    pub fn with_lines(lines: impl Into<Query<LineAtom>>) -> Self {
        Self {
            lines: Some(lines.into()),
            ..Self::default()
        }
    }

    /// The filter on a single entry id.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Restrict the date range.
    #[must_use]
    pub const fn within(mut self, range: DateFilter) -> Self {
        self.range = range;
        self
    }

    /// Restrict the category tag.
    #[must_use]
    pub const fn of_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl QueryAtom for EntryAtom {
    type Record = Entry;

    fn is_match(&self, entry: &Entry) -> bool {
        if self.id.is_some() && entry.id != self.id {
            return false;
        }
        if self.kind.is_some_and(|k| entry.kind != k) {
            return false;
        }
        if self.remark.is_some() && entry.remark != self.remark {
            return false;
        }
        if !self.range.contains(entry.date) {
            return false;
        }
        match &self.lines {
            None => true,
            Some(q) if self.for_all => entry.lines.iter().all(|l| q.evaluate(l)),
            Some(q) => entry.lines.iter().any(|l| q.evaluate(l)),
        }
    }

    fn is_dangerous(&self) -> bool {
        let bounded = self.id.is_some()
            || self.kind.is_some()
            || self.remark.is_some()
            || !self.range.is_unconstrained();
        let lines_bound = self
            .lines
            .as_ref()
            .is_some_and(|q| !self.for_all && !q.is_dangerous());
        !bounded && !lines_bound
    }
}

/// Filter over distributed instruments.
#[derive(Debug, Clone, Default)]
pub struct DistributedAtom {
    /// Id prefix, compared case-insensitively.
    pub id: Option<String>,
    /// Pattern the name must contain a match of.
    pub name: Option<Regex>,
    /// Range of the declared date.
    pub range: DateFilter,
    /// Instrument kind.
    pub kind: Option<InstrumentKind>,
}

impl DistributedAtom {
    /// The filter on an id prefix.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The filter on a name pattern.
    pub fn by_name(pattern: &str) -> Result<Self, QueryError> {
        let name = Regex::new(pattern).map_err(|e| QueryError::Pattern(e.to_string()))?;
        Ok(Self {
            name: Some(name),
            ..Self::default()
        })
    }

    /// Restrict the instrument kind.
    #[must_use]
    pub const fn of_kind(mut self, kind: InstrumentKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl QueryAtom for DistributedAtom {
    type Record = Instrument;

    fn is_match(&self, instrument: &Instrument) -> bool {
        if let Some(id) = &self.id {
            if !instrument.id.to_lowercase().starts_with(&id.to_lowercase()) {
                return false;
            }
        }
        if let Some(re) = &self.name {
            if !re.is_match(&instrument.name) {
                return false;
            }
        }
        if self.kind.is_some_and(|k| instrument.kind() != k) {
            return false;
        }
        self.range.contains(instrument.date)
    }

    fn is_dangerous(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.kind.is_none() && self.range.is_unconstrained()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{AssetParams, NaiveDate};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_line_direction() {
        let debit = LineAtom::new(EntryLine::pattern(1001)).with_direction(Direction::Debit);
        assert!(debit.is_match(&EntryLine::new(1001, dec!(5))));
        assert!(!debit.is_match(&EntryLine::new(1001, dec!(-5))));
        assert!(!debit.is_match(&EntryLine::new(1001, dec!(0))));
        assert!(LineAtom::new(EntryLine::pattern(1001)).is_match(&EntryLine::new(1001, dec!(0))));
    }

    #[test]
    fn test_line_remark_is_exact() {
        let atom = LineAtom::new(EntryLine::pattern(6602).with_remark("m1"));
        assert!(atom.is_match(&EntryLine::new(6602, dec!(1)).with_remark("m1")));
        assert!(!atom.is_match(&EntryLine::new(6602, dec!(1)).with_remark("m2")));
    }

    #[test]
    fn test_wildcard_line_is_dangerous() {
        assert!(LineAtom::default().is_dangerous());
        assert!(!LineAtom::new(EntryLine::pattern(1)).is_dangerous());
        assert!(!LineAtom::default().with_direction(Direction::Credit).is_dangerous());
    }

    #[test]
    fn test_entry_atom() {
        let entry = Entry::new(Some(date(2024, 2, 1)))
            .with_kind(EntryKind::Depreciation)
            .with_line(EntryLine::new(1602, dec!(-10)))
            .with_line(EntryLine::new(6602, dec!(10)));

        let any_6602 = EntryAtom::with_lines(LineAtom::new(EntryLine::pattern(6602)));
        assert!(any_6602.is_match(&entry));

        let mut all_6602 = any_6602.clone();
        all_6602.for_all = true;
        assert!(!all_6602.is_match(&entry));

        let jan = DateFilter::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)));
        assert!(!any_6602.clone().within(jan).is_match(&entry));
        assert!(!EntryAtom::default().of_kind(EntryKind::Ordinary).is_match(&entry));
    }

    #[test]
    fn test_entry_atom_danger() {
        assert!(EntryAtom::default().is_dangerous());
        assert!(!EntryAtom::by_id("x").is_dangerous());
        assert!(!EntryAtom::in_range(DateFilter::day(date(2024, 1, 1))).is_dangerous());
        assert!(EntryAtom::with_lines(LineAtom::default()).is_dangerous());
        assert!(!EntryAtom::with_lines(LineAtom::new(EntryLine::pattern(1))).is_dangerous());
    }

    #[test]
    fn test_distributed_atom() {
        let pc = Instrument::asset(
            "c0ffee",
            "Office PC",
            date(2024, 1, 1),
            dec!(5000),
            AssetParams::default(),
        );
        assert!(DistributedAtom::by_id("C0F").is_match(&pc));
        assert!(!DistributedAtom::by_id("bad").is_match(&pc));
        assert!(DistributedAtom::by_name("^Office").unwrap().is_match(&pc));
        assert!(!DistributedAtom::default()
            .of_kind(InstrumentKind::Amortization)
            .is_match(&pc));
        assert!(DistributedAtom::by_name("(").is_err());
        assert!(DistributedAtom::default().is_dangerous());
    }
}
