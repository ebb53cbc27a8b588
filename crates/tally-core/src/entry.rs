//! Ledger entries and entry lines.
//!
//! An [`Entry`] is one double-entry record: an optional date, a remark, a
//! category tag and an ordered list of [`EntryLine`]s. The same [`EntryLine`]
//! shape doubles as a pattern: any `None` field on the pattern side is a
//! wildcard when matching.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount;

/// The category tag of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum EntryKind {
    /// An ordinary entry.
    #[default]
    Ordinary,
    /// Period-end carry entry.
    PeriodCarry,
    /// Entry generated by an amortization.
    Amortization,
    /// Entry generated by an asset depreciation.
    Depreciation,
    /// Entry generated by an asset devaluation.
    Devaluation,
    /// Annual carry entry.
    AnnualCarry,
    /// Entry whose figures are not yet certain.
    Uncertain,
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ordinary" => Ok(Self::Ordinary),
            "carry" | "period-carry" => Ok(Self::PeriodCarry),
            "amortization" => Ok(Self::Amortization),
            "depreciation" => Ok(Self::Depreciation),
            "devaluation" => Ok(Self::Devaluation),
            "annual-carry" => Ok(Self::AnnualCarry),
            "uncertain" => Ok(Self::Uncertain),
            _ => Err(format!("unknown entry kind: {s}")),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ordinary => "ordinary",
            Self::PeriodCarry => "period-carry",
            Self::Amortization => "amortization",
            Self::Depreciation => "depreciation",
            Self::Devaluation => "devaluation",
            Self::AnnualCarry => "annual-carry",
            Self::Uncertain => "uncertain",
        };
        f.write_str(s)
    }
}

/// One debit/credit line of an entry.
///
/// `entry` is a back-reference to the owning entry id, not ownership. When
/// `amount` is `None` the line is a template/wildcard line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryLine {
    /// Id of the owning entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Primary category code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<u32>,
    /// Secondary category code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<u32>,
    /// Free-text content (counterparty, instrument id, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Free-text remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Signed amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

impl EntryLine {
    /// Create a line with a primary category code and an amount.
    #[must_use]
    pub fn new(title: u32, amount: Decimal) -> Self {
        Self {
            title: Some(title),
            amount: Some(amount),
            ..Self::default()
        }
    }

    /// Create an amount-less pattern line on a primary category code.
    #[must_use]
    pub fn pattern(title: u32) -> Self {
        Self {
            title: Some(title),
            ..Self::default()
        }
    }

    /// Set the secondary category code.
    #[must_use]
    pub const fn with_sub_title(mut self, sub_title: u32) -> Self {
        self.sub_title = Some(sub_title);
        self
    }

    /// Set the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the remark.
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Structural match against a pattern line.
    ///
    /// Compares title, sub-title and content; a `None` field on the pattern
    /// is a wildcard. Remark and amount take no part.
    #[must_use]
    pub fn is_match(&self, pattern: &Self) -> bool {
        fn field<T: PartialEq>(value: &Option<T>, pattern: &Option<T>) -> bool {
            pattern.as_ref().map_or(true, |p| value.as_ref() == Some(p))
        }
        field(&self.title, &pattern.title)
            && field(&self.sub_title, &pattern.sub_title)
            && field(&self.content, &pattern.content)
    }

    /// Whether a pattern line constrains nothing at all.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.title.is_none()
            && self.sub_title.is_none()
            && self.content.is_none()
            && self.remark.is_none()
    }

    /// The amount, or zero for amount-less lines.
    #[must_use]
    pub fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or_default()
    }

    /// Whether the amount is within tolerance of the given value.
    #[must_use]
    pub fn amount_is_near(&self, value: Decimal) -> bool {
        self.amount.is_some_and(|a| amount::is_near(a, value))
    }
}

/// A double-entry ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Identifier assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Date, or `None` for an undated/pending entry.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Free-text remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Entry lines in order.
    #[serde(default)]
    pub lines: Vec<EntryLine>,
    /// Category tag.
    #[serde(default)]
    pub kind: EntryKind,
}

impl Entry {
    /// Create an empty entry on a date.
    #[must_use]
    pub fn new(date: Option<NaiveDate>) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    /// Set the category tag.
    #[must_use]
    pub const fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the remark.
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Append a line.
    #[must_use]
    pub fn with_line(mut self, line: EntryLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Sum of all line amounts.
    #[must_use]
    pub fn residual(&self) -> Decimal {
        self.lines.iter().map(EntryLine::amount_or_zero).sum()
    }

    /// Whether debits and credits cancel out within tolerance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        amount::is_zero(self.residual())
    }

    /// Indices of the lines structurally matching a pattern.
    #[must_use]
    pub fn matching_lines(&self, pattern: &EntryLine) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_match(pattern))
            .map(|(i, _)| i)
            .collect()
    }

    /// Point every line's back-reference at this entry's id.
    pub fn link_lines(&mut self) {
        for line in &mut self.lines {
            line.entry.clone_from(&self.id);
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(d) => write!(f, "{d}")?,
            None => write!(f, "[undated]")?,
        }
        write!(f, " {}", self.kind)?;
        if let Some(id) = &self.id {
            write!(f, " ^{id}")?;
        }
        if let Some(remark) = &self.remark {
            write!(f, " \"{remark}\"")?;
        }
        for line in &self.lines {
            write!(f, "\n  T{}", line.title.map_or_else(|| "?".to_string(), |t| t.to_string()))?;
            if let Some(s) = line.sub_title {
                write!(f, "{s:02}")?;
            }
            if let Some(c) = &line.content {
                write!(f, " '{c}'")?;
            }
            if let Some(r) = &line.remark {
                write!(f, " \"{r}\"")?;
            }
            if let Some(a) = line.amount {
                write!(f, " {a}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_structural_match_wildcards() {
        let line = EntryLine::new(1601, dec!(100))
            .with_sub_title(1)
            .with_content("PC");
        assert!(line.is_match(&EntryLine::pattern(1601)));
        assert!(line.is_match(&EntryLine::pattern(1601).with_content("PC")));
        assert!(!line.is_match(&EntryLine::pattern(1601).with_content("Desk")));
        assert!(!line.is_match(&EntryLine::pattern(1602)));
        assert!(line.is_match(&EntryLine::default()));
    }

    #[test]
    fn test_structural_match_ignores_remark_and_amount() {
        let a = EntryLine::new(6602, dec!(10)).with_content("X").with_remark("one");
        let b = EntryLine::new(6602, dec!(-99)).with_content("X").with_remark("two");
        assert!(a.is_match(&b));
        assert!(b.is_match(&a));
        assert_ne!(a.remark, b.remark);
    }

    #[test]
    fn test_missing_field_on_value_side_is_not_wildcard() {
        let line = EntryLine::new(1601, dec!(1));
        assert!(!line.is_match(&EntryLine::pattern(1601).with_sub_title(2)));
    }

    #[test]
    fn test_entry_balance() {
        let entry = Entry::new(None)
            .with_line(EntryLine::new(1001, dec!(50)))
            .with_line(EntryLine::new(6602, dec!(-50)));
        assert!(entry.is_balanced());
        assert_eq!(entry.matching_lines(&EntryLine::pattern(6602)), vec![1]);
    }

    #[test]
    fn test_kind_round_trip_str() {
        for kind in [
            EntryKind::Ordinary,
            EntryKind::PeriodCarry,
            EntryKind::Amortization,
            EntryKind::Depreciation,
            EntryKind::Devaluation,
            EntryKind::AnnualCarry,
            EntryKind::Uncertain,
        ] {
            assert_eq!(kind.to_string().parse::<EntryKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_undated_entry_serializes() {
        let entry = Entry::new(None).with_remark("pending");
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
        assert!(back.date.is_none());
    }
}
