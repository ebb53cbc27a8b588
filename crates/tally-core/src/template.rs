//! Entry templates: the shape of the entries an instrument generates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryKind, EntryLine};

/// Remark written on generated entries when the template carries none.
pub const GENERATED_REMARK: &str = "automatically generated";

/// One line of an [`EntryTemplate`].
///
/// The generated amount is `factor` times the schedule item's derived amount,
/// except for ignored lines whose `factor` is a fixed amount that
/// reconciliation never touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateLine {
    /// Primary category code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<u32>,
    /// Secondary category code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<u32>,
    /// Content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Multiplier applied to the derived amount (or the fixed amount if ignored).
    pub factor: Decimal,
    /// Line is fixed and excluded from reconciliation.
    #[serde(default)]
    pub ignored: bool,
}

impl TemplateLine {
    /// A scaled template line.
    #[must_use]
    pub const fn new(title: u32, factor: Decimal) -> Self {
        Self {
            title: Some(title),
            sub_title: None,
            content: None,
            factor,
            ignored: false,
        }
    }

    /// Set the secondary category code.
    #[must_use]
    pub const fn with_sub_title(mut self, sub_title: Option<u32>) -> Self {
        self.sub_title = sub_title;
        self
    }

    /// Set the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Mark the line as fixed.
    #[must_use]
    pub const fn fixed(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// The structural pattern of this line (no amount, no remark).
    #[must_use]
    pub fn pattern(&self) -> EntryLine {
        EntryLine {
            title: self.title,
            sub_title: self.sub_title,
            content: self.content.clone(),
            ..EntryLine::default()
        }
    }

    /// The amount this line should carry for a derived amount.
    #[must_use]
    pub fn expected(&self, amount: Decimal) -> Decimal {
        if self.ignored {
            self.factor
        } else {
            amount * self.factor
        }
    }
}

/// The shape of an entry generated from a schedule item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryTemplate {
    /// Category tag of generated entries.
    #[serde(default)]
    pub kind: EntryKind,
    /// Remark of generated entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Template lines.
    #[serde(default)]
    pub lines: Vec<TemplateLine>,
}

impl EntryTemplate {
    /// An empty template of a kind.
    #[must_use]
    pub const fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            remark: None,
            lines: Vec::new(),
        }
    }

    /// Append a line.
    #[must_use]
    pub fn with_line(mut self, line: TemplateLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Build the entry for a schedule item.
    ///
    /// `line_remark` is copied onto every generated line.
    #[must_use]
    pub fn instantiate(
        &self,
        date: Option<NaiveDate>,
        amount: Decimal,
        line_remark: Option<&str>,
    ) -> Entry {
        Entry {
            id: None,
            date,
            remark: Some(
                self.remark
                    .clone()
                    .unwrap_or_else(|| GENERATED_REMARK.to_string()),
            ),
            kind: self.kind,
            lines: self
                .lines
                .iter()
                .map(|t| EntryLine {
                    amount: Some(t.expected(amount)),
                    remark: line_remark.map(ToString::to_string),
                    ..t.pattern()
                })
                .collect(),
        }
    }

    /// Whether an entry has this template's shape.
    ///
    /// Line counts must agree and every template line must structurally match
    /// at least one entry line.
    #[must_use]
    pub fn is_shape_of(&self, entry: &Entry) -> bool {
        entry.lines.len() == self.lines.len() && self.covers(entry)
    }

    /// Whether every template line structurally matches some entry line,
    /// whatever else the entry carries.
    #[must_use]
    pub fn covers(&self, entry: &Entry) -> bool {
        self.lines
            .iter()
            .all(|t| entry.lines.iter().any(|l| l.is_match(&t.pattern())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prepaid_rent() -> EntryTemplate {
        EntryTemplate::new(EntryKind::Amortization)
            .with_line(TemplateLine::new(1123, dec!(-1)).with_content("rent"))
            .with_line(TemplateLine::new(6602, dec!(1)).with_sub_title(Some(5)))
    }

    #[test]
    fn test_instantiate_scales_amounts() {
        let entry = prepaid_rent().instantiate(None, dec!(100), Some("m1"));
        assert_eq!(entry.kind, EntryKind::Amortization);
        assert_eq!(entry.remark.as_deref(), Some(GENERATED_REMARK));
        assert_eq!(entry.lines[0].amount, Some(dec!(-100)));
        assert_eq!(entry.lines[1].amount, Some(dec!(100)));
        assert_eq!(entry.lines[1].remark.as_deref(), Some("m1"));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_fixed_line_keeps_factor() {
        let t = EntryTemplate::new(EntryKind::Ordinary)
            .with_line(TemplateLine::new(6603, dec!(2.5)).fixed());
        let entry = t.instantiate(None, dec!(100), None);
        assert_eq!(entry.lines[0].amount, Some(dec!(2.5)));
    }

    #[test]
    fn test_shape_matching() {
        let t = prepaid_rent();
        let entry = t.instantiate(None, dec!(1), None);
        assert!(t.is_shape_of(&entry));

        let mut extra = entry.clone();
        extra.lines.push(EntryLine::new(1001, dec!(0)));
        assert!(!t.is_shape_of(&extra));

        let mut other = entry;
        other.lines[0].content = Some("utilities".into());
        assert!(!t.is_shape_of(&other));
    }

    #[test]
    fn test_covers_ignores_extra_lines() {
        let t = prepaid_rent();
        let mut entry = t.instantiate(None, dec!(1), None);
        entry.lines.push(EntryLine::new(1002, dec!(-1)));
        assert!(t.covers(&entry));
        assert!(!t.is_shape_of(&entry));

        entry.lines.remove(0);
        assert!(!t.covers(&entry));
    }
}
