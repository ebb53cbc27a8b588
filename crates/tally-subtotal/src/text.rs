//! Indented text rendering of a subtotal.

use rust_decimal::Decimal;

use crate::balance::Balance;
use crate::level::{AggregationType, GatheringType, GroupKey, GroupLevel, Subtotal};
use crate::traverse::{traverse, Subtotaled, SubtotalTraversal};

const INDENT: usize = 4;
const LABEL_WIDTH: usize = 38;

/// Renders a subtotal as an indented text report.
///
/// Each group prints as `label  total` followed by its children, indented
/// four spaces per depth. Totals print with two decimal places, or as whole
/// numbers when counting.
#[derive(Debug, Clone, Copy)]
pub struct TextReport {
    gathering: GatheringType,
}

impl TextReport {
    /// A renderer for a subtotal specification.
    #[must_use]
    pub const fn new(subtotal: &Subtotal) -> Self {
        Self {
            gathering: subtotal.gathering(),
        }
    }

    /// Run the traversal and render the whole report.
    #[must_use]
    pub fn render(subtotal: &Subtotal, balances: impl IntoIterator<Item = Balance>) -> String {
        let mut report = Self::new(subtotal);
        let result = traverse(subtotal, balances, &mut report);
        if subtotal.levels().is_empty() && subtotal.aggregation() == AggregationType::None {
            return result.value;
        }
        let head = format!("{}:", report.number(result.total));
        if result.value.is_empty() {
            head
        } else {
            format!("{head}\n{}", result.value)
        }
    }

    fn number(&self, value: Decimal) -> String {
        if self.gathering == GatheringType::Count {
            value.trunc().to_string()
        } else {
            format!("{:.2}", value.round_dp(2))
        }
    }

    fn row(&self, depth: usize, label: &str, value: Decimal) -> String {
        format!(
            "{}{:<lw$}{:>vw$}",
            " ".repeat(depth * INDENT),
            label,
            self.number(value),
            lw = LABEL_WIDTH,
            vw = 12 + 2 * depth,
        )
    }

    fn join(children: Vec<Subtotaled<String>>) -> String {
        children
            .into_iter()
            .map(|c| c.value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn date_label(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "[undated]".to_string(), |d| d.to_string())
}

fn key_label(level: GroupLevel, key: &GroupKey) -> String {
    match key {
        GroupKey::Title(t) => t.map_or_else(|| "[none]".to_string(), |t| format!("T{t}")),
        GroupKey::SubTitle(s) => s.map_or_else(|| "[none]".to_string(), |s| format!("{s:02}")),
        GroupKey::Content(c) | GroupKey::Remark(c) => c.clone().unwrap_or_default(),
        GroupKey::Date(None) => "[undated]".to_string(),
        GroupKey::Date(Some(d)) => match level {
            GroupLevel::Week => format!("{}W", d.format("%Y%m%d")),
            GroupLevel::Month => d.format("%Y%m").to_string(),
            GroupLevel::Year => d.format("%Y").to_string(),
            _ => d.to_string(),
        },
    }
}

impl SubtotalTraversal for TextReport {
    type Output = String;

    fn leaf_none_aggr(&mut self, _: &[GroupKey], depth: usize, balance: &Balance) -> String {
        self.row(depth, &date_label(balance.date), balance.fund)
    }

    fn leaf_aggregated(&mut self, _: &[GroupKey], depth: usize, balance: &Balance) -> String {
        self.row(depth, &date_label(balance.date), balance.fund)
    }

    fn medium_level(
        &mut self,
        _: &[GroupKey],
        depth: usize,
        level: GroupLevel,
        key: &GroupKey,
        child: Subtotaled<String>,
    ) -> String {
        let head = self.row(depth, &format!("{}:", key_label(level, key)), child.total);
        if child.value.is_empty() {
            head
        } else {
            format!("{head}\n{}", child.value)
        }
    }

    fn reduce(&mut self, _: &[GroupKey], _: usize, children: Vec<Subtotaled<String>>) -> String {
        Self::join(children)
    }

    fn reduce_accumulate(
        &mut self,
        _: &[GroupKey],
        _: usize,
        children: Vec<Subtotaled<String>>,
    ) -> String {
        Self::join(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bal(title: u32, content: &str, fund: Decimal) -> Balance {
        Balance {
            title: Some(title),
            content: Some(content.to_string()),
            ..Balance::new(NaiveDate::from_ymd_opt(2024, 3, 1), fund)
        }
    }

    #[test]
    fn test_render_nested() {
        let s = Subtotal::sum(vec![GroupLevel::Title, GroupLevel::Content]);
        let text = TextReport::render(
            &s,
            vec![bal(6602, "rent", dec!(100)), bal(6602, "power", dec!(20.5))],
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "120.50:");
        assert!(lines[1].starts_with("T6602:"));
        assert!(lines[1].ends_with("120.50"));
        assert!(lines[2].starts_with("    power:"));
        assert!(lines[3].starts_with("        2024-03-01"));
        assert!(lines[3].ends_with("20.50"));
        assert!(lines[4].starts_with("    rent:"));
    }

    #[test]
    fn test_render_count() {
        let s = Subtotal::new(vec![GroupLevel::Title], AggregationType::None, GatheringType::Count)
            .unwrap();
        let text = TextReport::render(&s, vec![bal(1, "a", dec!(3)), bal(1, "b", dec!(4))]);
        assert!(text.starts_with("2:"));
    }

    #[test]
    fn test_render_flat_list() {
        let s = Subtotal::sum(vec![]);
        let text = TextReport::render(&s, vec![bal(1, "a", dec!(3))]);
        assert!(text.starts_with("2024-03-01"));
        assert!(text.ends_with("3.00"));
    }
}
