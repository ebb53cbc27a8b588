//! Balances: the flat records the subtotal engine groups.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::Entry;
use tally_query::{LineAtom, Query};

use crate::level::GroupKey;

/// One amount with the coordinates it can be grouped on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Date of the owning entry.
    pub date: Option<NaiveDate>,
    /// Primary category code.
    pub title: Option<u32>,
    /// Secondary category code.
    pub sub_title: Option<u32>,
    /// Content.
    pub content: Option<String>,
    /// Remark.
    pub remark: Option<String>,
    /// Amount.
    pub fund: Decimal,
}

impl Balance {
    /// A balance with only a date and an amount.
    #[must_use]
    pub fn new(date: Option<NaiveDate>, fund: Decimal) -> Self {
        Self {
            date,
            fund,
            ..Self::default()
        }
    }

    /// A balance carrying the coordinates named by a group path.
    #[must_use]
    pub fn at(path: &[GroupKey], date: Option<NaiveDate>, fund: Decimal) -> Self {
        let mut b = Self::new(date, fund);
        for key in path {
            match key {
                GroupKey::Title(t) => b.title = *t,
                GroupKey::SubTitle(s) => b.sub_title = *s,
                GroupKey::Content(c) => b.content.clone_from(c),
                GroupKey::Remark(r) => b.remark.clone_from(r),
                GroupKey::Date(_) => {}
            }
        }
        b
    }
}

/// Flatten the lines of entries into balances.
///
/// Only lines matching `lines` are kept when it is given.
pub fn balances_of<'a>(
    entries: impl IntoIterator<Item = &'a Entry>,
    lines: Option<&Query<LineAtom>>,
) -> Vec<Balance> {
    entries
        .into_iter()
        .flat_map(|entry| {
            entry
                .lines
                .iter()
                .filter(move |l| lines.map_or(true, |q| q.evaluate(l)))
                .map(move |l| Balance {
                    date: entry.date,
                    title: l.title,
                    sub_title: l.sub_title,
                    content: l.content.clone(),
                    remark: l.remark.clone(),
                    fund: l.amount_or_zero(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::EntryLine;

    #[test]
    fn test_balances_of_filters_lines() {
        let entry = Entry::new(NaiveDate::from_ymd_opt(2024, 1, 2))
            .with_line(EntryLine::new(1001, dec!(-30)))
            .with_line(EntryLine::new(6602, dec!(30)).with_content("rent"));
        let all = balances_of([&entry], None);
        assert_eq!(all.len(), 2);

        let q = Query::Atom(LineAtom::new(EntryLine::pattern(6602)));
        let some = balances_of([&entry], Some(&q));
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].content.as_deref(), Some("rent"));
        assert_eq!(some[0].date, entry.date);
        assert_eq!(some[0].fund, dec!(30));
    }
}
