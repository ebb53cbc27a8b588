//! The generic subtotal traversal.
//!
//! Balances are grouped by the first remaining level, each group is reduced
//! by the remaining levels, and sibling results are folded back together.
//! The engine computes every numeric total itself; a [`SubtotalTraversal`]
//! only builds the artifact attached to each node.
//!
//! Category levels fold with [`SubtotalTraversal::reduce`]: the total is the
//! sum of the children. In running-balance modes date levels and the daily
//! leaves fold with [`SubtotalTraversal::reduce_accumulate`] instead: the
//! total is the running balance at the end of the group, and the opening
//! balance is carried from one bucket to the next.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tally_core::amount;
use tally_core::date::add_days;

use crate::balance::Balance;
use crate::level::{AggregationType, GatheringType, GroupKey, GroupLevel, Subtotal};

/// A node result: the numeric total plus the caller's artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtotaled<T> {
    /// Numeric total of the node.
    pub total: Decimal,
    /// Artifact built for the node.
    pub value: T,
}

/// Caller-supplied behavior at each node role.
///
/// `path` always holds the keys of the enclosing groups, outermost first.
pub trait SubtotalTraversal {
    /// Artifact produced per node.
    type Output;

    /// Leaf for a single balance when no aggregation is requested.
    fn leaf_none_aggr(&mut self, path: &[GroupKey], depth: usize, balance: &Balance) -> Self::Output;

    /// Leaf for one day of a running balance; `balance.fund` is the running value.
    fn leaf_aggregated(&mut self, path: &[GroupKey], depth: usize, balance: &Balance) -> Self::Output;

    /// Label a group formed at `level` on `key`.
    fn medium_level(
        &mut self,
        path: &[GroupKey],
        depth: usize,
        level: GroupLevel,
        key: &GroupKey,
        child: Subtotaled<Self::Output>,
    ) -> Self::Output;

    /// Fold independent sibling groups.
    fn reduce(
        &mut self,
        path: &[GroupKey],
        depth: usize,
        children: Vec<Subtotaled<Self::Output>>,
    ) -> Self::Output;

    /// Fold ordered sibling groups of a running balance.
    fn reduce_accumulate(
        &mut self,
        path: &[GroupKey],
        depth: usize,
        children: Vec<Subtotaled<Self::Output>>,
    ) -> Self::Output;
}

/// Reduce balances into a nested result.
pub fn traverse<V: SubtotalTraversal>(
    subtotal: &Subtotal,
    balances: impl IntoIterator<Item = Balance>,
    visitor: &mut V,
) -> Subtotaled<V::Output> {
    let balances: Vec<Balance> = balances
        .into_iter()
        .map(|mut b| {
            if subtotal.gathering() == GatheringType::Count {
                b.fund = Decimal::ONE;
            }
            b
        })
        .filter(|b| {
            subtotal.aggregation().is_running()
                || subtotal.gathering() != GatheringType::NonZero
                || !amount::is_zero(b.fund)
        })
        .collect();
    let mut walker = Walker { subtotal, visitor };
    let mut path = Vec::new();
    walker.group(&mut path, balances, 0)
}

struct Walker<'a, V> {
    subtotal: &'a Subtotal,
    visitor: &'a mut V,
}

/// Days of a running balance still to be emitted.
#[derive(Clone, Copy)]
struct Window {
    from: NaiveDate,
    to: NaiveDate,
}

impl<V: SubtotalTraversal> Walker<'_, V> {
    fn levels(&self) -> &[GroupLevel] {
        self.subtotal.levels()
    }

    fn drops_zero(&self) -> bool {
        self.subtotal.gathering() == GatheringType::NonZero
            && self.subtotal.aggregation() != AggregationType::ChangedDay
    }

    /// Category levels, down to where the running axis starts.
    fn group(
        &mut self,
        path: &mut Vec<GroupKey>,
        balances: Vec<Balance>,
        depth: usize,
    ) -> Subtotaled<V::Output> {
        let running = self.subtotal.aggregation().is_running();
        let at_running_axis =
            running && self.levels().get(depth).map_or(true, |l| l.is_date());
        if at_running_axis {
            return self.start_running(path, balances, depth);
        }
        let Some(&level) = self.levels().get(depth) else {
            return self.leaf_none(path, balances, depth);
        };

        let mut groups: BTreeMap<GroupKey, Vec<Balance>> = BTreeMap::new();
        for b in balances {
            groups.entry(level.key_of(&b)).or_default().push(b);
        }

        let mut children = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            path.push(key.clone());
            let child = self.group(path, members, depth + 1);
            path.pop();
            if self.drops_zero() && amount::is_zero(child.total) {
                continue;
            }
            let total = child.total;
            let value = self.visitor.medium_level(path, depth, level, &key, child);
            children.push(Subtotaled { total, value });
        }
        let total = children.iter().map(|c| c.total).sum();
        let value = self.visitor.reduce(path, depth, children);
        Subtotaled { total, value }
    }

    fn leaf_none(
        &mut self,
        path: &[GroupKey],
        balances: Vec<Balance>,
        depth: usize,
    ) -> Subtotaled<V::Output> {
        let children: Vec<_> = balances
            .iter()
            .map(|b| Subtotaled {
                total: b.fund,
                value: self.visitor.leaf_none_aggr(path, depth, b),
            })
            .collect();
        let total = children.iter().map(|c| c.total).sum();
        let value = self.visitor.reduce(path, depth, children);
        Subtotaled { total, value }
    }

    /// Split off the opening balance and walk the date axis.
    fn start_running(
        &mut self,
        path: &mut Vec<GroupKey>,
        balances: Vec<Balance>,
        depth: usize,
    ) -> Subtotaled<V::Output> {
        match self.subtotal.aggregation() {
            AggregationType::EveryDay { from, to } => {
                let (before, within): (Vec<_>, Vec<_>) =
                    balances.into_iter().partition(|b| b.date.map_or(true, |d| d < from));
                let opening = before.iter().map(|b| b.fund).sum();
                let within = within
                    .into_iter()
                    .filter(|b| b.date.is_some_and(|d| d <= to))
                    .collect();
                self.running(path, within, depth, opening, Some(Window { from, to }))
            }
            _ => self.running(path, balances, depth, Decimal::ZERO, None),
        }
    }

    /// Date levels of a running balance.
    fn running(
        &mut self,
        path: &mut Vec<GroupKey>,
        balances: Vec<Balance>,
        depth: usize,
        opening: Decimal,
        window: Option<Window>,
    ) -> Subtotaled<V::Output> {
        let Some(&level) = self.levels().get(depth) else {
            return self.leaf_days(path, balances, depth, opening, window);
        };

        let mut groups: BTreeMap<Option<NaiveDate>, Vec<Balance>> = BTreeMap::new();
        if let Some(w) = window {
            let mut day = level.bucket_start(w.from);
            while day <= w.to {
                groups.insert(Some(day), Vec::new());
                day = add_days(level.bucket_end(day), 1);
            }
        }
        for b in balances {
            groups
                .entry(b.date.map(|d| level.bucket_start(d)))
                .or_default()
                .push(b);
        }

        let mut carry = opening;
        let mut children = Vec::with_capacity(groups.len());
        for (start, members) in groups {
            let inner = match (window, start) {
                (Some(w), Some(s)) => Some(Window {
                    from: s.max(w.from),
                    to: level.bucket_end(s).min(w.to),
                }),
                _ => None,
            };
            let key = GroupKey::Date(start);
            path.push(key.clone());
            let child = self.running(path, members, depth + 1, carry, inner);
            path.pop();
            carry = child.total;
            let value = self.visitor.medium_level(path, depth, level, &key, child);
            children.push(Subtotaled { total: carry, value });
        }
        let value = self.visitor.reduce_accumulate(path, depth, children);
        Subtotaled { total: carry, value }
    }

    /// Daily running balance below the last level.
    fn leaf_days(
        &mut self,
        path: &[GroupKey],
        balances: Vec<Balance>,
        depth: usize,
        opening: Decimal,
        window: Option<Window>,
    ) -> Subtotaled<V::Output> {
        let mut days: BTreeMap<Option<NaiveDate>, Decimal> = BTreeMap::new();
        if let Some(w) = window {
            let mut day = w.from;
            while day <= w.to {
                days.insert(Some(day), Decimal::ZERO);
                day = add_days(day, 1);
            }
        }
        for b in &balances {
            *days.entry(b.date).or_default() += b.fund;
        }

        let mut carry = opening;
        let mut children = Vec::with_capacity(days.len());
        for (date, delta) in days {
            carry += delta;
            if self.drops_zero() && amount::is_zero(carry) {
                continue;
            }
            let leaf = Balance::at(path, date, carry);
            children.push(Subtotaled {
                total: carry,
                value: self.visitor.leaf_aggregated(path, depth, &leaf),
            });
        }
        let value = self.visitor.reduce_accumulate(path, depth, children);
        Subtotaled { total: carry, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Records every leaf it sees.
    #[derive(Default)]
    struct Leaves(Vec<(Option<NaiveDate>, Decimal)>);

    impl SubtotalTraversal for Leaves {
        type Output = ();

        fn leaf_none_aggr(&mut self, _: &[GroupKey], _: usize, b: &Balance) {
            self.0.push((b.date, b.fund));
        }

        fn leaf_aggregated(&mut self, _: &[GroupKey], _: usize, b: &Balance) {
            self.0.push((b.date, b.fund));
        }

        fn medium_level(&mut self, _: &[GroupKey], _: usize, _: GroupLevel, _: &GroupKey, _: Subtotaled<()>) {}

        fn reduce(&mut self, _: &[GroupKey], _: usize, _: Vec<Subtotaled<()>>) {}

        fn reduce_accumulate(&mut self, _: &[GroupKey], _: usize, _: Vec<Subtotaled<()>>) {}
    }

    fn bal(title: u32, d: NaiveDate, fund: Decimal) -> Balance {
        Balance {
            title: Some(title),
            ..Balance::new(Some(d), fund)
        }
    }

    #[test]
    fn test_plain_sum_by_title() {
        let s = Subtotal::sum(vec![GroupLevel::Title]);
        let mut v = Leaves::default();
        let r = traverse(
            &s,
            vec![
                bal(1001, date(2024, 1, 1), dec!(10)),
                bal(1002, date(2024, 1, 2), dec!(5)),
                bal(1001, date(2024, 1, 3), dec!(-3)),
            ],
            &mut v,
        );
        assert_eq!(r.total, dec!(12));
        assert_eq!(v.0.len(), 3);
    }

    #[test]
    fn test_changed_day_running_balance() {
        let s = Subtotal::new(vec![GroupLevel::Month], AggregationType::ChangedDay, GatheringType::Sum)
            .unwrap();
        let mut v = Leaves::default();
        let r = traverse(
            &s,
            vec![
                bal(1001, date(2024, 1, 5), dec!(10)),
                bal(1001, date(2024, 1, 5), dec!(5)),
                bal(1001, date(2024, 2, 1), dec!(-15)),
                bal(1001, date(2024, 3, 1), dec!(7)),
            ],
            &mut v,
        );
        assert_eq!(r.total, dec!(7));
        assert_eq!(
            v.0,
            vec![
                (Some(date(2024, 1, 5)), dec!(15)),
                (Some(date(2024, 2, 1)), dec!(0)),
                (Some(date(2024, 3, 1)), dec!(7)),
            ]
        );
    }

    #[test]
    fn test_changed_day_keeps_zero_under_non_zero() {
        let s = Subtotal::new(vec![], AggregationType::ChangedDay, GatheringType::NonZero).unwrap();
        let mut v = Leaves::default();
        traverse(
            &s,
            vec![
                bal(1, date(2024, 1, 1), dec!(4)),
                bal(1, date(2024, 1, 2), dec!(-4)),
            ],
            &mut v,
        );
        assert_eq!(v.0.len(), 2);
        assert_eq!(v.0[1].1, dec!(0));
    }

    #[test]
    fn test_every_day_carries_opening() {
        let s = Subtotal::new(
            vec![],
            AggregationType::EveryDay {
                from: date(2024, 1, 2),
                to: date(2024, 1, 4),
            },
            GatheringType::Sum,
        )
        .unwrap();
        let mut v = Leaves::default();
        let r = traverse(
            &s,
            vec![
                Balance::new(None, dec!(1)),
                bal(1, date(2024, 1, 1), dec!(2)),
                bal(1, date(2024, 1, 3), dec!(3)),
                bal(1, date(2024, 1, 9), dec!(100)),
            ],
            &mut v,
        );
        assert_eq!(r.total, dec!(6));
        assert_eq!(
            v.0,
            vec![
                (Some(date(2024, 1, 2)), dec!(3)),
                (Some(date(2024, 1, 3)), dec!(6)),
                (Some(date(2024, 1, 4)), dec!(6)),
            ]
        );
    }

    #[test]
    fn test_non_zero_drops_zero_records() {
        let s = Subtotal::new(vec![GroupLevel::Title], AggregationType::None, GatheringType::NonZero)
            .unwrap();
        let mut v = Leaves::default();
        let r = traverse(
            &s,
            vec![bal(1, date(2024, 1, 1), dec!(0)), bal(2, date(2024, 1, 1), dec!(3))],
            &mut v,
        );
        assert_eq!(r.total, dec!(3));
        assert_eq!(v.0.len(), 1);
    }

    #[test]
    fn test_count() {
        let s = Subtotal::new(vec![GroupLevel::Title], AggregationType::None, GatheringType::Count)
            .unwrap();
        let r = traverse(
            &s,
            vec![bal(1, date(2024, 1, 1), dec!(7)), bal(2, date(2024, 1, 1), dec!(-9))],
            &mut Leaves::default(),
        );
        assert_eq!(r.total, dec!(2));
    }
}
