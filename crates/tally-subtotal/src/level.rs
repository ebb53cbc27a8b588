//! Grouping levels and subtotal specifications.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tally_core::date::{add_days, to_month_end};

use crate::balance::Balance;
use crate::error::SubtotalError;

/// One level of the grouping hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupLevel {
    /// Primary category code.
    Title,
    /// Secondary category code.
    SubTitle,
    /// Line content.
    Content,
    /// Line remark.
    Remark,
    /// Calendar day.
    Day,
    /// ISO week, keyed by its Monday.
    Week,
    /// Calendar month, keyed by its first day.
    Month,
    /// Calendar year, keyed by January 1st.
    Year,
}

impl GroupLevel {
    /// Whether the level buckets by date.
    #[must_use]
    pub const fn is_date(self) -> bool {
        matches!(self, Self::Day | Self::Week | Self::Month | Self::Year)
    }

    /// First day of the bucket containing a date.
    #[must_use]
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
            _ => date,
        }
    }

    /// Last day of the bucket starting on a date.
    #[must_use]
    pub fn bucket_end(self, start: NaiveDate) -> NaiveDate {
        match self {
            Self::Week => add_days(start, 6),
            Self::Month => to_month_end(start),
            Self::Year => NaiveDate::from_ymd_opt(start.year(), 12, 31).unwrap_or(start),
            _ => start,
        }
    }

    /// The group key of a balance at this level.
    #[must_use]
    pub fn key_of(self, balance: &Balance) -> GroupKey {
        match self {
            Self::Title => GroupKey::Title(balance.title),
            Self::SubTitle => GroupKey::SubTitle(balance.sub_title),
            Self::Content => GroupKey::Content(balance.content.clone()),
            Self::Remark => GroupKey::Remark(balance.remark.clone()),
            _ => GroupKey::Date(balance.date.map(|d| self.bucket_start(d))),
        }
    }
}

impl fmt::Display for GroupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Title => "title",
            Self::SubTitle => "sub-title",
            Self::Content => "content",
            Self::Remark => "remark",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        };
        f.write_str(s)
    }
}

impl FromStr for GroupLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "t" | "title" => Ok(Self::Title),
            "s" | "sub-title" | "subtitle" => Ok(Self::SubTitle),
            "c" | "content" => Ok(Self::Content),
            "r" | "remark" => Ok(Self::Remark),
            "d" | "day" => Ok(Self::Day),
            "w" | "week" => Ok(Self::Week),
            "m" | "month" => Ok(Self::Month),
            "y" | "year" => Ok(Self::Year),
            _ => Err(format!("unknown group level: {s}")),
        }
    }
}

/// The key a group was formed on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    /// Primary category code.
    Title(Option<u32>),
    /// Secondary category code.
    SubTitle(Option<u32>),
    /// Content.
    Content(Option<String>),
    /// Remark.
    Remark(Option<String>),
    /// First day of a date bucket, or `None` for undated balances.
    Date(Option<NaiveDate>),
}

/// Terminal aggregation applied below the last grouping level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregationType {
    /// No aggregation: every balance becomes its own leaf.
    #[default]
    None,
    /// Running balance on each day that has balances.
    ChangedDay,
    /// Running balance on each day of a range.
    EveryDay {
        /// First day.
        from: NaiveDate,
        /// Last day.
        to: NaiveDate,
    },
}

impl AggregationType {
    /// Whether the mode produces a running balance.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// How balances contribute to totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GatheringType {
    /// Amounts are summed.
    #[default]
    Sum,
    /// Every balance counts as one.
    Count,
    /// Amounts are summed and zero leaves are dropped.
    NonZero,
}

/// A validated subtotal specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtotal {
    levels: Vec<GroupLevel>,
    aggregation: AggregationType,
    gathering: GatheringType,
}

impl Subtotal {
    /// Build a specification.
    ///
    /// In running-balance modes no non-date level may follow a date level,
    /// since a running balance does not add across categories.
    pub fn new(
        levels: Vec<GroupLevel>,
        aggregation: AggregationType,
        gathering: GatheringType,
    ) -> Result<Self, SubtotalError> {
        if let AggregationType::EveryDay { from, to } = aggregation {
            if to < from {
                return Err(SubtotalError::EmptyRange { from, to });
            }
        }
        if aggregation.is_running() {
            if let Some(i) = levels.iter().position(|l| l.is_date()) {
                if let Some(level) = levels[i..].iter().find(|l| !l.is_date()) {
                    return Err(SubtotalError::LevelAfterDate {
                        level: *level,
                        after: levels[i],
                    });
                }
            }
        }
        Ok(Self {
            levels,
            aggregation,
            gathering,
        })
    }

    /// A plain sum over the given levels.
    #[must_use]
    pub const fn sum(levels: Vec<GroupLevel>) -> Self {
        Self {
            levels,
            aggregation: AggregationType::None,
            gathering: GatheringType::Sum,
        }
    }

    /// Grouping levels, outermost first.
    #[must_use]
    pub fn levels(&self) -> &[GroupLevel] {
        &self.levels
    }

    /// Terminal aggregation.
    #[must_use]
    pub const fn aggregation(&self) -> AggregationType {
        self.aggregation
    }

    /// Gathering rule.
    #[must_use]
    pub const fn gathering(&self) -> GatheringType {
        self.gathering
    }
}
