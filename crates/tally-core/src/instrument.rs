//! Distributed instruments and their schedules.
//!
//! A distributed instrument spreads a declared value over time: a depreciable
//! [asset](AssetParams) or an amortizable prepaid/deferred item
//! ([`AmortParams`]). Its [`ScheduleItem`]s are the dated effects on book
//! value, kept sorted and carrying a derived running value that is always
//! recomputed top-to-bottom, never patched in place.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entry::EntryKind;
use crate::template::{EntryTemplate, TemplateLine};

/// How an asset depreciates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepreciationMethod {
    /// No depreciation is derived.
    #[default]
    None,
    /// Equal monthly amounts over the useful life.
    StraightLine,
    /// Sum-of-the-years'-digits.
    SumOfTheYear,
    /// Double-declining-balance (not supported).
    DoubleDeclineMethod,
}

impl FromStr for DepreciationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "sl" | "straight-line" => Ok(Self::StraightLine),
            "sy" | "sum-of-the-year" => Ok(Self::SumOfTheYear),
            "dd" | "double-decline" => Ok(Self::DoubleDeclineMethod),
            _ => Err(format!("unknown depreciation method: {s}")),
        }
    }
}

/// When amortization steps fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmortizeInterval {
    /// Every day.
    EveryDay,
    /// The same weekday each week.
    SameDayOfWeek,
    /// Sunday of each week.
    LastDayOfWeek,
    /// The same day of each month.
    SameDayOfMonth,
    /// The last day of each month.
    LastDayOfMonth,
    /// The same day of each year.
    SameDayOfYear,
    /// December 31st of each year.
    LastDayOfYear,
}

impl FromStr for AmortizeInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "d" | "every-day" => Ok(Self::EveryDay),
            "w" | "same-day-of-week" => Ok(Self::SameDayOfWeek),
            "w-end" | "last-day-of-week" => Ok(Self::LastDayOfWeek),
            "m" | "same-day-of-month" => Ok(Self::SameDayOfMonth),
            "m-end" | "last-day-of-month" => Ok(Self::LastDayOfMonth),
            "y" | "same-day-of-year" => Ok(Self::SameDayOfYear),
            "y-end" | "last-day-of-year" => Ok(Self::LastDayOfYear),
            _ => Err(format!("unknown amortize interval: {s}")),
        }
    }
}

/// Parameters of a depreciable asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetParams {
    /// Useful life in years.
    #[serde(default)]
    pub life: Option<u32>,
    /// Salvage value at the end of the useful life.
    #[serde(default)]
    pub salvage: Option<Decimal>,
    /// Depreciation method.
    #[serde(default)]
    pub method: DepreciationMethod,
    /// Category code of the asset itself.
    pub title: u32,
    /// Category code of accumulated depreciation.
    pub depreciation_title: u32,
    /// Category code of the devaluation allowance.
    pub devaluation_title: u32,
    /// Category code of the expense side.
    pub expense_title: u32,
    /// Secondary category code of the expense side.
    #[serde(default)]
    pub expense_sub_title: Option<u32>,
}

/// Parameters of an amortization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortParams {
    /// Total span in days.
    #[serde(default)]
    pub total_days: Option<u32>,
    /// Step interval policy.
    #[serde(default)]
    pub interval: Option<AmortizeInterval>,
    /// Shape of the generated entries.
    pub template: EntryTemplate,
}

/// Instrument-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentParams {
    /// A depreciable asset.
    Asset(AssetParams),
    /// An amortizable item.
    Amortization(AmortParams),
}

/// The two instrument kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// A depreciable asset.
    Asset,
    /// An amortizable item.
    Amortization,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset => f.write_str("asset"),
            Self::Amortization => f.write_str("amortization"),
        }
    }
}

/// Payload of a schedule item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Acquisition at an original value.
    Acquisition {
        /// Original value added to book value.
        orig_value: Decimal,
    },
    /// Depreciation by an amount.
    Depreciation {
        /// Amount subtracted from book value.
        amount: Decimal,
    },
    /// Devaluation down to a fair value.
    Devaluation {
        /// Fair value the book value is clamped to.
        fair_value: Decimal,
    },
    /// Disposition realizing a net value.
    Disposition {
        /// Net book value realized.
        net_value: Decimal,
    },
    /// One amortization step.
    Amortization {
        /// Amount amortized.
        amount: Decimal,
    },
}

impl ItemKind {
    /// Tie-break order of items sharing a date.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Acquisition { .. } => 0,
            Self::Depreciation { .. } => 1,
            Self::Devaluation { .. } => 2,
            Self::Amortization { .. } => 3,
            Self::Disposition { .. } => 4,
        }
    }

    /// Short label of the item kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Acquisition { .. } => "acquisition",
            Self::Depreciation { .. } => "depreciation",
            Self::Devaluation { .. } => "devaluation",
            Self::Disposition { .. } => "disposition",
            Self::Amortization { .. } => "amortization",
        }
    }
}

/// One dated effect on an instrument's book value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Date, or `None` for an undated (collapsed) item.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Id of the generated or registered entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    /// Free-text remark, copied onto generated lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// The item exists structurally but is never regenerated or recomputed.
    #[serde(default)]
    pub ignored: bool,
    /// Derived running book value (assets) or residue (amortizations).
    #[serde(default)]
    pub value: Decimal,
    /// Payload.
    pub kind: ItemKind,
}

impl ScheduleItem {
    /// Create an item.
    #[must_use]
    pub const fn new(date: Option<NaiveDate>, kind: ItemKind) -> Self {
        Self {
            date,
            entry_id: None,
            remark: None,
            ignored: false,
            value: Decimal::ZERO,
            kind,
        }
    }

    /// An acquisition item.
    #[must_use]
    pub const fn acquisition(date: Option<NaiveDate>, orig_value: Decimal) -> Self {
        Self::new(date, ItemKind::Acquisition { orig_value })
    }

    /// A depreciation item.
    #[must_use]
    pub const fn depreciation(date: Option<NaiveDate>, amount: Decimal) -> Self {
        Self::new(date, ItemKind::Depreciation { amount })
    }

    /// A devaluation item.
    #[must_use]
    pub const fn devaluation(date: Option<NaiveDate>, fair_value: Decimal) -> Self {
        Self::new(date, ItemKind::Devaluation { fair_value })
    }

    /// A disposition item.
    #[must_use]
    pub const fn disposition(date: Option<NaiveDate>) -> Self {
        Self::new(
            date,
            ItemKind::Disposition {
                net_value: Decimal::ZERO,
            },
        )
    }

    /// An amortization step.
    #[must_use]
    pub const fn amortization(date: Option<NaiveDate>, amount: Decimal) -> Self {
        Self::new(date, ItemKind::Amortization { amount })
    }

    /// Mark the item as ignored.
    #[must_use]
    pub const fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Link the item to an entry.
    #[must_use]
    pub fn linked(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }

    /// Whether this item is an acquisition.
    #[must_use]
    pub const fn is_acquisition(&self) -> bool {
        matches!(self.kind, ItemKind::Acquisition { .. })
    }
}

/// A depreciable asset or amortizable item, generalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Declared date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Declared total value.
    #[serde(default)]
    pub value: Option<Decimal>,
    /// Free-text remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// The whole instrument is exempt from recomputation and reconciliation.
    #[serde(default)]
    pub ignored: bool,
    /// Instrument-specific parameters.
    pub params: InstrumentParams,
    /// The schedule.
    #[serde(default)]
    pub schedule: Vec<ScheduleItem>,
}

impl Instrument {
    /// Create an asset.
    #[must_use]
    pub fn asset(
        id: impl Into<String>,
        name: impl Into<String>,
        date: NaiveDate,
        value: Decimal,
        params: AssetParams,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date: Some(date),
            value: Some(value),
            remark: None,
            ignored: false,
            params: InstrumentParams::Asset(params),
            schedule: Vec::new(),
        }
    }

    /// Create an amortization.
    #[must_use]
    pub fn amortization(
        id: impl Into<String>,
        name: impl Into<String>,
        date: NaiveDate,
        value: Decimal,
        params: AmortParams,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date: Some(date),
            value: Some(value),
            remark: None,
            ignored: false,
            params: InstrumentParams::Amortization(params),
            schedule: Vec::new(),
        }
    }

    /// Instrument kind.
    #[must_use]
    pub const fn kind(&self) -> InstrumentKind {
        match self.params {
            InstrumentParams::Asset(_) => InstrumentKind::Asset,
            InstrumentParams::Amortization(_) => InstrumentKind::Amortization,
        }
    }

    /// Content written on lines of entries generated for this instrument.
    #[must_use]
    pub fn content_key(&self) -> String {
        self.id.to_uppercase()
    }

    /// Entry template for a schedule item kind, if entries of that kind are generated.
    #[must_use]
    pub fn template_for(&self, kind: &ItemKind) -> Option<EntryTemplate> {
        match (&self.params, kind) {
            (InstrumentParams::Amortization(p), ItemKind::Amortization { .. }) => {
                Some(p.template.clone())
            }
            (InstrumentParams::Asset(p), ItemKind::Acquisition { .. }) => Some(
                EntryTemplate::new(EntryKind::Ordinary)
                    .with_line(TemplateLine::new(p.title, Decimal::ONE).with_content(self.content_key())),
            ),
            (InstrumentParams::Asset(p), ItemKind::Depreciation { .. }) => Some(
                EntryTemplate::new(EntryKind::Depreciation)
                    .with_line(
                        TemplateLine::new(p.depreciation_title, Decimal::NEGATIVE_ONE)
                            .with_content(self.content_key()),
                    )
                    .with_line(self.expense_line(p)),
            ),
            (InstrumentParams::Asset(p), ItemKind::Devaluation { .. }) => Some(
                EntryTemplate::new(EntryKind::Devaluation)
                    .with_line(
                        TemplateLine::new(p.devaluation_title, Decimal::NEGATIVE_ONE)
                            .with_content(self.content_key()),
                    )
                    .with_line(self.expense_line(p)),
            ),
            _ => None,
        }
    }

    fn expense_line(&self, p: &AssetParams) -> TemplateLine {
        TemplateLine::new(p.expense_title, Decimal::ONE)
            .with_sub_title(p.expense_sub_title)
            .with_content(self.content_key())
    }

    /// Every template this instrument generates entries from, with a sample item kind.
    #[must_use]
    pub fn templates(&self) -> Vec<(ItemKind, EntryTemplate)> {
        let kinds: &[ItemKind] = match self.params {
            InstrumentParams::Amortization(_) => &[ItemKind::Amortization {
                amount: Decimal::ZERO,
            }],
            InstrumentParams::Asset(_) => &[
                ItemKind::Acquisition {
                    orig_value: Decimal::ZERO,
                },
                ItemKind::Depreciation {
                    amount: Decimal::ZERO,
                },
                ItemKind::Devaluation {
                    fair_value: Decimal::ZERO,
                },
            ],
        };
        kinds
            .iter()
            .filter_map(|k| self.template_for(k).map(|t| (*k, t)))
            .collect()
    }

    /// The amount an entry for the item at `index` scales its template by.
    ///
    /// Devaluations derive it from the previous item's book value, so the
    /// schedule must be regularized. Dispositions derive nothing.
    #[must_use]
    pub fn derived_amount(&self, index: usize) -> Option<Decimal> {
        let item = self.schedule.get(index)?;
        match item.kind {
            ItemKind::Acquisition { orig_value } => Some(orig_value),
            ItemKind::Depreciation { amount } | ItemKind::Amortization { amount } => Some(amount),
            ItemKind::Devaluation { fair_value } => {
                let before = index
                    .checked_sub(1)
                    .and_then(|i| self.schedule.get(i))
                    .map_or(Decimal::ZERO, |p| p.value);
                Some(before - fair_value)
            }
            ItemKind::Disposition { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn laptop() -> Instrument {
        Instrument::asset(
            "a1b2",
            "Laptop",
            date(2024, 1, 1),
            dec!(12000),
            AssetParams {
                life: Some(1),
                salvage: Some(dec!(0)),
                method: DepreciationMethod::StraightLine,
                title: 1601,
                depreciation_title: 1602,
                devaluation_title: 1603,
                expense_title: 6602,
                expense_sub_title: Some(7),
            },
        )
    }

    #[test]
    fn test_asset_templates() {
        let asset = laptop();
        let dep = asset
            .template_for(&ItemKind::Depreciation { amount: dec!(0) })
            .unwrap();
        assert_eq!(dep.kind, EntryKind::Depreciation);
        assert_eq!(dep.lines.len(), 2);
        assert_eq!(dep.lines[0].title, Some(1602));
        assert_eq!(dep.lines[0].content.as_deref(), Some("A1B2"));
        assert_eq!(dep.lines[1].sub_title, Some(7));
        assert!(asset
            .template_for(&ItemKind::Disposition { net_value: dec!(0) })
            .is_none());
        assert_eq!(asset.templates().len(), 3);
    }

    #[test]
    fn test_derived_amount_of_devaluation() {
        let mut asset = laptop();
        let mut acq = ScheduleItem::acquisition(asset.date, dec!(12000));
        acq.value = dec!(12000);
        asset.schedule = vec![acq, ScheduleItem::devaluation(Some(date(2024, 3, 31)), dec!(9000))];
        assert_eq!(asset.derived_amount(0), Some(dec!(12000)));
        assert_eq!(asset.derived_amount(1), Some(dec!(3000)));
        assert_eq!(asset.derived_amount(2), None);
    }

    #[test]
    fn test_priority_order() {
        assert!(
            ItemKind::Acquisition { orig_value: dec!(0) }.priority()
                < ItemKind::Depreciation { amount: dec!(0) }.priority()
        );
        assert!(
            ItemKind::Devaluation { fair_value: dec!(0) }.priority()
                < ItemKind::Disposition { net_value: dec!(0) }.priority()
        );
    }
}
