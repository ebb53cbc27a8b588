//! Integration tests for the instrument scheduler.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::{
    AmortParams, AmortizeInterval, AssetParams, DepreciationMethod, EntryKind, EntryTemplate,
    Instrument, ItemKind, ScheduleItem,
};
use tally_schedule::{book_value_on, recompute, regularize};

// ============================================================================
// Helpers
// ============================================================================

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn asset(value: Decimal, life: u32) -> Instrument {
    Instrument::asset(
        "a1",
        "Server",
        date(2024, 1, 1),
        value,
        AssetParams {
            life: Some(life),
            salvage: Some(dec!(0)),
            method: DepreciationMethod::StraightLine,
            title: 1601,
            depreciation_title: 1602,
            devaluation_title: 1603,
            expense_title: 6602,
            expense_sub_title: None,
        },
    )
}

fn amortization(value: Decimal, days: u32, interval: AmortizeInterval) -> Instrument {
    Instrument::amortization(
        "p1",
        "Insurance",
        date(2024, 1, 1),
        value,
        AmortParams {
            total_days: Some(days),
            interval: Some(interval),
            template: EntryTemplate::new(EntryKind::Amortization),
        },
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_monthly_amortization() {
    let mut rent = amortization(dec!(1200), 360, AmortizeInterval::SameDayOfMonth);
    recompute(&mut rent).unwrap();
    assert_eq!(rent.schedule.len(), 12);
    for (n, item) in rent.schedule.iter().enumerate() {
        assert_eq!(item.kind, ItemKind::Amortization { amount: dec!(100) });
        assert_eq!(item.date, Some(date(2024, n as u32 + 1, 1)));
    }
    assert_eq!(rent.schedule[11].value, dec!(0));
}

#[test]
fn test_straight_line_one_year() {
    let mut server = asset(dec!(12000), 1);
    recompute(&mut server).unwrap();
    let deps: Vec<_> = server
        .schedule
        .iter()
        .filter(|i| matches!(i.kind, ItemKind::Depreciation { .. }))
        .collect();
    assert_eq!(deps.len(), 12);
    assert!(deps
        .iter()
        .all(|i| i.kind == ItemKind::Depreciation { amount: dec!(1000) }));
    assert_eq!(deps[11].date, Some(date(2025, 1, 31)));
    assert_eq!(deps[11].value, dec!(0));
    assert_eq!(book_value_on(&server, Some(date(2024, 6, 30))), Some(dec!(7000)));
}

#[test]
fn test_amortization_keeps_links_by_date() {
    let mut rent = amortization(dec!(1200), 360, AmortizeInterval::SameDayOfMonth);
    recompute(&mut rent).unwrap();
    rent.schedule[3].entry_id = Some("e4".into());
    rent.value = Some(dec!(2400));
    recompute(&mut rent).unwrap();
    assert_eq!(rent.schedule[3].entry_id.as_deref(), Some("e4"));
    assert_eq!(rent.schedule[3].kind, ItemKind::Amortization { amount: dec!(200) });
}

#[test]
fn test_ignored_step_comes_off_total() {
    let mut rent = amortization(dec!(1200), 360, AmortizeInterval::SameDayOfMonth);
    rent.schedule
        .push(ScheduleItem::amortization(Some(date(2024, 1, 1)), dec!(100.5)).ignored());
    recompute(&mut rent).unwrap();
    assert_eq!(rent.schedule.len(), 12);
    let total: Decimal = rent
        .schedule
        .iter()
        .map(|i| match i.kind {
            ItemKind::Amortization { amount } => amount,
            _ => Decimal::ZERO,
        })
        .sum();
    assert_eq!(total, dec!(1200));
    assert_eq!(rent.schedule[11].value, dec!(0));
}

// ============================================================================
// Properties
// ============================================================================

fn arb_interval() -> impl Strategy<Value = AmortizeInterval> {
    prop_oneof![
        Just(AmortizeInterval::EveryDay),
        Just(AmortizeInterval::SameDayOfWeek),
        Just(AmortizeInterval::LastDayOfWeek),
        Just(AmortizeInterval::SameDayOfMonth),
        Just(AmortizeInterval::LastDayOfMonth),
        Just(AmortizeInterval::SameDayOfYear),
        Just(AmortizeInterval::LastDayOfYear),
    ]
}

fn arb_item() -> impl Strategy<Value = ScheduleItem> {
    let date = prop::option::of((2023i32..2027, 1u32..13, 1u32..29).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }));
    let amount = (1i64..500_000).prop_map(|n| Decimal::new(n, 2));
    (date, amount, 0u8..5, any::<bool>()).prop_map(|(date, a, kind, ignored)| {
        let kind = match kind {
            0 => ItemKind::Acquisition { orig_value: a },
            1 => ItemKind::Depreciation { amount: a },
            2 => ItemKind::Devaluation { fair_value: a },
            3 => ItemKind::Disposition { net_value: a },
            _ => ItemKind::Depreciation { amount: a / dec!(3) },
        };
        ScheduleItem {
            ignored,
            ..ScheduleItem::new(date, kind)
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_regularize_idempotent(items in prop::collection::vec(arb_item(), 0..12)) {
        let mut server = asset(dec!(10000), 3);
        server.schedule = items;
        regularize(&mut server);
        let once = server.clone();
        regularize(&mut server);
        prop_assert_eq!(server, once);
    }

    #[test]
    fn prop_running_value_follows_items(items in prop::collection::vec(arb_item(), 0..12)) {
        let mut server = asset(dec!(10000), 3);
        server.schedule = items;
        regularize(&mut server);
        prop_assert!(server.schedule[0].is_acquisition());
        let mut prev = Decimal::ZERO;
        for item in &server.schedule {
            match item.kind {
                ItemKind::Acquisition { orig_value } => prop_assert_eq!(item.value, prev + orig_value),
                ItemKind::Depreciation { amount } => prop_assert_eq!(item.value, prev - amount),
                ItemKind::Devaluation { fair_value } => {
                    prop_assert_eq!(item.value, fair_value);
                    if !item.ignored {
                        prop_assert!(fair_value < prev);
                    }
                }
                ItemKind::Disposition { net_value } if item.ignored => {
                    prop_assert_eq!(item.value, prev - net_value);
                }
                ItemKind::Disposition { net_value } => {
                    prop_assert_eq!(net_value, prev);
                    prop_assert_eq!(item.value, Decimal::ZERO);
                }
                ItemKind::Amortization { .. } => {}
            }
            prev = item.value;
        }
    }

    #[test]
    fn prop_amortization_sums_exactly(
        cents in 1i64..100_000_000,
        days in 1u32..1500,
        interval in arb_interval(),
    ) {
        let value = Decimal::new(cents, 2);
        let mut inst = amortization(value, days, interval);
        recompute(&mut inst).unwrap();
        let total: Decimal = inst
            .schedule
            .iter()
            .map(|i| match i.kind {
                ItemKind::Amortization { amount } => amount,
                _ => Decimal::ZERO,
            })
            .sum();
        prop_assert!(!inst.schedule.is_empty());
        prop_assert_eq!(total, value);
        prop_assert_eq!(inst.schedule.last().unwrap().value, Decimal::ZERO);
        let mut prev = value;
        for item in &inst.schedule {
            prop_assert!(item.value <= prev);
            prev = item.value;
        }
    }

    #[test]
    fn prop_recompute_idempotent(cents in 100i64..10_000_000, life in 1u32..6) {
        let mut server = asset(Decimal::new(cents, 2), life);
        recompute(&mut server).unwrap();
        let once = server.clone();
        recompute(&mut server).unwrap();
        prop_assert_eq!(server, once);
    }
}
