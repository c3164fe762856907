//! Property tests for the AMW trend trailing stop.
//!
//! Uses proptest to verify:
//! 1. Ratchet monotonicity: the level only tightens until a flip
//! 2. Flip placement: a flip re-anchors the level on the far side of the close
//! 3. Determinism and reset replay
//! 4. Readiness follows both smoothing filters

use chrono::DateTime;
use proptest::prelude::*;
use rust_decimal::Decimal;
use trailstop_core::{Bar, Direction};
use trailstop_indicators::true_range::true_range;
use trailstop_indicators::{AmwTrend, AmwTrendConfig, FilterKind, TrendPoint};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((5_000i64..15_000, 0i64..300, 0i64..300), 3..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (close, up, down))| {
                let ts = DateTime::from_timestamp(1_700_000_000 + i as i64 * 60, 0).unwrap();
                Bar::hlc(
                    "ES",
                    ts,
                    Decimal::new(close + up, 2),
                    Decimal::new(close - down, 2),
                    Decimal::new(close, 2),
                )
            })
            .collect()
    })
}

fn arb_kind() -> impl Strategy<Value = FilterKind> {
    prop::sample::select(FilterKind::ALL.to_vec())
}

fn arb_config() -> impl Strategy<Value = AmwTrendConfig> {
    (1usize..12, 0i64..50, arb_kind(), 1usize..12, 0i64..50, arb_kind()).prop_map(
        |(period_long, ml, filter_long, period_short, ms, filter_short)| AmwTrendConfig {
            period_long,
            multiple_long: Decimal::new(ml, 1),
            filter_long,
            period_short,
            multiple_short: Decimal::new(ms, 1),
            filter_short,
        },
    )
}

fn run(config: &AmwTrendConfig, bars: &[Bar]) -> Vec<TrendPoint> {
    let mut amw = AmwTrend::new(config.clone()).unwrap();
    bars.iter().map(|b| amw.step(b)).collect()
}

// ── 1. Ratchet Monotonicity ──────────────────────────────────────────

proptest! {
    /// Without a flip, a long level never falls and a short level never rises.
    #[test]
    fn level_ratchets_until_flip(config in arb_config(), bars in arb_bars()) {
        let points = run(&config, &bars);
        for pair in points.windows(2).skip(1) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.flipped {
                continue;
            }
            prop_assert_eq!(prev.direction, cur.direction);
            match cur.direction {
                Some(Direction::Long) => prop_assert!(cur.level >= prev.level),
                Some(Direction::Short) => prop_assert!(cur.level <= prev.level),
                None => prop_assert!(false, "direction missing after warm-up"),
            }
        }
    }

    /// The level is defined from the first bar; direction from the second.
    #[test]
    fn level_defined_from_first_bar(config in arb_config(), bars in arb_bars()) {
        let mut amw = AmwTrend::new(config).unwrap();
        for (i, bar) in bars.iter().enumerate() {
            let level = amw.update(bar);
            prop_assert_eq!(amw.value(), Some(level));
            prop_assert_eq!(amw.direction().is_some(), i >= 1);
        }
        prop_assert_eq!(amw.samples(), bars.len());
    }
}

// ── 2. Flip Placement ────────────────────────────────────────────────

proptest! {
    /// A flip to long puts the level at or below the close, a flip to short
    /// at or above it.
    #[test]
    fn flip_lands_on_far_side(config in arb_config(), bars in arb_bars()) {
        for point in run(&config, &bars).iter().filter(|p| p.flipped) {
            match point.direction {
                Some(Direction::Long) => prop_assert!(point.level <= point.close),
                Some(Direction::Short) => prop_assert!(point.level >= point.close),
                None => prop_assert!(false, "flip without direction"),
            }
        }
    }

    /// The reported true range matches the closed-form definition.
    #[test]
    fn true_range_matches_definition(config in arb_config(), bars in arb_bars()) {
        let points = run(&config, &bars);
        prop_assert_eq!(points[0].true_range, bars[0].high - bars[0].low);
        for i in 1..bars.len() {
            let expected = true_range(Some(bars[i - 1].close), bars[i].high, bars[i].low);
            prop_assert_eq!(points[i].true_range, expected);
        }
    }
}

// ── 3. Determinism ───────────────────────────────────────────────────

proptest! {
    /// Two fresh engines, and one engine after reset, produce the same series.
    #[test]
    fn replay_is_deterministic(config in arb_config(), bars in arb_bars()) {
        let first = run(&config, &bars);
        let second = run(&config, &bars);
        prop_assert_eq!(&first, &second);

        let mut amw = AmwTrend::new(config).unwrap();
        for bar in &bars {
            amw.update(bar);
        }
        amw.reset();
        let replayed: Vec<TrendPoint> = bars.iter().map(|b| amw.step(b)).collect();
        prop_assert_eq!(&first, &replayed);
    }
}

// ── 4. Readiness ─────────────────────────────────────────────────────

proptest! {
    /// Ready exactly when both filters are, and never before the warm-up period.
    #[test]
    fn ready_follows_filters(config in arb_config(), bars in arb_bars()) {
        let mut amw = AmwTrend::new(config).unwrap();
        for bar in &bars {
            amw.update(bar);
            let both = amw.filter_long().is_ready() && amw.filter_short().is_ready();
            prop_assert_eq!(amw.is_ready(), both);
            if amw.is_ready() {
                prop_assert!(amw.samples() >= amw.warm_up_period());
            }
        }
    }
}
