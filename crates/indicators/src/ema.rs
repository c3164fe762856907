use crate::{FilterKind, SmoothingFilter};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Exponential Moving Average (EMA).
#[derive(Debug, Clone)]
pub struct Ema {
    len: usize,
    multiplier: Decimal,
    current: Option<Decimal>,
    count: usize,
    /// Accumulates values for the initial SMA seed.
    seed_sum: Decimal,
}

impl Ema {
    /// # Panics
    ///
    /// Panics if `period` is zero. Use `FilterKind::build` to get an error instead.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "EMA period must be > 0");
        let multiplier = Decimal::TWO / (Decimal::from(period) + Decimal::ONE);
        Self {
            len: period,
            multiplier,
            current: None,
            count: 0,
            seed_sum: Decimal::ZERO,
        }
    }
}

impl SmoothingFilter for Ema {
    fn update(&mut self, _time: DateTime<Utc>, value: Decimal) -> Decimal {
        self.count += 1;

        let next = match self.current {
            Some(prev) if self.count > self.len => (value - prev) * self.multiplier + prev,
            _ => {
                // Accumulate for SMA seed
                self.seed_sum += value;
                self.seed_sum / Decimal::from(self.count)
            }
        };

        self.current = Some(next);
        next
    }

    fn value(&self) -> Option<Decimal> {
        self.current
    }

    fn reset(&mut self) {
        self.current = None;
        self.count = 0;
        self.seed_sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn kind(&self) -> Option<FilterKind> {
        Some(FilterKind::Ema)
    }

    fn is_ready(&self) -> bool {
        self.count >= self.len
    }
}
