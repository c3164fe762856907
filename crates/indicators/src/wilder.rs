use crate::{FilterKind, SmoothingFilter};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Wilder's moving average (a.k.a. RMA, smoothed moving average).
///
/// The first `period` samples are averaged arithmetically; the mean at sample
/// `period` seeds the recursion `(prev * (period - 1) + x) / period`.
/// Before the seed the running mean of the samples so far is reported.
#[derive(Debug, Clone)]
pub struct Wilder {
    len: usize,
    seed_sum: Decimal,
    current: Option<Decimal>,
    count: usize,
}

impl Wilder {
    /// # Panics
    ///
    /// Panics if `period` is zero. Use `FilterKind::build` to get an error instead.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Wilder period must be > 0");
        Self {
            len: period,
            seed_sum: Decimal::ZERO,
            current: None,
            count: 0,
        }
    }
}

impl SmoothingFilter for Wilder {
    fn update(&mut self, _time: DateTime<Utc>, value: Decimal) -> Decimal {
        self.count += 1;

        let next = match self.current {
            Some(prev) if self.count > self.len => {
                let period_dec = Decimal::from(self.len);
                (prev * (period_dec - Decimal::ONE) + value) / period_dec
            }
            _ => {
                // Warm-up: running mean, which equals the SMA seed at `len`
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
        self.seed_sum = Decimal::ZERO;
        self.current = None;
        self.count = 0;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn kind(&self) -> Option<FilterKind> {
        Some(FilterKind::Wilder)
    }

    fn is_ready(&self) -> bool {
        self.count >= self.len
    }
}
