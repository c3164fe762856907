use crate::{FilterKind, SmoothingFilter};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Simple Moving Average (SMA).
///
/// Averages whatever is in the window, so the output is defined from the
/// first sample; it becomes ready once the window is full.
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    buffer: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    /// # Panics
    ///
    /// Panics if `period` is zero. Use `FilterKind::build` to get an error instead.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be > 0");
        Self {
            len: period,
            buffer: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
        }
    }
}

impl SmoothingFilter for Sma {
    fn update(&mut self, _time: DateTime<Utc>, value: Decimal) -> Decimal {
        self.sum += value;
        self.buffer.push_back(value);

        if self.buffer.len() > self.len {
            if let Some(removed) = self.buffer.pop_front() {
                self.sum -= removed;
            }
        }

        self.sum / Decimal::from(self.buffer.len())
    }

    fn value(&self) -> Option<Decimal> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.sum / Decimal::from(self.buffer.len()))
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn kind(&self) -> Option<FilterKind> {
        Some(FilterKind::Sma)
    }

    fn is_ready(&self) -> bool {
        self.buffer.len() == self.len
    }
}
