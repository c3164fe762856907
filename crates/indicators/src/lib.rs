pub mod amw_trend;
pub mod ema;
pub mod sma;
pub mod true_range;
pub mod wilder;

pub use amw_trend::{AmwTrend, AmwTrendConfig, Phase, TrendPoint};
pub use true_range::TrueRange;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for streaming smoothing filters (moving averages).
/// Feed one timestamped value at a time; the filter maintains internal state.
///
/// Unlike a finished indicator, a filter always returns a value: during
/// warm-up it reports a provisional estimate and `is_ready` stays false.
pub trait SmoothingFilter: Send + Sync + fmt::Debug {
    /// Process the next value and return the smoothed output.
    fn update(&mut self, time: DateTime<Utc>, value: Decimal) -> Decimal;

    /// The most recent output, `None` before the first sample.
    fn value(&self) -> Option<Decimal>;

    /// Reset the filter to its initial state.
    fn reset(&mut self);

    /// The number of samples needed before the filter is ready.
    fn period(&self) -> usize;

    /// Whether the filter has seen enough samples for its output to be trusted.
    fn is_ready(&self) -> bool;

    /// The configurable kind this filter implements, `None` for custom filters.
    fn kind(&self) -> Option<FilterKind> {
        None
    }
}

/// Errors raised when an indicator is constructed with invalid parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("{name} period must be > 0")]
    InvalidPeriod { name: &'static str },
    #[error("{name} multiple must be >= 0, got {value}")]
    InvalidMultiple { name: &'static str, value: Decimal },
    #[error("Unknown filter kind: {0}")]
    UnknownFilter(String),
}

/// Smoothing algorithm selectable by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    Wilder,
    Ema,
    Sma,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [FilterKind::Wilder, FilterKind::Ema, FilterKind::Sma];

    /// Build a fresh filter of this kind.
    pub fn build(self, period: usize) -> Result<Box<dyn SmoothingFilter>, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidPeriod { name: self.label() });
        }
        Ok(match self {
            FilterKind::Wilder => Box::new(wilder::Wilder::new(period)),
            FilterKind::Ema => Box::new(ema::Ema::new(period)),
            FilterKind::Sma => Box::new(sma::Sma::new(period)),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Wilder => "wilder",
            FilterKind::Ema => "ema",
            FilterKind::Sma => "sma",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FilterKind::Wilder => "Wilder's smoothing (alpha = 1/period), SMA seed",
            FilterKind::Ema => "Exponential moving average (alpha = 2/(period+1)), SMA seed",
            FilterKind::Sma => "Simple moving average over the last `period` samples",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterKind {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wilder" | "wilders" | "rma" => Ok(FilterKind::Wilder),
            "ema" | "exponential" => Ok(FilterKind::Ema),
            "sma" | "simple" => Ok(FilterKind::Sma),
            other => Err(IndicatorError::UnknownFilter(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_kind_parse() {
        assert_eq!("Wilder".parse::<FilterKind>(), Ok(FilterKind::Wilder));
        assert_eq!("rma".parse::<FilterKind>(), Ok(FilterKind::Wilder));
        assert_eq!(" EMA ".parse::<FilterKind>(), Ok(FilterKind::Ema));
        assert_eq!("simple".parse::<FilterKind>(), Ok(FilterKind::Sma));
        assert_eq!(
            "hull".parse::<FilterKind>(),
            Err(IndicatorError::UnknownFilter("hull".into()))
        );
    }

    #[test]
    fn test_filter_kind_build() {
        for kind in FilterKind::ALL {
            let filter = kind.build(5).unwrap();
            assert_eq!(filter.period(), 5);
            assert_eq!(filter.kind(), Some(kind));
            assert!(!filter.is_ready());
            assert_eq!(filter.value(), None);
        }
        assert!(matches!(
            FilterKind::Sma.build(0),
            Err(IndicatorError::InvalidPeriod { name: "sma" })
        ));
    }

    #[test]
    fn test_filter_kind_serde() {
        assert_eq!(serde_json::to_string(&FilterKind::Ema).unwrap(), "\"ema\"");
        let kind: FilterKind = serde_json::from_str("\"sma\"").unwrap();
        assert_eq!(kind, FilterKind::Sma);
    }
}
