use crate::true_range::TrueRange;
use crate::{FilterKind, IndicatorError, SmoothingFilter};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trailstop_core::{Bar, Direction};

/// AMW trend: an adaptive trailing stop with separate long and short widths.
///
/// Each bar's true range is smoothed by two independent filters. While long,
/// the level trails `close - multiple_long * smoothed_long` and may only rise.
/// While short, it trails `min_close + multiple_short * smoothed_short` and may
/// only fall. A close through the level flips the direction and re-anchors
/// the level on the opposite side of price.
#[derive(Debug)]
pub struct AmwTrend {
    config: AmwTrendConfig,
    true_range: TrueRange,
    filter_long: Box<dyn SmoothingFilter>,
    filter_short: Box<dyn SmoothingFilter>,
    state: TrendState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmwTrendConfig {
    pub period_long: usize,
    pub multiple_long: Decimal,
    pub filter_long: FilterKind,
    pub period_short: usize,
    pub multiple_short: Decimal,
    pub filter_short: FilterKind,
}

impl Default for AmwTrendConfig {
    fn default() -> Self {
        Self {
            period_long: 20,
            multiple_long: dec!(2.6),
            filter_long: FilterKind::Wilder,
            period_short: 20,
            multiple_short: dec!(2.9),
            filter_short: FilterKind::Wilder,
        }
    }
}

impl AmwTrendConfig {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.period_long == 0 {
            return Err(IndicatorError::InvalidPeriod { name: "period_long" });
        }
        if self.period_short == 0 {
            return Err(IndicatorError::InvalidPeriod { name: "period_short" });
        }
        if self.multiple_long.is_sign_negative() && !self.multiple_long.is_zero() {
            return Err(IndicatorError::InvalidMultiple {
                name: "multiple_long",
                value: self.multiple_long,
            });
        }
        if self.multiple_short.is_sign_negative() && !self.multiple_short.is_zero() {
            return Err(IndicatorError::InvalidMultiple {
                name: "multiple_short",
                value: self.multiple_short,
            });
        }
        Ok(())
    }
}

/// Warm-up and direction phase of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No bar seen yet.
    #[default]
    WarmingFirst,
    /// One bar seen; the next bar decides the initial direction.
    WarmingSecond { first_close: Decimal },
    Active(Direction),
}

#[derive(Debug, Clone, Default)]
struct TrendState {
    phase: Phase,
    samples: usize,
    trend_level: Decimal,
    /// Lowest close since the direction last turned short.
    extreme_close: Decimal,
    atr_proxy: Decimal,
    flipped: bool,
    last_time: Option<DateTime<Utc>>,
}

/// Snapshot of the indicator after one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub true_range: Decimal,
    pub level: Decimal,
    pub direction: Option<Direction>,
    pub ready: bool,
    pub flipped: bool,
}

impl AmwTrend {
    /// Build the indicator with filters of the configured kinds.
    pub fn new(config: AmwTrendConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        let filter_long = config.filter_long.build(config.period_long)?;
        let filter_short = config.filter_short.build(config.period_short)?;
        Self::with_filters(config, filter_long, filter_short)
    }

    /// Build the indicator around caller-supplied smoothing filters.
    ///
    /// Only the multiples are taken from `config`. The periods, and the kinds
    /// of the built-in filters, are overwritten with what the filters report,
    /// so `config()` describes the filters actually running. For a custom
    /// filter (`kind()` is `None`) the matching kind field keeps the caller's
    /// value and does not describe that filter.
    pub fn with_filters(
        mut config: AmwTrendConfig,
        filter_long: Box<dyn SmoothingFilter>,
        filter_short: Box<dyn SmoothingFilter>,
    ) -> Result<Self, IndicatorError> {
        config.period_long = filter_long.period();
        config.period_short = filter_short.period();
        if let Some(kind) = filter_long.kind() {
            config.filter_long = kind;
        }
        if let Some(kind) = filter_short.kind() {
            config.filter_short = kind;
        }
        config.validate()?;
        Ok(Self {
            config,
            true_range: TrueRange::new(),
            filter_long,
            filter_short,
            state: TrendState::default(),
        })
    }

    /// Advance by one bar and return the new trend level.
    ///
    /// Bars must arrive in strictly increasing time order.
    pub fn update(&mut self, bar: &Bar) -> Decimal {
        if let Some(last) = self.state.last_time {
            if bar.timestamp <= last {
                warn!(
                    instrument = %bar.instrument,
                    previous = %last,
                    current = %bar.timestamp,
                    "Bar out of time order"
                );
            }
        }
        self.state.last_time = Some(bar.timestamp);

        let tr = self.true_range.next_bar(bar);
        let smoothed_long = self.filter_long.update(bar.timestamp, tr);
        let smoothed_short = self.filter_short.update(bar.timestamp, tr);
        self.state.samples += 1;
        self.state.flipped = false;

        let close = bar.close;
        match self.state.phase {
            Phase::WarmingFirst => {
                self.state.trend_level = close;
                self.state.phase = Phase::WarmingSecond { first_close: close };
            }
            Phase::WarmingSecond { first_close } => {
                let direction = if close >= first_close {
                    Direction::Long
                } else {
                    Direction::Short
                };
                self.state.atr_proxy = match direction {
                    Direction::Long => self.long_stop(close, smoothed_long),
                    Direction::Short => self.short_stop(close, smoothed_short),
                };
                self.state.trend_level = self.state.atr_proxy;
                self.state.extreme_close = close;
                self.state.phase = Phase::Active(direction);
                debug!(%direction, level = %self.state.trend_level, "Initial direction");
            }
            Phase::Active(Direction::Long) => {
                if close < self.state.trend_level {
                    let level = self.short_stop(close, smoothed_short);
                    self.flip(Direction::Short, close, level);
                } else {
                    self.state.atr_proxy = self.long_stop(close, smoothed_long);
                    self.state.trend_level = self.state.trend_level.max(self.state.atr_proxy);
                }
            }
            Phase::Active(Direction::Short) => {
                if close > self.state.trend_level {
                    let level = self.long_stop(close, smoothed_long);
                    self.flip(Direction::Long, close, level);
                } else {
                    self.state.extreme_close = close.min(self.state.extreme_close);
                    self.state.atr_proxy = self.short_stop(self.state.extreme_close, smoothed_short);
                    self.state.trend_level = self.state.trend_level.min(self.state.atr_proxy);
                }
            }
        }

        self.state.trend_level
    }

    /// Advance by one bar and return a snapshot of the resulting state.
    pub fn step(&mut self, bar: &Bar) -> TrendPoint {
        let level = self.update(bar);
        TrendPoint {
            timestamp: bar.timestamp,
            close: bar.close,
            true_range: self.true_range.value().unwrap_or(Decimal::ZERO),
            level,
            direction: self.direction(),
            ready: self.is_ready(),
            flipped: self.state.flipped,
        }
    }

    fn long_stop(&self, close: Decimal, smoothed_long: Decimal) -> Decimal {
        close - self.config.multiple_long * smoothed_long
    }

    fn short_stop(&self, anchor: Decimal, smoothed_short: Decimal) -> Decimal {
        anchor + self.config.multiple_short * smoothed_short
    }

    fn flip(&mut self, to: Direction, close: Decimal, level: Decimal) {
        debug!(
            from = %to.opposite(),
            %to,
            %close,
            old_level = %self.state.trend_level,
            new_level = %level,
            sample = self.state.samples,
            "Direction flip"
        );
        self.state.atr_proxy = level;
        self.state.trend_level = level;
        self.state.extreme_close = close;
        self.state.phase = Phase::Active(to);
        self.state.flipped = true;
    }

    /// Current trend level, `None` before the first bar.
    pub fn value(&self) -> Option<Decimal> {
        match self.state.phase {
            Phase::WarmingFirst => None,
            _ => Some(self.state.trend_level),
        }
    }

    /// Current direction, `None` until the second bar.
    pub fn direction(&self) -> Option<Direction> {
        match self.state.phase {
            Phase::Active(direction) => Some(direction),
            _ => None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.direction().is_some_and(|d| d.is_long())
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Whether the last bar fed in flipped the direction.
    pub fn flipped(&self) -> bool {
        self.state.flipped
    }

    pub fn samples(&self) -> usize {
        self.state.samples
    }

    /// Both smoothing filters have completed their own warm-up.
    pub fn is_ready(&self) -> bool {
        self.filter_long.is_ready() && self.filter_short.is_ready()
    }

    pub fn warm_up_period(&self) -> usize {
        self.config.period_long.max(self.config.period_short)
    }

    /// Read-only view of the true range sub-stream.
    pub fn true_range(&self) -> &TrueRange {
        &self.true_range
    }

    pub fn filter_long(&self) -> &dyn SmoothingFilter {
        self.filter_long.as_ref()
    }

    pub fn filter_short(&self) -> &dyn SmoothingFilter {
        self.filter_short.as_ref()
    }

    pub fn config(&self) -> &AmwTrendConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.true_range.reset();
        self.filter_long.reset();
        self.filter_short.reset();
        self.state = TrendState::default();
    }
}
