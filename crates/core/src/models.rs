use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
///
/// Indicators only read `high`, `low`, `close` and `timestamp`; the remaining
/// fields travel along so a loaded series can be reported back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Build a bar from high/low/close only. `open` is set to `close` and
    /// `volume` to zero.
    pub fn hlc(
        instrument: impl Into<String>,
        timestamp: DateTime<Utc>,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            open: close,
            high,
            low,
            close,
            volume: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Side of the market a trend-following level is currently trailing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Direction::Long)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}
