use rust_decimal::Decimal;
use trailstop_core::Bar;

/// True Range.
///
/// TR = max(high - low, |high - prev_close|, |low - prev_close|), or plain
/// `high - low` when there is no previous bar. Ready after the first bar.
#[derive(Debug, Clone, Default)]
pub struct TrueRange {
    prev_close: Option<Decimal>,
    current: Option<Decimal>,
    count: usize,
}

impl TrueRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the true range of `bar` against the stored previous bar, then
    /// remember `bar` for the next call.
    pub fn next_bar(&mut self, bar: &Bar) -> Decimal {
        self.next_hlc(bar.high, bar.low, bar.close)
    }

    pub fn next_hlc(&mut self, high: Decimal, low: Decimal, close: Decimal) -> Decimal {
        let tr = true_range(self.prev_close, high, low);
        self.prev_close = Some(close);
        self.current = Some(tr);
        self.count += 1;
        tr
    }

    /// Latest true range, `None` before the first bar.
    pub fn value(&self) -> Option<Decimal> {
        self.current
    }

    /// Close of the previous bar fed in.
    pub fn prev_close(&self) -> Option<Decimal> {
        self.prev_close
    }

    pub fn samples(&self) -> usize {
        self.count
    }

    pub fn is_ready(&self) -> bool {
        self.count > 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Stateless true range of one bar given the previous close.
pub fn true_range(prev_close: Option<Decimal>, high: Decimal, low: Decimal) -> Decimal {
    let hl = high - low;
    match prev_close {
        Some(prev_c) => {
            let hc = (high - prev_c).abs();
            let lc = (low - prev_c).abs();
            hl.max(hc).max(lc)
        }
        None => hl,
    }
}
