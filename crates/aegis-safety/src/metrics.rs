//! Rolling trading metrics feeding the circuit breaker.
//!
//! The window tracks trade outcomes over the last hour, the consecutive
//! failure streak, and equity marks for daily-change and drawdown math.
//! All values here are advisory inputs to breaker evaluation; the window
//! never blocks a decision by itself.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Length of the rolling trade window in seconds.
const WINDOW_SECS: i64 = 3600;

/// Minimum trades in the window before the error rate is meaningful.
/// Below this, a single failure would spike the rate to 100%.
const MIN_ERROR_RATE_SAMPLE: usize = 10;

#[derive(Debug, Clone, Copy)]
struct TradeSample {
    at: DateTime<Utc>,
    success: bool,
}

/// Point-in-time view of the rolling metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub trades_last_hour: usize,
    pub failures_last_hour: usize,
    /// Failure share of the last hour in percent; zero when the sample
    /// is below `MIN_ERROR_RATE_SAMPLE`.
    pub error_rate_pct: Decimal,
    pub consecutive_failures: u32,
    /// Equity change since the start of the UTC day, in percent.
    /// Negative means a loss.
    pub daily_change_pct: Decimal,
    /// Decline from the observed equity peak, in percent (>= 0).
    pub drawdown_pct: Decimal,
}

/// Mutable rolling window, owned by the safety guard behind a mutex.
#[derive(Debug)]
pub struct MetricsWindow {
    trades: VecDeque<TradeSample>,
    consecutive_failures: u32,
    day: Option<NaiveDate>,
    day_start_equity: Decimal,
    peak_equity: Decimal,
    last_equity: Option<Decimal>,
}

impl Default for MetricsWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsWindow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            trades: VecDeque::new(),
            consecutive_failures: 0,
            day: None,
            day_start_equity: Decimal::ZERO,
            peak_equity: Decimal::ZERO,
            last_equity: None,
        }
    }

    /// Record a completed trade attempt.
    ///
    /// Returns the consecutive failure count after this trade.
    pub fn record_trade(&mut self, at: DateTime<Utc>, success: bool) -> u32 {
        self.trades.push_back(TradeSample { at, success });
        self.prune(at);

        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
        self.consecutive_failures
    }

    /// Record an equity observation.
    ///
    /// The first observation of a UTC day becomes that day's baseline for
    /// daily-change math; the peak resets with the baseline.
    pub fn update_equity(&mut self, equity: Decimal, at: DateTime<Utc>) {
        let today = at.date_naive();
        if self.day != Some(today) {
            self.day = Some(today);
            self.day_start_equity = equity;
            self.peak_equity = equity;
        }
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.last_equity = Some(equity);
    }

    /// Clear the consecutive failure streak (breaker reset).
    pub fn clear_failures(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Compute the current snapshot, pruning expired samples.
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> MetricsSnapshot {
        self.prune(now);

        let trades = self.trades.len();
        let failures = self.trades.iter().filter(|t| !t.success).count();
        let hundred = Decimal::from(100);

        let error_rate_pct = if trades >= MIN_ERROR_RATE_SAMPLE {
            Decimal::from(failures) / Decimal::from(trades) * hundred
        } else {
            Decimal::ZERO
        };

        let daily_change_pct = match self.last_equity {
            Some(last) if !self.day_start_equity.is_zero() => {
                (last - self.day_start_equity) / self.day_start_equity * hundred
            }
            _ => Decimal::ZERO,
        };

        let drawdown_pct = match self.last_equity {
            Some(last) if !self.peak_equity.is_zero() && last < self.peak_equity => {
                (self.peak_equity - last) / self.peak_equity * hundred
            }
            _ => Decimal::ZERO,
        };

        MetricsSnapshot {
            trades_last_hour: trades,
            failures_last_hour: failures,
            error_rate_pct,
            consecutive_failures: self.consecutive_failures,
            daily_change_pct,
            drawdown_pct,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(WINDOW_SECS);
        while let Some(front) = self.trades.front() {
            if front.at < cutoff {
                self.trades.pop_front();
            } else {
                break;
            }
        }
    }
}
