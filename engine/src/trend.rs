use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Maximum retained (temperature, capture time) pairs.
pub const WINDOW_CAPACITY: usize = 12;

/// Only the most recent entries feed the trend, roughly 30 seconds of data
/// at the fast poll cadence.
const ACTIVE_ENTRIES: usize = 6;

/// Changes smaller than this are treated as sensor noise at rest.
const STABLE_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub rate_per_minute: f64,
}

impl Trend {
    pub fn flat() -> Trend {
        Trend {
            direction: TrendDirection::Stable,
            rate_per_minute: 0.0,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            TrendDirection::Stable => write!(f, "holding steady"),
            TrendDirection::Rising => write!(f, "rising {:.1}°C/min", self.rate_per_minute),
            TrendDirection::Falling => write!(f, "falling {:.1}°C/min", self.rate_per_minute),
        }
    }
}

/// Bounded FIFO window over recent temperature readings.
#[derive(Debug, Default)]
pub struct TrendEstimator {
    window: VecDeque<(f64, DateTime<Local>)>,
}

impl TrendEstimator {
    pub fn new() -> TrendEstimator {
        TrendEstimator {
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    pub fn record(&mut self, temperature: f64, captured_at: DateTime<Local>) {
        self.window.push_back((temperature, captured_at));
        if self.window.len() > WINDOW_CAPACITY {
            self.window.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Direction and rate over the recent window. Fewer than two recent
    /// entries, or a change inside the noise band, reads as stable.
    pub fn current(&self) -> Trend {
        let skip = self.window.len().saturating_sub(ACTIVE_ENTRIES);
        let mut recent = self.window.iter().skip(skip);
        let first = match recent.next() {
            Some(entry) => entry,
            None => return Trend::flat(),
        };
        let last = match self.window.back() {
            Some(entry) if self.window.len() - skip >= 2 => entry,
            _ => return Trend::flat(),
        };

        let change = last.0 - first.0;
        if change.abs() < STABLE_BAND {
            return Trend::flat();
        }

        let minutes = last.1.signed_duration_since(first.1).num_milliseconds() as f64 / 60_000.0;
        let rate = if minutes > 0.0 { change / minutes } else { 0.0 };
        Trend {
            direction: if change > 0.0 {
                TrendDirection::Rising
            } else {
                TrendDirection::Falling
            },
            rate_per_minute: rate.abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Local> {
        Local.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn too_few_entries_reads_stable() {
        let mut trend = TrendEstimator::new();
        assert_eq!(trend.current(), Trend::flat());
        trend.record(21.0, at(0));
        assert_eq!(trend.current(), Trend::flat());
    }

    #[test]
    fn rising_window_reports_rate_per_minute() {
        let mut trend = TrendEstimator::new();
        // Six samples spanning 30 seconds, +0.6°C total: 1.2°C/min.
        for i in 0..6 {
            trend.record(21.0 + i as f64 * 0.12, at(i * 6_000));
        }
        let current = trend.current();
        assert_eq!(current.direction, TrendDirection::Rising);
        assert!((current.rate_per_minute - 1.2).abs() < 1e-9);
    }

    #[test]
    fn falling_window_reports_positive_rate() {
        let mut trend = TrendEstimator::new();
        for i in 0..6 {
            trend.record(23.0 - i as f64 * 0.1, at(i * 5_000));
        }
        let current = trend.current();
        assert_eq!(current.direction, TrendDirection::Falling);
        assert!(current.rate_per_minute > 0.0);
    }

    #[test]
    fn noise_band_reads_stable_regardless_of_elapsed_time() {
        let mut trend = TrendEstimator::new();
        trend.record(21.00, at(0));
        trend.record(21.04, at(1));
        assert_eq!(trend.current().direction, TrendDirection::Stable);

        let mut slow = TrendEstimator::new();
        slow.record(21.00, at(0));
        slow.record(21.04, at(3_600_000));
        assert_eq!(slow.current().direction, TrendDirection::Stable);
    }

    #[test]
    fn window_evicts_beyond_capacity() {
        let mut trend = TrendEstimator::new();
        for i in 0..(WINDOW_CAPACITY as i64 + 5) {
            trend.record(i as f64, at(i * 5_000));
        }
        assert_eq!(trend.len(), WINDOW_CAPACITY);
    }

    #[test]
    fn only_recent_entries_drive_the_trend() {
        let mut trend = TrendEstimator::new();
        // Old spike, then six flat recent samples: the spike must not count.
        trend.record(30.0, at(0));
        for i in 1..=6 {
            trend.record(21.0, at(i * 5_000));
        }
        assert_eq!(trend.current().direction, TrendDirection::Stable);
    }

    #[test]
    fn zero_elapsed_time_yields_zero_rate() {
        let mut trend = TrendEstimator::new();
        trend.record(21.0, at(1_000));
        trend.record(22.0, at(1_000));
        let current = trend.current();
        assert_eq!(current.direction, TrendDirection::Rising);
        assert_eq!(current.rate_per_minute, 0.0);
    }
}
