use crate::types::Sample;
use chrono::{DateTime, Local, NaiveDate};

/// Raw time-ordered readings for one location.
///
/// The series is replaced wholesale on every successful refresh; there is no
/// incremental merge. Day buckets are recomputed on every access so they can
/// never go stale against the backing series. An empty series (or an empty
/// bucket for a day with no samples) is a valid state that callers must
/// render as "no data", not an error.
#[derive(Debug, Default)]
pub struct SampleStore {
    series: Vec<Sample>,
}

impl SampleStore {
    pub fn new() -> SampleStore {
        SampleStore { series: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &[Sample] {
        &self.series
    }

    /// Replace the full series. The previous series is superseded, not merged.
    pub fn replace(&mut self, series: Vec<Sample>) {
        self.series = series;
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }

    /// All samples whose local calendar date matches `day`, ascending by
    /// timestamp. Covers the full day, hours 0-23.
    pub fn day_bucket(&self, day: NaiveDate) -> Vec<Sample> {
        let mut bucket: Vec<Sample> = self
            .series
            .iter()
            .filter(|s| s.timestamp.date_naive() == day)
            .cloned()
            .collect();
        bucket.sort_by_key(|s| s.timestamp);
        bucket
    }

    /// Distinct calendar days present in the series, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.series.iter().map(|s| s.timestamp.date_naive()).collect();
        days.sort();
        days.dedup();
        days
    }

    /// The sample closest in time to `instant`. Ties resolve to the sample
    /// encountered first in series order.
    pub fn nearest_to(&self, instant: DateTime<Local>) -> Option<&Sample> {
        let mut best: Option<(&Sample, i64)> = None;
        for sample in &self.series {
            let distance = sample
                .timestamp
                .signed_duration_since(instant)
                .num_milliseconds()
                .abs();
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((sample, distance)),
            }
        }
        best.map(|(sample, _)| sample)
    }
}
