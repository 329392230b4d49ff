//! Per-entity processing time for one batch run.

use std::time::Duration;

use hdrhistogram::Histogram;

/// Values stored in microseconds.
pub struct LatencyStats {
    histogram: Option<Histogram<u64>>,
}

impl LatencyStats {
    /// Tracks 1us to 1h, 3 significant figures.
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new_with_bounds(1, 3_600_000_000, 3).ok(),
        }
    }

    pub fn record(&mut self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        if let Some(h) = self.histogram.as_mut() {
            // Out-of-range samples saturate rather than drop.
            h.saturating_record(us.max(1));
        }
    }

    /// (p50_us, p95_us, p99_us). None if no samples.
    pub fn percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        match &self.histogram {
            Some(h) if h.len() > 0 => (
                Some(h.value_at_quantile(0.5)),
                Some(h.value_at_quantile(0.95)),
                Some(h.value_at_quantile(0.99)),
            ),
            _ => (None, None, None),
        }
    }

    pub fn len(&self) -> u64 {
        self.histogram.as_ref().map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
