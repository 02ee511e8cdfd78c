// Scroll depth tracking
//
// Keeps a monotonic high-water mark of scroll percentage. Crossing one of the
// fixed thresholds fires at most once per tracker lifetime, and evaluation is
// throttled to once per second regardless of how often the page scrolls.

use chrono::{DateTime, Duration, Utc};

/// Depth thresholds that produce a scroll_depth event, in percent
pub const THRESHOLDS: [u8; 4] = [25, 50, 75, 90];

const THROTTLE_MILLIS: i64 = 1_000;

/// Per-tab scroll depth state
#[derive(Debug, Clone, Default)]
pub struct ScrollDepth {
    max_percent: u8,
    fired: [bool; THRESHOLDS.len()],
    last_eval: Option<DateTime<Utc>>,
}

impl ScrollDepth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a scroll position. Returns the thresholds newly crossed, each
    /// reported exactly once over the tracker's lifetime.
    pub fn observe(&mut self, percent: u8, now: DateTime<Utc>) -> Vec<u8> {
        if let Some(last) = self.last_eval {
            if now - last < Duration::milliseconds(THROTTLE_MILLIS) {
                return Vec::new();
            }
        }
        self.last_eval = Some(now);

        if percent <= self.max_percent {
            return Vec::new();
        }
        self.max_percent = percent;

        let mut crossed = Vec::new();
        for (i, &threshold) in THRESHOLDS.iter().enumerate() {
            if percent >= threshold && !self.fired[i] {
                self.fired[i] = true;
                crossed.push(threshold);
            }
        }
        crossed
    }

    /// Highest scroll percentage seen so far
    pub fn high_water_mark(&self) -> u8 {
        self.max_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_thresholds_fire_once() {
        let mut scroll = ScrollDepth::new();
        assert_eq!(scroll.observe(30, at(0)), vec![25]);
        // Scrolling back up and re-crossing does not re-fire
        assert_eq!(scroll.observe(10, at(2)), Vec::<u8>::new());
        assert_eq!(scroll.observe(30, at(4)), Vec::<u8>::new());
        // A deeper scroll fires every newly crossed threshold
        assert_eq!(scroll.observe(95, at(6)), vec![50, 75, 90]);
        assert_eq!(scroll.observe(100, at(8)), Vec::<u8>::new());
    }

    #[test]
    fn test_evaluation_throttled_to_one_per_second() {
        let mut scroll = ScrollDepth::new();
        assert_eq!(scroll.observe(30, at(0)), vec![25]);
        // Within the throttle window the sample is dropped entirely
        let ts = at(0) + Duration::milliseconds(400);
        assert_eq!(scroll.observe(60, ts), Vec::<u8>::new());
        assert_eq!(scroll.high_water_mark(), 30);
        // After the window the next sample lands
        assert_eq!(scroll.observe(60, at(2)), vec![50]);
    }

    #[test]
    fn test_high_water_mark_is_monotonic() {
        let mut scroll = ScrollDepth::new();
        scroll.observe(40, at(0));
        scroll.observe(20, at(2));
        assert_eq!(scroll.high_water_mark(), 40);
    }
}
