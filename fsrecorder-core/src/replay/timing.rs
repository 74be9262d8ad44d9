use std::time::Duration;

/// Delays at or below this threshold are skipped entirely.
const MIN_DELAY: f64 = 0.001;

/// Fixed yield between events under burst modes, enough to keep the host
/// scheduler responsive.
const BURST_YIELD: Duration = Duration::from_millis(1);

/// Maps a recorded inter-event gap to a replay sleep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimePolicy {
    /// Preserve original timing (1x).
    Exact,
    /// 100x speed, individual delays capped at 1 s. The default.
    Fast,
    /// 1000x with a 0.1 s cap, degenerating to burst yields.
    Dev,
    /// Process as fast as possible with minimal 1 ms yields.
    Burst,
    /// Caller-chosen multiplier and optional cap.
    Custom { speed: f64, max_delay: Option<f64> },
}

impl Default for TimePolicy {
    fn default() -> Self {
        TimePolicy::Fast
    }
}

impl TimePolicy {
    fn settings(&self) -> (f64, Option<f64>, bool) {
        match self {
            TimePolicy::Exact => (1.0, None, false),
            TimePolicy::Fast => (100.0, Some(1.0), false),
            TimePolicy::Dev => (1000.0, Some(0.1), true),
            TimePolicy::Burst => (1.0, None, true),
            TimePolicy::Custom { speed, max_delay } => (*speed, *max_delay, false),
        }
    }

    /// The sleep for one inter-event gap (seconds), or `None` when the
    /// event should run immediately.
    pub fn delay_for(&self, gap_secs: f64) -> Option<Duration> {
        let (multiplier, cap, burst) = self.settings();
        if burst {
            return Some(BURST_YIELD);
        }
        if !gap_secs.is_finite() || gap_secs <= 0.0 || multiplier <= 0.0 {
            return None;
        }
        let mut delay = gap_secs / multiplier;
        if let Some(cap) = cap {
            delay = delay.min(cap);
        }
        if delay <= MIN_DELAY {
            None
        } else {
            Some(Duration::from_secs_f64(delay))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_preserves_gaps() {
        assert_eq!(
            TimePolicy::Exact.delay_for(2.5),
            Some(Duration::from_secs_f64(2.5))
        );
        assert_eq!(TimePolicy::Exact.delay_for(0.0), None);
    }

    #[test]
    fn fast_divides_and_caps_at_one_second() {
        let p = TimePolicy::Fast;
        assert_eq!(p.delay_for(50.0), Some(Duration::from_millis(500)));
        // A huge recorded gap never sleeps more than 1 s.
        assert_eq!(p.delay_for(100_000.0), Some(Duration::from_secs(1)));
    }

    #[test]
    fn dev_and_burst_always_yield_one_millisecond() {
        assert_eq!(TimePolicy::Dev.delay_for(100.0), Some(Duration::from_millis(1)));
        assert_eq!(TimePolicy::Burst.delay_for(0.0), Some(Duration::from_millis(1)));
        assert_eq!(
            TimePolicy::Burst.delay_for(3600.0),
            Some(Duration::from_millis(1))
        );
    }

    #[test]
    fn sub_millisecond_delays_are_skipped() {
        assert_eq!(TimePolicy::Fast.delay_for(0.05), None);
        assert_eq!(
            TimePolicy::Custom {
                speed: 1000.0,
                max_delay: None
            }
            .delay_for(0.5),
            None
        );
    }

    #[test]
    fn custom_cap_applies() {
        let p = TimePolicy::Custom {
            speed: 2.0,
            max_delay: Some(0.25),
        };
        assert_eq!(p.delay_for(10.0), Some(Duration::from_secs_f64(0.25)));
        assert_eq!(p.delay_for(0.1), Some(Duration::from_secs_f64(0.05)));
    }

    #[test]
    fn default_is_fast() {
        assert_eq!(TimePolicy::default(), TimePolicy::Fast);
    }

    #[test]
    fn nonsense_gaps_never_sleep() {
        assert_eq!(TimePolicy::Fast.delay_for(-5.0), None);
        assert_eq!(TimePolicy::Fast.delay_for(f64::NAN), None);
    }
}
