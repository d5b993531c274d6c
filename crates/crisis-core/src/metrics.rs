//! Running counters for one episode.

use crisis_types::MetricsReport;

/// Counters accumulated while a run progresses.
///
/// Hospital overflow is not stored here: each hospital counts its own
/// deferred admissions and [`Metrics::report`] sums them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Survivors delivered to a hospital.
    pub rescued: u32,
    /// Survivors whose deadline expired.
    pub deaths: u32,
    /// Fires put out.
    pub fires_extinguished: u32,
    /// Rubble cells cleared.
    pub roads_cleared: u32,
    /// Successful moves.
    pub energy_used: u32,
    /// Successfully executed `act` commands.
    pub tool_calls: u32,
    /// Planner responses rejected at the validator.
    pub invalid_json: u32,
    /// Extra planner calls after an invalid response.
    pub replans: u32,
    /// Commands rejected while applying a plan.
    pub invalid_commands: u32,
    rescue_ticks_total: u32,
}

impl Metrics {
    /// Record a rescue that took `ticks` from spawn to delivery.
    pub fn record_rescue(&mut self, ticks: u64) {
        self.rescued = self.rescued.saturating_add(1);
        let ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.rescue_ticks_total = self.rescue_ticks_total.saturating_add(ticks);
    }

    /// Mean ticks from spawn to delivery, or 0 when nobody was rescued.
    pub fn avg_rescue_time(&self) -> f64 {
        if self.rescued == 0 {
            return 0.0;
        }
        f64::from(self.rescue_ticks_total) / f64::from(self.rescued)
    }

    /// Freeze the counters into an end-of-run report.
    pub fn report(&self, ticks: u64, total_survivors: u32, overflow_events: u32) -> MetricsReport {
        let success_rate = if total_survivors == 0 {
            0.0
        } else {
            f64::from(self.rescued) / f64::from(total_survivors) * 100.0
        };
        MetricsReport {
            rescued: self.rescued,
            deaths: self.deaths,
            avg_rescue_time: self.avg_rescue_time(),
            fires_extinguished: self.fires_extinguished,
            roads_cleared: self.roads_cleared,
            energy_used: self.energy_used,
            tool_calls: self.tool_calls,
            invalid_json: self.invalid_json,
            replans: self.replans,
            hospital_overflow_events: overflow_events,
            invalid_commands: self.invalid_commands,
            ticks,
            total_survivors,
            success_rate,
        }
    }
}

/// Increment a counter without overflowing.
pub(crate) const fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_and_rates() {
        let mut m = Metrics::default();
        m.record_rescue(4);
        m.record_rescue(8);
        let report = m.report(20, 4, 1);
        assert!((report.avg_rescue_time - 6.0).abs() < f64::EPSILON);
        assert!((report.success_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.hospital_overflow_events, 1);
        assert_eq!(report.ticks, 20);
    }

    #[test]
    fn empty_run_reports_zeroes() {
        let report = Metrics::default().report(0, 0, 0);
        assert!(report.avg_rescue_time.abs() < f64::EPSILON);
        assert!(report.success_rate.abs() < f64::EPSILON);
    }
}
