use std::time::Duration;

use tokio::time::Instant;

/// When a channel's fresh value warrants a radio update.
#[derive(Debug, Clone, Copy)]
enum Policy {
    /// Periodic telemetry: due once `min_interval` has fully elapsed,
    /// whatever the value.
    Interval { min_interval: Duration },
    /// Debounced events: due only on a value change, and no sooner
    /// than `floor` after the previous report. An unchanged value
    /// never re-reports, no matter how long it holds.
    OnChange { floor: Duration },
}

/// Per channel reporting policy plus the guard state it needs: the
/// value last handed to the sender, and when. State advances when a
/// delivery is *attempted*; an exhausted send still counts as
/// reported.
///
/// Change gating compares with exact equality. That is fine for the
/// discretized values it is used on (tripped or not, whole percent
/// steps); continuous analog channels belong on the interval policy.
#[derive(Debug, Clone)]
pub struct ReportSchedule<T> {
    policy: Policy,
    last_sent: Option<Sent<T>>,
}

#[derive(Debug, Clone, Copy)]
struct Sent<T> {
    value: T,
    at: Instant,
}

impl<T: PartialEq + Copy> ReportSchedule<T> {
    #[must_use]
    pub fn interval(min_interval: Duration) -> Self {
        Self {
            policy: Policy::Interval { min_interval },
            last_sent: None,
        }
    }

    #[must_use]
    pub fn on_change(floor: Duration) -> Self {
        Self {
            policy: Policy::OnChange { floor },
            last_sent: None,
        }
    }

    /// Pure decision, mutates nothing. A caller that goes on to send
    /// must call [`Self::mark_reported`] at the moment the attempt is
    /// made, acknowledged or not.
    #[must_use]
    pub fn should_report(&self, value: T, now: Instant) -> bool {
        let Some(Sent { value: last, at }) = self.last_sent else {
            // nothing sent yet, report on the first valid poll
            return true;
        };

        match self.policy {
            Policy::Interval { min_interval } => now > at + min_interval,
            Policy::OnChange { floor } => value != last && now - at >= floor,
        }
    }

    pub fn mark_reported(&mut self, value: T, now: Instant) {
        self.last_sent = Some(Sent { value, at: now });
    }

    /// The value last handed to the sender, if any.
    #[must_use]
    pub fn last_sent(&self) -> Option<T> {
        self.last_sent.map(|sent| sent.value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[tokio::test(start_paused = true)]
    async fn interval_policy_ignores_value_content() {
        let mut schedule = ReportSchedule::interval(30_000 * MS);
        let start = Instant::now();
        schedule.mark_reported(22.5f32, start);

        assert!(!schedule.should_report(25.0, start + 29_999 * MS));
        // the boundary itself is not yet due
        assert!(!schedule.should_report(25.0, start + 30_000 * MS));
        assert!(schedule.should_report(22.5, start + 30_001 * MS));
    }

    #[tokio::test(start_paused = true)]
    async fn change_gate_needs_both_a_change_and_the_floor() {
        let mut schedule = ReportSchedule::on_change(5_000 * MS);
        let start = Instant::now();
        schedule.mark_reported(false, start);

        // flipped, but still inside the quiet floor
        assert!(!schedule.should_report(true, start + 100 * MS));
        // unchanged, floor long gone
        assert!(!schedule.should_report(false, start + 500_000 * MS));
        // flipped and floor elapsed; the floor boundary is inclusive
        assert!(schedule.should_report(true, start + 5_000 * MS));
        assert!(schedule.should_report(true, start + 5_001 * MS));
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_schedules_report_on_the_first_poll() {
        let now = Instant::now();
        let interval = ReportSchedule::interval(30_000 * MS);
        assert!(interval.should_report(22.5f32, now));

        let change = ReportSchedule::on_change(5_000 * MS);
        assert!(change.should_report(false, now));
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_does_not_mutate() {
        let mut schedule = ReportSchedule::on_change(5_000 * MS);
        let start = Instant::now();
        schedule.mark_reported(false, start);

        let later = start + 10_000 * MS;
        assert!(schedule.should_report(true, later));
        // deciding twice must give the same answer
        assert!(schedule.should_report(true, later));
        assert_eq!(schedule.last_sent(), Some(false));
    }
}
