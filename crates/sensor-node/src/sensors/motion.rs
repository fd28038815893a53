use std::time::Duration;

use protocol::{Channel, Msg, Reading, Update};
use tokio::time::Instant;
use tracing::debug;

use crate::schedule::ReportSchedule;
use crate::sender::ReliableSender;
use crate::sensors::{ChannelReport, Outcome};
use crate::transport::Transport;

/// Quiet period a state flip has to wait out before the next flip
/// can be reported.
const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(5_000);

pub trait MotionDriver {
    fn tripped(&mut self) -> bool;
}

/// Pir adapter: change gated, a steady state never re-reports.
pub struct Motion<D> {
    driver: D,
    channel: Channel,
    schedule: ReportSchedule<bool>,
    /// for transition logs only, the schedule keeps the reported state
    last_seen: Option<bool>,
}

impl<D: MotionDriver> Motion<D> {
    pub fn new(driver: D, channel: Channel) -> Self {
        Self {
            driver,
            channel,
            schedule: ReportSchedule::on_change(MIN_REPORT_INTERVAL),
            last_seen: None,
        }
    }

    pub async fn report<T: Transport>(&mut self, sender: &mut ReliableSender<T>) -> ChannelReport {
        let tripped = self.driver.tripped();
        if self.last_seen != Some(tripped) {
            debug!("{}", if tripped { "tripped" } else { "cleared" });
            self.last_seen = Some(tripped);
        }

        let outcome = if !self.channel.is_configured() {
            Outcome::NotConfigured
        } else {
            let now = Instant::now();
            if self.schedule.should_report(tripped, now) {
                self.schedule.mark_reported(tripped, now);
                let msg = Msg::Update(Update {
                    channel: self.channel,
                    reading: Reading::Motion(tripped),
                });
                sender.send(&msg).await.into()
            } else {
                Outcome::NotDue
            }
        };

        ChannelReport {
            channel: self.channel,
            outcome,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::testing::EchoLink;
    use tokio::time::sleep_until;
    use tokio_util::sync::CancellationToken;

    struct Scripted(bool);
    impl MotionDriver for Scripted {
        fn tripped(&mut self) -> bool {
            self.0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn flip_waits_out_the_quiet_floor() {
        let link = EchoLink::default();
        let mut sender = ReliableSender::new(link.clone(), CancellationToken::new());
        link.install(sender.ack_handle());

        let mut motion = Motion::new(Scripted(false), Channel(2));

        // first poll reports the initial not-tripped state
        let start = Instant::now();
        let first = motion.report(&mut sender).await;
        assert_eq!(first.outcome, Outcome::Delivered { attempts: 1 });

        // flips right away, but the floor has not elapsed
        motion.driver = Scripted(true);
        sleep_until(start + Duration::from_millis(100)).await;
        let second = motion.report(&mut sender).await;
        assert_eq!(second.outcome, Outcome::NotDue);

        // still tripped once the floor has passed
        sleep_until(start + Duration::from_millis(5_001)).await;
        let third = motion.report(&mut sender).await;
        assert_eq!(third.outcome, Outcome::Delivered { attempts: 1 });

        // steady state never re-reports
        sleep_until(start + Duration::from_millis(60_000)).await;
        let fourth = motion.report(&mut sender).await;
        assert_eq!(fourth.outcome, Outcome::NotDue);

        assert_eq!(link.transmissions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfigured_channel_never_reads_the_schedule() {
        let link = EchoLink::default();
        let mut sender = ReliableSender::new(link.clone(), CancellationToken::new());
        link.install(sender.ack_handle());

        let mut motion = Motion::new(Scripted(true), Channel::NOT_CONFIGURED);
        let report = motion.report(&mut sender).await;
        assert_eq!(report.outcome, Outcome::NotConfigured);
        assert_eq!(link.transmissions(), 0);
    }
}
