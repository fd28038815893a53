use std::time::Duration;

use protocol::{Channel, Reading};

use crate::schedule::ReportSchedule;
use crate::sender::ReliableSender;
use crate::sensors::{report_scalar, ChannelReport, WarnLimiter};
use crate::transport::Transport;

/// Wait between telemetry reports.
const UPDATE_INTERVAL: Duration = Duration::from_millis(30_000);

/// Ppm per target gas, derived by the driver from one raw resistance
/// sample. Curve fitting and calibration stay on the driver side of
/// the seam.
#[derive(Debug, Clone, Copy)]
pub struct GasSample {
    pub lpg: u32,
    pub co: u32,
    pub smoke: u32,
}

pub trait GasDriver {
    fn sample(&mut self) -> GasSample;
}

/// Mq gas adapter: up to three channels off one raw sample. Boards
/// that only wire some of the gases leave the rest
/// [`Channel::NOT_CONFIGURED`].
pub struct Gas<D> {
    driver: D,
    lpg_channel: Channel,
    co_channel: Channel,
    smoke_channel: Channel,
    lpg: ReportSchedule<f32>,
    co: ReportSchedule<f32>,
    smoke: ReportSchedule<f32>,
    invalid_warns: WarnLimiter,
}

impl<D: GasDriver> Gas<D> {
    pub fn new(driver: D, lpg_channel: Channel, co_channel: Channel, smoke_channel: Channel) -> Self {
        Self {
            driver,
            lpg_channel,
            co_channel,
            smoke_channel,
            lpg: ReportSchedule::interval(UPDATE_INTERVAL),
            co: ReportSchedule::interval(UPDATE_INTERVAL),
            smoke: ReportSchedule::interval(UPDATE_INTERVAL),
            invalid_warns: WarnLimiter::new(),
        }
    }

    pub async fn report<T: Transport>(
        &mut self,
        sender: &mut ReliableSender<T>,
    ) -> [ChannelReport; 3] {
        let sample = self.driver.sample();

        [
            report_scalar(
                &mut self.lpg,
                self.lpg_channel,
                Reading::Lpg(sample.lpg),
                sender,
                &mut self.invalid_warns,
            )
            .await,
            report_scalar(
                &mut self.co,
                self.co_channel,
                Reading::Co(sample.co),
                sender,
                &mut self.invalid_warns,
            )
            .await,
            report_scalar(
                &mut self.smoke,
                self.smoke_channel,
                Reading::Smoke(sample.smoke),
                sender,
                &mut self.invalid_warns,
            )
            .await,
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sensors::Outcome;
    use crate::transport::testing::EchoLink;
    use tokio_util::sync::CancellationToken;

    struct Fixed(GasSample);
    impl GasDriver for Fixed {
        fn sample(&mut self) -> GasSample {
            self.0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unwired_gases_are_skipped_silently() {
        let link = EchoLink::default();
        let mut sender = ReliableSender::new(link.clone(), CancellationToken::new());
        link.install(sender.ack_handle());

        let driver = Fixed(GasSample {
            lpg: 12,
            co: 3,
            smoke: 0,
        });
        let mut gas = Gas::new(driver, Channel(3), Channel::NOT_CONFIGURED, Channel::NOT_CONFIGURED);

        let reports = gas.report(&mut sender).await;
        assert_eq!(reports[0].outcome, Outcome::Delivered { attempts: 1 });
        assert_eq!(reports[1].outcome, Outcome::NotConfigured);
        assert_eq!(reports[2].outcome, Outcome::NotConfigured);
        assert_eq!(link.transmissions(), 1);
    }
}
