use std::time::Duration;

use protocol::{Channel, Reading};

use crate::schedule::ReportSchedule;
use crate::sender::ReliableSender;
use crate::sensors::{report_scalar, ChannelReport, WarnLimiter};
use crate::transport::Transport;

/// Wait between telemetry reports.
const UPDATE_INTERVAL: Duration = Duration::from_millis(30_000);

/// One combined temperature and humidity sample, fresh from the
/// hardware. Reads that failed show up as NaN and are dropped by the
/// validity check.
#[derive(Debug, Clone, Copy)]
pub struct DhtSample {
    pub temperature: f32,
    pub humidity: f32,
}

pub trait DhtDriver {
    fn sample(&mut self) -> DhtSample;
}

/// Temperature/humidity adapter: two channels, each on its own
/// periodic schedule.
pub struct Dht<D> {
    driver: D,
    temperature_channel: Channel,
    humidity_channel: Channel,
    /// Correction for a sensor with a permanent small offset to the
    /// real temperature.
    temperature_offset: f32,
    temperature: ReportSchedule<f32>,
    humidity: ReportSchedule<f32>,
    invalid_warns: WarnLimiter,
}

impl<D: DhtDriver> Dht<D> {
    pub fn new(
        driver: D,
        temperature_channel: Channel,
        humidity_channel: Channel,
        temperature_offset: f32,
    ) -> Self {
        Self {
            driver,
            temperature_channel,
            humidity_channel,
            temperature_offset,
            temperature: ReportSchedule::interval(UPDATE_INTERVAL),
            humidity: ReportSchedule::interval(UPDATE_INTERVAL),
            invalid_warns: WarnLimiter::new(),
        }
    }

    pub async fn report<T: Transport>(
        &mut self,
        sender: &mut ReliableSender<T>,
    ) -> [ChannelReport; 2] {
        let sample = self.driver.sample();
        // NaN stays NaN under the offset, failed reads still get
        // caught by the validity check
        let temperature = Reading::Temperature(sample.temperature + self.temperature_offset);
        let humidity = Reading::Humidity(sample.humidity);

        [
            report_scalar(
                &mut self.temperature,
                self.temperature_channel,
                temperature,
                sender,
                &mut self.invalid_warns,
            )
            .await,
            report_scalar(
                &mut self.humidity,
                self.humidity_channel,
                humidity,
                sender,
                &mut self.invalid_warns,
            )
            .await,
        ]
    }
}
