use std::time::Duration;

use protocol::{Channel, Msg, Reading, Update};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::schedule::ReportSchedule;
use crate::sender::ReliableSender;
use crate::sensors::{ChannelReport, Outcome};
use crate::store::StateStore;
use crate::transport::Transport;

pub trait DimmerOutput {
    /// Applies the raw 0..=255 pwm value to the output pin.
    fn set_pwm(&mut self, value: u8);
}

/// Dimmer actuator: applies gateway orders, persists the level so it
/// survives a restart, and reports the level whenever it changed.
pub struct Dimmer<D, S> {
    output: D,
    store: S,
    channel: Channel,
    /// current level in percent
    level: u8,
    schedule: ReportSchedule<u8>,
}

impl<D: DimmerOutput, S: StateStore> Dimmer<D, S> {
    /// Restores the persisted level, falling back to 50%.
    pub fn new(mut output: D, store: S, channel: Channel) -> Self {
        let level = store.load(channel).unwrap_or(50);
        debug!("restoring dimmer to {level}%");
        output.set_pwm(percent_to_pwm(level));

        Self {
            output,
            store,
            channel,
            level,
            schedule: ReportSchedule::on_change(Duration::ZERO),
        }
    }

    /// Applies a gateway order and persists it.
    pub fn set(&mut self, percent: u8) {
        let percent = percent.min(100);
        debug!("setting dimmer to {percent}%");
        self.output.set_pwm(percent_to_pwm(percent));
        self.level = percent;
        if let Err(err) = self.store.save(self.channel, percent) {
            // the output is already at the new level, losing the
            // stored copy only costs us the restore after a restart
            warn!("could not persist dimmer level: {err}");
        }
    }

    pub async fn report<T: Transport>(&mut self, sender: &mut ReliableSender<T>) -> ChannelReport {
        let outcome = if !self.channel.is_configured() {
            Outcome::NotConfigured
        } else {
            let now = Instant::now();
            if self.schedule.should_report(self.level, now) {
                self.schedule.mark_reported(self.level, now);
                let msg = Msg::Update(Update {
                    channel: self.channel,
                    reading: Reading::DimmerLevel(self.level),
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

/// The 0..=100 to 0..=255 map the output stage expects.
fn percent_to_pwm(percent: u8) -> u8 {
    (u16::from(percent.min(100)) * 255 / 100) as u8
}
