use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use protocol::{Channel, Msg, Reading, Update};
use tokio::time::Instant;
use tracing::warn;

use crate::schedule::ReportSchedule;
use crate::sender::{ReliableSender, SendOutcome};
use crate::transport::Transport;

pub mod dht;
pub mod dimmer;
pub mod gas;
pub mod motion;

pub use dht::Dht;
pub use dimmer::Dimmer;
pub use gas::Gas;
pub use motion::Motion;

/// What happened to one channel during a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Delivered { attempts: usize },
    /// Every transmission went unacknowledged. The schedule advanced
    /// anyway: the value will not be retried sooner than its normal
    /// gating allows.
    Exhausted,
    Cancelled,
    NotDue,
    InvalidValue,
    NotConfigured,
}

impl From<SendOutcome> for Outcome {
    fn from(outcome: SendOutcome) -> Self {
        match outcome {
            SendOutcome::Delivered { attempts } => Outcome::Delivered { attempts },
            SendOutcome::Exhausted => Outcome::Exhausted,
            SendOutcome::Cancelled => Outcome::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: Channel,
    pub outcome: Outcome,
}

/// Keeps a misbehaving sensor from flooding the journal with the same
/// warning every poll.
pub(crate) struct WarnLimiter {
    limiter: DefaultDirectRateLimiter,
    withheld: usize,
}

impl WarnLimiter {
    pub(crate) fn new() -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(6).expect("six is not zero"));
        Self {
            limiter: RateLimiter::direct(quota),
            withheld: 0,
        }
    }

    pub(crate) fn allow(&mut self) -> bool {
        if self.limiter.check().is_err() {
            self.withheld += 1;
            return false;
        }

        if self.withheld > 0 {
            warn!("withheld {} similar warnings", self.withheld);
            self.withheld = 0;
        }
        true
    }
}

/// Shared per-channel flow every scalar adapter goes through:
/// sentinel check, validity check, schedule decision, then one
/// delivery attempt. The schedule is marked when the attempt starts,
/// not when (or whether) it is acknowledged.
pub(crate) async fn report_scalar<T: Transport>(
    schedule: &mut ReportSchedule<f32>,
    channel: Channel,
    reading: Reading,
    sender: &mut ReliableSender<T>,
    warns: &mut WarnLimiter,
) -> ChannelReport {
    let outcome = if !channel.is_configured() {
        Outcome::NotConfigured
    } else if !reading.is_valid() {
        if warns.allow() {
            warn!("skipping invalid {reading} reading: {}", reading.value());
        }
        Outcome::InvalidValue
    } else {
        let now = Instant::now();
        if schedule.should_report(reading.value(), now) {
            schedule.mark_reported(reading.value(), now);
            let msg = Msg::Update(Update { channel, reading });
            sender.send(&msg).await.into()
        } else {
            Outcome::NotDue
        }
    };

    ChannelReport { channel, outcome }
}
