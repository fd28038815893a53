use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use protocol::Msg;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::transport::Transport;

/// Total transmissions of one update before delivery is given up on.
pub const MAX_SEND_ATTEMPTS: usize = 5;
/// Ack window after the first transmission, and the base the
/// exponential backoff doubles from.
pub const ACK_WAIT: Duration = Duration::from_millis(40);

/// What one [`ReliableSender::send`] ended in. `Exhausted` is not an
/// error: the link is best effort and callers treat the update as
/// reported either way. The scheduler will not retry it sooner than
/// its normal gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered { attempts: usize },
    Exhausted,
    Cancelled,
}

/// Delivers one message at a time over an unreliable link, with
/// bounded retries and exponential backoff.
///
/// The wait schedule for a never-acknowledged send is
/// `40, 40, 80, 160, 320, 640` ms: a fixed window after the first
/// transmission, then a doubling backoff where each backoff wait is
/// also the preceding retry's ack window, and a last 640 ms window
/// after the fifth transmission. Worst case `send` occupies this task
/// for 1280 ms.
///
/// At most one send may be in flight per sender; `send` taking
/// `&mut self` enforces that. The acknowledgment flag is written by
/// [`AckHandle::handle_ack`] on the receive task and read here after
/// every wait.
pub struct ReliableSender<T> {
    transport: T,
    acked: Arc<AtomicBool>,
    cancel: CancellationToken,
}

enum Wait {
    Acked,
    NoAck,
    Cancelled,
}

impl<T: Transport> ReliableSender<T> {
    pub fn new(transport: T, cancel: CancellationToken) -> Self {
        Self {
            transport,
            acked: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    /// Handle for the receive loop to signal acknowledgments through.
    #[must_use]
    pub fn ack_handle(&self) -> AckHandle {
        AckHandle {
            acked: Arc::clone(&self.acked),
        }
    }

    /// Transmits `msg` until an ack arrives or the attempt budget is
    /// spent. Never fails: an unacknowledged update is silently lost
    /// after [`MAX_SEND_ATTEMPTS`] transmissions, the caller only
    /// learns of it through the returned [`SendOutcome`].
    pub async fn send(&mut self, msg: &Msg) -> SendOutcome {
        self.acked.store(false, Ordering::Release);

        self.transport.transmit(msg).await;
        let mut attempts = 1;

        // fixed post-send ack window
        match self.wait(ACK_WAIT).await {
            Wait::Acked => return self.delivered(attempts),
            Wait::Cancelled => return SendOutcome::Cancelled,
            Wait::NoAck => (),
        }

        let mut backoff = ACK_WAIT;
        loop {
            match self.wait(backoff).await {
                Wait::Acked => return self.delivered(attempts),
                Wait::Cancelled => return SendOutcome::Cancelled,
                Wait::NoAck => (),
            }

            if attempts == MAX_SEND_ATTEMPTS {
                debug!("no ack after {attempts} transmissions, giving up");
                return SendOutcome::Exhausted;
            }

            self.transport.transmit(msg).await;
            attempts += 1;
            backoff *= 2;
        }
    }

    fn delivered(&self, attempts: usize) -> SendOutcome {
        debug!("gateway acked after {attempts} transmission(s)");
        SendOutcome::Delivered { attempts }
    }

    async fn wait(&self, period: Duration) -> Wait {
        tokio::select! {
            () = self.cancel.cancelled() => return Wait::Cancelled,
            () = sleep(period) => (),
        }

        if self.acked.load(Ordering::Acquire) {
            Wait::Acked
        } else {
            Wait::NoAck
        }
    }
}

/// Sole writer of the acknowledgment flag. Safe to use from the
/// receive task while a `send` is polling the flag.
#[derive(Clone)]
pub struct AckHandle {
    acked: Arc<AtomicBool>,
}

impl AckHandle {
    /// Called for every incoming frame. Returns whether the frame was
    /// an acknowledgment.
    pub fn handle_ack(&self, msg: &Msg) -> bool {
        if msg.is_ack() {
            self.acked.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::testing::RecordingLink;
    use protocol::{Channel, Reading, Update};
    use tokio::time::Instant;

    fn update() -> Msg {
        Msg::Update(Update {
            channel: Channel(0),
            reading: Reading::Temperature(68.0),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn unacked_send_exhausts_after_five_transmissions() {
        let link = RecordingLink::default();
        let mut sender = ReliableSender::new(link.clone(), CancellationToken::new());

        let start = Instant::now();
        let outcome = sender.send(&update()).await;

        assert_eq!(outcome, SendOutcome::Exhausted);
        assert_eq!(start.elapsed(), Duration::from_millis(1280));
        // transmissions at 0, then after 40+40, 80, 160 and 320 more
        assert_eq!(link.offsets_ms(start), vec![0, 80, 160, 320, 640]);
    }

    #[tokio::test(start_paused = true)]
    async fn ack_in_the_first_window_means_a_single_transmission() {
        let link = RecordingLink::default();
        let mut sender = ReliableSender::new(link.clone(), CancellationToken::new());
        let ack = sender.ack_handle();

        let start = Instant::now();
        let msg = update();
        let (outcome, ()) = tokio::join!(sender.send(&msg), async {
            sleep(Duration::from_millis(10)).await;
            assert!(ack.handle_ack(&Msg::Ack));
        });

        assert_eq!(outcome, SendOutcome::Delivered { attempts: 1 });
        assert_eq!(start.elapsed(), Duration::from_millis(40));
        assert_eq!(link.transmissions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ack_during_backoff_stops_further_transmissions() {
        let link = RecordingLink::default();
        let mut sender = ReliableSender::new(link.clone(), CancellationToken::new());
        let ack = sender.ack_handle();

        let start = Instant::now();
        let msg = update();
        let (outcome, ()) = tokio::join!(sender.send(&msg), async {
            // lands inside the second transmission's 80ms window
            sleep(Duration::from_millis(100)).await;
            ack.handle_ack(&Msg::Ack);
        });

        assert_eq!(outcome, SendOutcome::Delivered { attempts: 2 });
        assert_eq!(start.elapsed(), Duration::from_millis(160));
        assert_eq!(link.transmissions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let link = RecordingLink::default();
        let cancel = CancellationToken::new();
        let mut sender = ReliableSender::new(link.clone(), cancel.clone());

        let start = Instant::now();
        let msg = update();
        let (outcome, ()) = tokio::join!(sender.send(&msg), async {
            sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        assert_eq!(outcome, SendOutcome::Cancelled);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn only_ack_frames_set_the_flag() {
        let handle = AckHandle {
            acked: Arc::new(AtomicBool::new(false)),
        };
        assert!(!handle.handle_ack(&update()));
        assert!(!handle.acked.load(Ordering::Acquire));
        assert!(handle.handle_ack(&Msg::Ack));
        assert!(handle.acked.load(Ordering::Acquire));
    }
}
