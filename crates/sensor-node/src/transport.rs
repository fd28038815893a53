use std::net::SocketAddr;
use std::sync::Arc;

use protocol::{Msg, SetLevel};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sender::AckHandle;

/// Best effort transmission of one encoded message. Success is only
/// ever observed through a later ack; implementations must not retry,
/// that is [`crate::sender::ReliableSender`]'s job.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn transmit(&mut self, msg: &Msg);
}

/// Datagram link to the gateway. Lost frames are the normal case the
/// retry layer exists for, so send errors are only logged.
#[derive(Clone)]
pub struct UdpLink {
    socket: Arc<UdpSocket>,
    gateway: SocketAddr,
}

impl UdpLink {
    pub async fn connect(bind: SocketAddr, gateway: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(bind).await?;
        Ok(Self {
            socket: Arc::new(socket),
            gateway,
        })
    }
}

impl Transport for UdpLink {
    async fn transmit(&mut self, msg: &Msg) {
        if let Err(err) = self.socket.send_to(&msg.encode(), self.gateway).await {
            warn!("could not transmit to gateway: {err}");
        }
    }
}

/// Forwards every incoming frame to the party that cares: acks to the
/// in-flight sender, set-level orders to the dimmer. Everything else
/// is noise on the link.
pub fn spawn_receiver(
    link: &UdpLink,
    ack: AckHandle,
    set_level_tx: mpsc::Sender<SetLevel>,
) -> JoinHandle<()> {
    let socket = Arc::clone(&link.socket);
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        loop {
            let n = match socket.recv_from(&mut buf).await {
                Ok((n, _from)) => n,
                Err(err) => {
                    warn!("receive failed: {err}");
                    continue;
                }
            };

            let msg = match Msg::decode(&buf[..n]) {
                Ok(msg) => msg,
                Err(err) => {
                    warn!("could not decode incoming frame: {err}");
                    continue;
                }
            };

            if ack.handle_ack(&msg) {
                continue;
            }
            match msg {
                Msg::SetLevel(order) => {
                    if set_level_tx.send(order).await.is_err() {
                        // node is shutting down
                        return;
                    }
                }
                other => debug!("ignoring unexpected frame: {other:?}"),
            }
        }
    })
}
