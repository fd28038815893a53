use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use protocol::Channel;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use sensor_node::sender::ReliableSender;
use sensor_node::sensors::{Dht, Dimmer, Gas, Motion};
use sensor_node::sim::{SimDht, SimDimmerPin, SimMq, SimPir};
use sensor_node::store::RonStore;
use sensor_node::transport::{self, UdpLink};

#[derive(Parser)]
#[command(name = "sensor node")]
#[command(version = "1.0")]
#[command(about = "reads the node's sensors and reports changes to the gateway")]
struct Cli {
    /// gateway address updates are sent to
    #[arg(short, long, default_value = "127.0.0.1:4080")]
    gateway: SocketAddr,
    /// local address to bind the radio socket on
    #[arg(short, long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,
    /// time between sensor polls in milliseconds
    #[arg(short, long, default_value = "500")]
    poll_interval: u64,
    /// where the dimmer level is persisted between runs
    #[arg(short, long, default_value = "sensor-node-state.ron")]
    state_file: PathBuf,
    /// correction for a dht with a permanent temperature offset
    #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
    temperature_offset: f32,
}

// channel ids as registered on the gateway for this node
const TEMPERATURE: Channel = Channel(0);
const HUMIDITY: Channel = Channel(1);
const MOTION: Channel = Channel(2);
const LPG: Channel = Channel(3);
const CO: Channel = Channel(4);
const SMOKE: Channel = Channel(5);
const DIMMER: Channel = Channel(6);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install().unwrap();
    let cli = Cli::parse();

    setup_tracing().unwrap();

    let link = UdpLink::connect(cli.bind, cli.gateway)
        .await
        .wrap_err("could not open the gateway socket")?;
    let cancel = CancellationToken::new();
    let mut sender = ReliableSender::new(link.clone(), cancel.clone());

    let (set_level_tx, mut set_level_rx) = mpsc::channel(16);
    let _receiver = transport::spawn_receiver(&link, sender.ack_handle(), set_level_tx);

    let store = RonStore::open(cli.state_file).wrap_err("could not open the state file")?;
    let mut dht = Dht::new(SimDht::new(), TEMPERATURE, HUMIDITY, cli.temperature_offset);
    let mut motion = Motion::new(SimPir::new(), MOTION);
    let mut gas = Gas::new(SimMq::new(), LPG, CO, SMOKE);
    let mut dimmer = Dimmer::new(SimDimmerPin, store, DIMMER);

    info!("reporting to gateway on {}", cli.gateway);

    let mut poll = tokio::time::interval(Duration::from_millis(cli.poll_interval));
    loop {
        tokio::select! {
            _ = poll.tick() => {
                // one flow in flight at a time: a slow unacked send
                // delays the rest of this polling round
                dht.report(&mut sender).await;
                motion.report(&mut sender).await;
                gas.report(&mut sender).await;
                dimmer.report(&mut sender).await;
            }
            Some(order) = set_level_rx.recv() => {
                if order.channel == DIMMER {
                    dimmer.set(order.percent);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                cancel.cancel();
                return Ok(());
            }
        }
    }
}

fn setup_tracing() -> Result<()> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::EnvFilter::from_default_env());
    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
