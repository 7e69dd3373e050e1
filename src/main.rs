//! Realtime tracker client.
//!
//! Connect to a channel and drive the tracker from the keyboard with
//! ```not_rust
//! TRACKER_START_LAT=40.0 TRACKER_START_LON=-75.0 cargo run
//! ```
//! then type `up`, `down`, `left` or `right` (or `w`/`a`/`s`/`d`) and press enter.
//!
//! Replay a recorded track instead with
//! ```not_rust
//! TRACKER_SENSOR_REPLAY=track.jsonl cargo run
//! ```

mod config;
mod geo;
mod models;
mod handlers;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TrackerConfig;
use crate::handlers::event_actor::EventActor;
use crate::handlers::keyboard::KeyboardReader;
use crate::handlers::map_view::LogMapView;
use crate::handlers::sensor::GeolocationWatcher;
use crate::handlers::session::TrackerSession;
use crate::handlers::websocket_actor::{self, AutoCancelTask, WebsocketActor};
use crate::models::error::TrackerError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), TrackerError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "realtime_tracker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TrackerConfig::init()?;
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let (sensor_tx, sensor_rx) = mpsc::channel(8);
    let (keys_tx, keys_rx) = mpsc::channel(8);
    let (remote_tx, remote_rx) = mpsc::channel(8);
    let (outbound_tx, outbound_rx) = watch::channel(String::new());

    let socket = websocket_actor::connect(&config.server_url).await?;
    let channel = WebsocketActor::new(socket, remote_tx, outbound_rx);
    let _channel = AutoCancelTask(tokio::spawn(channel.run_actor()));

    let _sensor = match config.source {
        Some(source) => {
            let watcher = GeolocationWatcher::run_actor(source, config.sensor, sensor_tx);
            Some(AutoCancelTask(tokio::spawn(watcher)))
        }
        None => {
            warn!("No position source configured, keys are ignored until a fix arrives");
            None
        }
    };

    // left running on exit; the process ends with main
    KeyboardReader::spawn(std::io::BufReader::new(std::io::stdin()), keys_tx)?;

    let session = TrackerSession::new(config.session, rng);
    let view = LogMapView::new();
    let mut actor = EventActor::new(sensor_rx, keys_rx, remote_rx, outbound_tx, session, view);

    tokio::select! {
        _ = actor.run_actor() => (),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    let session = actor.session();
    info!("Stopped at {} with {} peers and {} markers on the map (viewport {:?})",
        session.current_position(),
        session.peer_count(),
        actor.view().markers().len(),
        actor.view().viewport());

    Ok(())
}
