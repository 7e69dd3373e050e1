use tokio::select;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use crate::handlers::events::{Command, Direction, TrackerEvent};
use crate::handlers::map_view::MapView;
use crate::handlers::session::TrackerSession;

/// Owns the session and applies events from every source one at a time.
pub struct EventActor<V: MapView> {
    sensor: mpsc::Receiver<TrackerEvent>,
    keys: mpsc::Receiver<Direction>,
    remote: mpsc::Receiver<TrackerEvent>,
    outbound: watch::Sender<String>,
    session: TrackerSession,
    view: V,
}

impl<V: MapView> EventActor<V> {
    pub fn new(sensor: mpsc::Receiver<TrackerEvent>,
               keys: mpsc::Receiver<Direction>,
               remote: mpsc::Receiver<TrackerEvent>,
               outbound: watch::Sender<String>,
               session: TrackerSession,
               view: V) -> Self {
        Self {
            sensor,
            keys,
            remote,
            outbound,
            session,
            view,
        }
    }

    pub fn session(&self) -> &TrackerSession {
        &self.session
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Runs until every source has closed.
    pub async fn run_actor(&mut self) {
        let mut sensor_open = true;
        let mut keys_open = true;
        let mut remote_open = true;

        loop {
            // sensor first so a queued fix lands before queued keys
            let event = select! {
                biased;
                event = self.sensor.recv(), if sensor_open => match event {
                    Some(event) => event,
                    None => {
                        debug!("Sensor source closed");
                        sensor_open = false;
                        continue;
                    }
                },
                key = self.keys.recv(), if keys_open => match key {
                    Some(direction) => TrackerEvent::Key(direction),
                    None => {
                        debug!("Keyboard source closed");
                        keys_open = false;
                        continue;
                    }
                },
                event = self.remote.recv(), if remote_open => match event {
                    Some(event) => event,
                    None => {
                        debug!("Remote source closed");
                        remote_open = false;
                        continue;
                    }
                },
                else => break,
            };

            for command in self.session.dispatch(event) {
                self.execute(command).await;
            }
        }
        info!("All sources closed");
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Emit(update) => match serde_json::to_string(&update) {
                Ok(frame) => {
                    if self.outbound.send(frame).is_err() {
                        debug!("No channel to send location on");
                    }
                }
                Err(e) => warn!("Unable to serialize {:?}: {}", update, e),
            },
            Command::PlaceMarker(marker, position) => {
                self.view.place_marker(marker, position).await
            }
            Command::RemoveMarker(marker) => self.view.remove_marker(marker).await,
            Command::FitBounds(points) => self.view.fit_bounds(points).await,
            Command::ShowPopup(marker, text) => self.view.show_popup(marker, text).await,
            Command::Notify(message) => self.view.notify(message).await,
        }
    }
}
