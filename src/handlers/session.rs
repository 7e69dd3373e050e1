use std::collections::BTreeMap;
use rand::rngs::StdRng;
use tracing::{debug, error, info};
use crate::geo::{self, haversine_distance_km, random_nearby_point};
use crate::handlers::events::{Command, Direction, MarkerKind, TrackerEvent};
use crate::models::position::{Coordinate, Distance};
use crate::models::updates::OutboundUpdate;

pub const ARRIVAL_MESSAGE: &str = "You have reached the destination!";
pub const DESTINATION_POPUP: &str = "Destination";

/// Peers silent for this many peer updates are dropped from the map.
pub const DEFAULT_PEER_STALE_UPDATES: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub arrival_threshold_km: f64,
    pub destination_radius_deg: f64,
    pub key_step_deg: f64,
    /// 0 keeps every peer for the whole session.
    pub peer_stale_updates: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            arrival_threshold_km: geo::DEFAULT_ARRIVAL_THRESHOLD_KM,
            destination_radius_deg: geo::DEFAULT_DESTINATION_RADIUS_DEG,
            key_step_deg: geo::DEFAULT_KEY_STEP_DEG,
            peer_stale_updates: DEFAULT_PEER_STALE_UPDATES,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Peer {
    position: Coordinate,
    last_seen: u64,
}

/// State of one tracking session. Every transition goes through [`TrackerSession::dispatch`].
pub struct TrackerSession {
    settings: SessionSettings,
    current_position: Coordinate,
    destination: Option<Coordinate>,
    tracker_placed: bool,
    peers: BTreeMap<String, Peer>,
    peer_updates: u64,
    rng: StdRng,
}

impl TrackerSession {
    pub fn new(settings: SessionSettings, rng: StdRng) -> Self {
        Self {
            settings,
            current_position: Coordinate::default(),
            destination: None,
            tracker_placed: false,
            peers: BTreeMap::new(),
            peer_updates: 0,
            rng,
        }
    }

    pub fn current_position(&self) -> Coordinate {
        self.current_position
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    #[cfg(test)]
    pub fn peer_position(&self, id: &str) -> Option<Coordinate> {
        self.peers.get(id).map(|peer| peer.position)
    }

    pub fn distance_to_destination(&self) -> Option<Distance> {
        self.destination.map(|destination| Distance {
            km: haversine_distance_km(self.current_position, destination),
        })
    }

    pub fn dispatch(&mut self, event: TrackerEvent) -> Vec<Command> {
        match event {
            TrackerEvent::SensorFix(position) => self.on_sensor_fix(position),
            TrackerEvent::SensorFailure(e) => {
                error!("Geolocation error: {}", e);
                vec![]
            }
            TrackerEvent::Key(direction) => self.on_key(direction),
            TrackerEvent::RemoteLocation { id, position } => self.on_remote_location(id, position),
        }
    }

    fn on_sensor_fix(&mut self, position: Coordinate) -> Vec<Command> {
        self.current_position = position;
        self.tracker_placed = true;

        let mut commands = vec![
            Command::Emit(OutboundUpdate::SendLocation(position)),
            Command::PlaceMarker(MarkerKind::Tracker, position),
        ];

        if self.destination.is_none() {
            let destination = self.new_destination();
            commands.push(Command::PlaceMarker(MarkerKind::Destination, destination));
            commands.push(Command::ShowPopup(
                MarkerKind::Destination,
                DESTINATION_POPUP.to_string(),
            ));
        }

        commands.extend(self.fit_tracker_and_destination());
        commands.extend(self.check_arrival());
        commands
    }

    fn on_key(&mut self, direction: Direction) -> Vec<Command> {
        if !self.tracker_placed {
            debug!("Ignoring {:?} before the first position fix", direction);
            return vec![];
        }

        let step = self.settings.key_step_deg;
        match direction {
            Direction::Up => self.current_position.latitude += step,
            Direction::Down => self.current_position.latitude -= step,
            Direction::Left => self.current_position.longitude -= step,
            Direction::Right => self.current_position.longitude += step,
        }

        let position = self.current_position;
        let mut commands = vec![
            Command::PlaceMarker(MarkerKind::Tracker, position),
            Command::Emit(OutboundUpdate::SendLocation(position)),
        ];
        commands.extend(self.fit_tracker_and_destination());
        commands.extend(self.check_arrival());
        commands
    }

    fn on_remote_location(&mut self, id: String, position: Coordinate) -> Vec<Command> {
        debug!("Peer {} at {}", id, position);
        self.peer_updates += 1;
        self.peers.insert(id.clone(), Peer { position, last_seen: self.peer_updates });

        let mut commands = vec![Command::PlaceMarker(MarkerKind::Peer(id), position)];
        commands.extend(self.drop_stale_peers());

        let mut points = Vec::with_capacity(self.peers.len() + 2);
        if self.tracker_placed {
            points.push(self.current_position);
        }
        points.extend(self.destination);
        points.extend(self.peers.values().map(|peer| peer.position));

        commands.push(Command::FitBounds(points));
        commands
    }

    fn drop_stale_peers(&mut self) -> Vec<Command> {
        let stale_after = self.settings.peer_stale_updates;
        if stale_after == 0 {
            return vec![];
        }

        let now = self.peer_updates;
        let stale: Vec<String> = self.peers.iter()
            .filter(|(_, peer)| now - peer.last_seen >= stale_after)
            .map(|(id, _)| id.clone())
            .collect();

        stale.into_iter()
            .map(|id| {
                info!("Dropping peer {} after {} silent updates", id, stale_after);
                self.peers.remove(&id);
                Command::RemoveMarker(MarkerKind::Peer(id))
            })
            .collect()
    }

    fn new_destination(&mut self) -> Coordinate {
        let radius = self.settings.destination_radius_deg;
        let destination = random_nearby_point(self.current_position, radius, &mut self.rng);
        info!("New destination at {}", destination);
        self.destination = Some(destination);
        destination
    }

    fn fit_tracker_and_destination(&self) -> Option<Command> {
        self.destination
            .map(|destination| Command::FitBounds(vec![self.current_position, destination]))
    }

    fn check_arrival(&mut self) -> Vec<Command> {
        let Some(distance) = self.distance_to_destination() else {
            return vec![];
        };
        // standing on the destination always counts
        let arrived = distance.km == 0.0 || distance.km < self.settings.arrival_threshold_km;
        if !arrived {
            return vec![];
        }

        info!("Arrived at destination ({:.3} km away)", distance.km);
        let destination = self.new_destination();

        vec![
            Command::Notify(ARRIVAL_MESSAGE.to_string()),
            Command::PlaceMarker(MarkerKind::Destination, destination),
        ]
    }
}
