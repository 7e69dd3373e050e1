use std::fmt::{Display, Formatter};
use crate::models::position::Coordinate;
use crate::models::updates::OutboundUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    SensorFix(Coordinate),
    SensorFailure(String),
    Key(Direction),
    RemoteLocation { id: String, position: Coordinate },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    Tracker,
    Destination,
    Peer(String),
}

impl Display for MarkerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerKind::Tracker => write!(f, "tracker"),
            MarkerKind::Destination => write!(f, "destination"),
            MarkerKind::Peer(id) => write!(f, "peer:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Emit(OutboundUpdate),
    PlaceMarker(MarkerKind, Coordinate),
    RemoveMarker(MarkerKind),
    FitBounds(Vec<Coordinate>),
    ShowPopup(MarkerKind, String),
    Notify(String),
}
