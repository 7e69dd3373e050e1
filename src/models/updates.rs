use serde::{Deserialize, Serialize};
use crate::models::position::Coordinate;

// Channel frames are `{"event": "<name>", "data": {...}}`.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundUpdate {
    SendLocation(Coordinate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundUpdate {
    ReceiveLocation(PeerLocation),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerLocation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PeerLocation {
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_location_frame_shape() {
        let update = OutboundUpdate::SendLocation(Coordinate::new(1.5, -2.25));
        let frame = serde_json::to_value(update).unwrap();
        assert_eq!(frame, serde_json::json!({
            "event": "send-location",
            "data": { "latitude": 1.5, "longitude": -2.25 }
        }));
    }

    #[test]
    fn receive_location_frame_parses() {
        let raw =
            r#"{"event":"receive-location","data":{"id":"abc","latitude":10.0,"longitude":20.0}}"#;
        let InboundUpdate::ReceiveLocation(peer) = serde_json::from_str(raw).unwrap();
        assert_eq!(peer.id, "abc");
        assert_eq!(peer.position(), Coordinate::new(10.0, 20.0));
    }

    #[test]
    fn unknown_event_is_rejected() {
        let raw = r#"{"event":"user-disconnected","data":{"id":"abc"}}"#;
        assert!(serde_json::from_str::<InboundUpdate>(raw).is_err());
    }
}
