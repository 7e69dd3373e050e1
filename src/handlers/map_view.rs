use std::collections::BTreeMap;
use async_trait::async_trait;
use tracing::{debug, info, warn};
use crate::handlers::events::MarkerKind;
use crate::models::position::Coordinate;

#[async_trait]
pub trait MapView: Send {
    async fn place_marker(&mut self, marker: MarkerKind, position: Coordinate);
    async fn remove_marker(&mut self, marker: MarkerKind);
    async fn fit_bounds(&mut self, points: Vec<Coordinate>);
    async fn show_popup(&mut self, marker: MarkerKind, text: String);
    async fn notify(&mut self, message: String);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn around(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = Self {
            south: first.latitude,
            west: first.longitude,
            north: first.latitude,
            east: first.longitude,
        };
        Some(rest.iter().fold(start, |b, p| Self {
            south: b.south.min(p.latitude),
            west: b.west.min(p.longitude),
            north: b.north.max(p.latitude),
            east: b.east.max(p.longitude),
        }))
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}

/// Map view that writes every change to the log.
#[derive(Default)]
pub struct LogMapView {
    markers: BTreeMap<MarkerKind, Coordinate>,
    viewport: Option<Bounds>,
}

impl LogMapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &BTreeMap<MarkerKind, Coordinate> {
        &self.markers
    }

    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }
}

#[async_trait]
impl MapView for LogMapView {
    async fn place_marker(&mut self, marker: MarkerKind, position: Coordinate) {
        match self.markers.insert(marker.clone(), position) {
            None => info!("Added {} marker at {}", marker, position),
            Some(_) => debug!("Moved {} marker to {}", marker, position),
        }
    }

    async fn remove_marker(&mut self, marker: MarkerKind) {
        if self.markers.remove(&marker).is_some() {
            info!("Removed {} marker", marker);
        }
    }

    async fn fit_bounds(&mut self, points: Vec<Coordinate>) {
        match Bounds::around(&points) {
            Some(bounds) => {
                debug!("Viewport [{:.6}, {:.6}] - [{:.6}, {:.6}], center {}",
                    bounds.south, bounds.west, bounds.north, bounds.east, bounds.center());
                self.viewport = Some(bounds);
            }
            None => warn!("Nothing to fit the viewport to"),
        }
    }

    async fn show_popup(&mut self, marker: MarkerKind, text: String) {
        info!("[{}] {}", marker, text);
    }

    async fn notify(&mut self, message: String) {
        info!("{}", message);
    }
}
