// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Road network ingestion and in-memory routing over
//! [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! Ingestion turns an OSM XML extract into a flat list of nodes and directed edges,
//! keeping only vehicle-navigable road classes and precomputing the distance (km)
//! and travel time (hours) of every edge. Those records are persisted in a
//! [GraphStore](store::GraphStore), loaded back into an immutable [Graph] by the
//! [GraphLoader], and queried with [A*](Algorithm::AStar) (shortest distance) or
//! [Dijkstra](Algorithm::Dijkstra) (shortest time).
//!
//! # Example
//!
//! ```no_run
//! use roadgraph::store::{DirStore, GraphStore};
//!
//! let options = roadgraph::osm::Options {
//!     profile: &roadgraph::osm::CAR_PROFILE,
//!     file_format: roadgraph::osm::FileFormat::Unknown,
//!     bbox: [0.0; 4],
//! };
//! let ingest = roadgraph::osm::ingest_from_file(&options, "path/to/district.osm")
//!     .expect("failed to ingest the extract");
//!
//! let store = DirStore::new("path/to/store");
//! store.write_all(&ingest).expect("failed to persist the graph");
//!
//! let service = roadgraph::RoutingService::new(store);
//! service.load_graph().expect("failed to load the graph");
//!
//! let start = service.snap(21.0122, 105.8522).unwrap().unwrap();
//! let end = service.snap(21.0050, 105.8600).unwrap().unwrap();
//! let route = service.find_path(start, end, Some("dijkstra")).expect("invalid query");
//! println!("Route: {:?}", route);
//! ```

use serde::{Deserialize, Serialize};

mod distance;
mod graph;
mod kd;
mod loader;
pub mod osm;
pub mod search;
mod service;
pub mod snap;
pub mod store;

pub use distance::earth_distance;
pub use graph::{Graph, GraphStats};
pub use kd::KDTree;
pub use loader::{GraphLoader, LoadError};
pub use search::{Algorithm, Endpoint, Metric, Route, SearchError, DEFAULT_STEP_LIMIT};
pub use service::{QueryError, RoutingService};

/// Represents a routable point of the road network.
///
/// Ids come from the source map and are stable across ingestion runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// Represents a directed connection between two [Nodes](Node), created from
/// two consecutive nodes of a way.
///
/// `distance` is expressed in kilometers (rounded to meters), and `cost` is the
/// travel time in hours at the average speed of `road_class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: i64,
    pub to: i64,
    pub distance: f64,
    pub cost: f64,
    #[serde(rename = "wayId")]
    pub way_id: i64,
    #[serde(rename = "roadClass")]
    pub road_class: String,
}

impl Edge {
    /// Returns the same connection traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            distance: self.distance,
            cost: self.cost,
            way_id: self.way_id,
            road_class: self.road_class.clone(),
        }
    }
}
