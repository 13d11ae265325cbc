// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap};

use log::{info, trace};

use super::model::{Extract, Way};
use crate::osm::Profile;
use crate::{earth_distance, Edge, Node};

/// Records produced by a single ingestion run, ready to be written
/// into a [GraphStore](crate::store::GraphStore).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingest {
    /// Nodes touched by at least one edge, ordered by id.
    pub nodes: Vec<Node>,

    /// Accepted ways, kept for auditing; never consulted when routing.
    pub ways: Vec<Way>,

    /// Directed edges. Bidirectional ways contribute a mirrored pair per segment.
    pub edges: Vec<Edge>,

    pub stats: IngestStats,
}

/// Counters describing which ways and segments were accepted or skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub total_ways: usize,
    pub accepted_ways: usize,

    /// Ways without a road class, or with a class outside of the allowlist.
    pub skipped_class: usize,

    /// Ways closed by an access tag.
    pub skipped_access: usize,

    /// Ways with fewer than two known nodes.
    pub skipped_too_short: usize,

    /// Ways where every segment was dropped.
    pub skipped_no_segments: usize,

    /// Segments shorter than [Profile::min_segment_length].
    pub dropped_segments: usize,

    /// Segments referencing an unknown node.
    pub unresolved_segments: usize,
}

impl IngestStats {
    pub fn skipped_ways(&self) -> usize {
        self.skipped_class + self.skipped_access + self.skipped_too_short + self.skipped_no_segments
    }
}

/// Helper object used for storing state related to converting
/// [OSM ways](super::model::Way) into [Edges](Edge).
pub(super) struct EdgeBuilder<'a> {
    nodes: &'a HashMap<i64, Node>,
    profile: &'a Profile<'a>,
    used_nodes: BTreeSet<i64>,
    ways: Vec<Way>,
    edges: Vec<Edge>,
    stats: IngestStats,
}

impl<'a> EdgeBuilder<'a> {
    pub(super) fn new(nodes: &'a HashMap<i64, Node>, profile: &'a Profile<'a>) -> Self {
        Self {
            nodes,
            profile,
            used_nodes: BTreeSet::default(),
            ways: Vec::default(),
            edges: Vec::default(),
            stats: IngestStats::default(),
        }
    }

    pub(super) fn add_ways<I: IntoIterator<Item = Way>>(&mut self, ways: I) {
        ways.into_iter().for_each(|w| self.add_way(w));
    }

    fn add_way(&mut self, w: Way) {
        let profile = self.profile;
        self.stats.total_ways += 1;

        let class = match profile.road_class(&w.tags) {
            Some(class) => class.value,
            None => {
                trace!("way {}: not a navigable road", w.id);
                self.stats.skipped_class += 1;
                return;
            }
        };

        if !profile.is_allowed(&w.tags) {
            trace!("way {}: closed by access tags", w.id);
            self.stats.skipped_access += 1;
            return;
        }

        let known_nodes = w
            .nodes
            .iter()
            .filter(|&id| self.nodes.contains_key(id))
            .count();
        if known_nodes < 2 {
            trace!("way {}: fewer than 2 known nodes", w.id);
            self.stats.skipped_too_short += 1;
            return;
        }

        let one_way = profile.is_one_way(&w.tags);
        if self.create_edges(&w, class, one_way) == 0 {
            trace!("way {}: all segments dropped", w.id);
            self.stats.skipped_no_segments += 1;
            return;
        }

        self.stats.accepted_ways += 1;
        self.ways.push(w);
    }

    /// Creates edges for every pair of consecutive, known nodes of a way.
    /// Returns the number of segments which produced edges.
    fn create_edges(&mut self, w: &Way, class: &str, one_way: bool) -> usize {
        let nodes = self.nodes;
        let speed = self.profile.speed(class);
        debug_assert!(speed.is_finite() && speed > 0.0);

        let mut segments = 0;
        for pair in w.nodes.windows(2) {
            let (left, right) = match (nodes.get(&pair[0]), nodes.get(&pair[1])) {
                (Some(left), Some(right)) => (left, right),
                _ => {
                    self.stats.unresolved_segments += 1;
                    continue;
                }
            };

            let exact = earth_distance(left.lat, left.lon, right.lat, right.lon);
            if exact < self.profile.min_segment_length {
                self.stats.dropped_segments += 1;
                continue;
            }

            let distance = round_to_meters(exact);
            let forward = Edge {
                from: left.id,
                to: right.id,
                distance,
                cost: distance / speed,
                way_id: w.id,
                road_class: class.to_string(),
            };

            if !one_way {
                let backward = forward.reversed();
                self.edges.push(forward);
                self.edges.push(backward);
            } else {
                self.edges.push(forward);
            }

            self.used_nodes.insert(left.id);
            self.used_nodes.insert(right.id);
            segments += 1;
        }

        segments
    }

    pub(super) fn finish(self) -> Ingest {
        let nodes: Vec<Node> = self
            .used_nodes
            .iter()
            .filter_map(|id| self.nodes.get(id).copied())
            .collect();

        info!(
            "accepted ways: {} / {} ({} edges, {} of {} nodes used)",
            self.stats.accepted_ways,
            self.stats.total_ways,
            self.edges.len(),
            nodes.len(),
            self.nodes.len(),
        );

        Ingest {
            nodes,
            ways: self.ways,
            edges: self.edges,
            stats: self.stats,
        }
    }
}

/// Turns an [Extract] into routable records as per the provided [Profile].
pub fn build_edges(extract: Extract, profile: &Profile<'_>) -> Ingest {
    let Extract { nodes, ways } = extract;
    let mut b = EdgeBuilder::new(&nodes, profile);
    b.add_ways(ways);
    b.finish()
}

#[inline]
fn round_to_meters(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}
