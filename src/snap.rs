// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Snapping of arbitrary positions onto routable nodes of a [Graph].
//!
//! The nearest node is not always the best starting point: a query made next to a
//! vehicle road should not snap onto a footway which happens to be a few meters closer.
//! Therefore the [DEFAULT_CANDIDATES] nearest nodes are considered, and the one with
//! the most important outgoing road wins.

use crate::kd::cmp_candidates;
use crate::{earth_distance, Graph, Node};

/// Number of nearest nodes considered when snapping.
pub const DEFAULT_CANDIDATES: usize = 10;

/// Returns the importance of a road class for snapping.
/// Unknown classes are treated as the least important roads.
pub fn road_class_priority(road_class: &str) -> i32 {
    match road_class {
        "motorway" | "trunk" => 5,
        "primary" => 4,
        "secondary" => 3,
        "tertiary" => 2,
        "residential" | "unclassified" | "living_street" | "service" | "road" => 1,
        _ => 0,
    }
}

/// Returns up to `count` nodes of the graph closest to the provided position,
/// together with their distance (in km), ordered by increasing distance and then by id.
///
/// This checks every node of the graph; [snap] uses the graph's spatial index instead,
/// which gives identical results.
pub fn find_nearest_nodes(g: &Graph, lat: f64, lon: f64, count: usize) -> Vec<(f64, Node)> {
    let mut candidates: Vec<(f64, Node)> = g
        .iter()
        .map(|&n| (earth_distance(lat, lon, n.lat, n.lon), n))
        .collect();
    candidates.sort_by(cmp_candidates);
    candidates.truncate(count);
    candidates
}

/// Picks the candidate whose most important outgoing edge has the highest
/// [road_class_priority]. Ties keep the earlier (closer) candidate.
///
/// If no candidate has an outgoing edge with a positive priority,
/// the first candidate is returned.
pub fn best_snap_node(candidates: &[(f64, Node)], g: &Graph) -> Option<i64> {
    let mut best: Option<i64> = None;
    let mut best_priority: i32 = 0;

    for (_, candidate) in candidates {
        let priority = g
            .get_edges(candidate.id)
            .map(|e| road_class_priority(&e.road_class))
            .max();

        if let Some(priority) = priority {
            if priority > best_priority {
                best = Some(candidate.id);
                best_priority = priority;
            }
        }
    }

    best.or_else(|| candidates.first().map(|(_, n)| n.id))
}

/// Finds the best routable node for a position, considering
/// [DEFAULT_CANDIDATES] nearest nodes. Returns `None` if the graph is empty
/// or the position is not finite.
pub fn snap(g: &Graph, lat: f64, lon: f64) -> Option<i64> {
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    let candidates = match g.index() {
        Some(index) => index.find_nearest_nodes(lat, lon, DEFAULT_CANDIDATES),
        None => find_nearest_nodes(g, lat, lon, DEFAULT_CANDIDATES),
    };
    best_snap_node(&candidates, g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Edge;

    fn node(id: i64, lat: f64, lon: f64) -> Node {
        Node { id, lat, lon }
    }

    fn road(from: i64, to: i64, road_class: &str) -> [Edge; 2] {
        let e = Edge {
            from,
            to,
            distance: 0.111,
            cost: 0.111 / 30.0,
            way_id: from * 100 + to,
            road_class: road_class.to_string(),
        };
        let r = e.reversed();
        [e, r]
    }

    #[test]
    fn priorities() {
        assert_eq!(road_class_priority("motorway"), 5);
        assert_eq!(road_class_priority("trunk"), 5);
        assert_eq!(road_class_priority("primary"), 4);
        assert_eq!(road_class_priority("secondary"), 3);
        assert_eq!(road_class_priority("tertiary"), 2);
        assert_eq!(road_class_priority("living_street"), 1);
        assert_eq!(road_class_priority("service"), 1);
        assert_eq!(road_class_priority("footway"), 0);
        assert_eq!(road_class_priority("steps"), 0);
        assert_eq!(road_class_priority("motorway_link"), 0);
    }

    #[test]
    fn prefers_vehicle_roads_over_footways() {
        // Footway 1-2 runs right next to the query point,
        // residential street 3-4 is ~55 m further north.
        let g = Graph::from_records(
            [
                node(1, 0.0, 0.0),
                node(2, 0.0, 0.001),
                node(3, 0.0005, 0.0),
                node(4, 0.0005, 0.001),
            ],
            road(1, 2, "footway").into_iter().chain(road(3, 4, "residential")),
        );

        let nearest = find_nearest_nodes(&g, 0.0001, 0.0, DEFAULT_CANDIDATES);
        assert_eq!(nearest[0].1.id, 1);
        assert_eq!(best_snap_node(&nearest, &g), Some(3));
        assert_eq!(snap(&g, 0.0001, 0.0), Some(3));
    }

    #[test]
    fn prefers_more_important_roads() {
        let g = Graph::from_records(
            [
                node(1, 0.0, 0.0),
                node(2, 0.0, 0.001),
                node(3, 0.0005, 0.0),
                node(4, 0.0005, 0.001),
            ],
            road(1, 2, "residential").into_iter().chain(road(3, 4, "primary")),
        );
        assert_eq!(snap(&g, 0.0001, 0.0), Some(3));
    }

    #[test]
    fn ties_keep_closest() {
        let g = Graph::from_records(
            [node(1, 0.0, 0.0), node(2, 0.0, 0.001), node(3, 0.0, 0.002)],
            road(1, 2, "tertiary").into_iter().chain(road(2, 3, "tertiary")),
        );
        assert_eq!(snap(&g, 0.0, 0.0018), Some(3));
        assert_eq!(snap(&g, 0.0, 0.0011), Some(2));
    }

    #[test]
    fn falls_back_to_nearest() {
        let g = Graph::from_records(
            [node(1, 0.0, 0.0), node(2, 0.0, 0.001), node(3, 0.0005, 0.0)],
            road(1, 2, "footway"),
        );

        // Only footways and an isolated node nearby
        assert_eq!(snap(&g, 0.0004, 0.0), Some(3));
        assert_eq!(snap(&g, 0.0, 0.0009), Some(2));
    }

    #[test]
    fn only_considers_candidates() {
        let g = Graph::from_records(
            [
                node(1, 0.0, 0.0),
                node(2, 0.0, 0.0002),
                node(3, 0.0005, 0.0),
                node(4, 0.0005, 0.001),
            ],
            road(1, 2, "footway").into_iter().chain(road(3, 4, "residential")),
        );

        let nearest = find_nearest_nodes(&g, 0.0, -0.0001, 2);
        assert_eq!(nearest.iter().map(|(_, n)| n.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(best_snap_node(&nearest, &g), Some(1));
        assert_eq!(best_snap_node(&[], &g), None);
    }

    #[test]
    fn linear_scan_matches_index() {
        let mut nodes = Vec::default();
        for i in 0..12 {
            for j in 0..12 {
                let id = i * 12 + j;
                let jitter = ((id * 37) % 11) as f64 * 0.0001;
                nodes.push(node(id, i as f64 * 0.003 + jitter, j as f64 * 0.003 - jitter));
            }
        }
        let g = Graph::from_records(nodes, Vec::<Edge>::new());
        let index = g.index().unwrap();

        for &(lat, lon) in &[(0.0, 0.0), (0.0161, 0.0093), (0.05, -0.01), (0.021, 0.021)] {
            let linear = find_nearest_nodes(&g, lat, lon, DEFAULT_CANDIDATES);
            let indexed = index.find_nearest_nodes(lat, lon, DEFAULT_CANDIDATES);
            assert_eq!(linear, indexed, "query ({lat}, {lon})");
        }
    }

    #[test]
    fn invalid_queries() {
        let g = Graph::from_records([node(1, 0.0, 0.0)], Vec::<Edge>::new());
        assert_eq!(snap(&g, f64::NAN, 0.0), None);
        assert_eq!(snap(&g, 0.0, f64::INFINITY), None);
        assert_eq!(snap(&Graph::default(), 0.0, 0.0), None);
    }
}
