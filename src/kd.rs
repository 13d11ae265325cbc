// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;

use crate::{earth_distance, Node};

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree),
/// which speeds up nearest-neighbor search for snapping. A linear scan over every node
/// gives identical results, but a snapshot answering many snapping queries is better off
/// trading memory usage for CPU time.
///
/// This implementation assumes euclidean geometry, even though the default distance function
/// used is [earth_distance]. This results in undefined behavior when points
/// are close to the ante meridian (180°/-180° longitude) or poles (90°/-90° latitude),
/// or when the data spans multiple continents.
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: Node,
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

impl KDTree {
    /// Finds the closest [Node] to the given position.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Node {
        let mut best = Vec::with_capacity(2);
        self.find_nearest_impl(lat, lon, false, 1, &mut best);
        best[0].1
    }

    /// Finds up to `count` closest [Nodes](Node) to the given position, ordered by
    /// increasing distance (in kilometers, returned alongside every node).
    /// Nodes at the same distance are ordered by id.
    pub fn find_nearest_nodes(&self, lat: f64, lon: f64, count: usize) -> Vec<(f64, Node)> {
        let mut best = Vec::with_capacity(count + 1);
        if count > 0 {
            self.find_nearest_impl(lat, lon, false, count, &mut best);
        }
        best
    }

    fn find_nearest_impl(
        &self,
        lat: f64,
        lon: f64,
        lon_divides: bool,
        count: usize,
        best: &mut Vec<(f64, Node)>,
    ) {
        let pivot_dist = earth_distance(lat, lon, self.pivot.lat, self.pivot.lon);
        insert_candidate(best, count, pivot_dist, self.pivot);

        // Select which branch to recurse into first
        let first_left = if lon_divides {
            lon < self.pivot.lon
        } else {
            lat < self.pivot.lat
        };
        let (first, second) = if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(ref branch) = first {
            branch.find_nearest_impl(lat, lon, !lon_divides, count, best);
        }

        if let Some(ref branch) = second {
            // A closer node is possible in the second branch if and only if
            // the splitting axis is closer than the current worst candidate.
            let (axis_lat, axis_lon) = if lon_divides {
                (lat, self.pivot.lon)
            } else {
                (self.pivot.lat, lon)
            };
            let dist_to_axis = earth_distance(lat, lon, axis_lat, axis_lon);

            let worst = if best.len() < count {
                f64::INFINITY
            } else {
                best.last().map_or(f64::INFINITY, |&(d, _)| d)
            };

            if dist_to_axis <= worst {
                branch.find_nearest_impl(lat, lon, !lon_divides, count, best);
            }
        }
    }

    /// Builds a k-d tree from an iterable of [Nodes](Node).
    pub fn from_iter<I: IntoIterator<Item = Node>>(nodes: I) -> Option<Self> {
        let mut nodes = nodes.into_iter().collect::<Vec<_>>();
        Self::build(nodes.as_mut_slice())
    }

    /// Builds a k-d tree from a mutable slice of [Nodes](Node). Nodes will be reordered
    /// in the slice to facilitate building the tree.
    pub fn build(nodes: &mut [Node]) -> Option<Self> {
        Self::build_impl(nodes, false)
    }

    fn build_impl(nodes: &mut [Node], lon_divides: bool) -> Option<Self> {
        match nodes.len() {
            0 => None,
            1 => Some(Self {
                pivot: nodes[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    nodes.sort_by(|a, b| a.lon.total_cmp(&b.lon));
                } else {
                    nodes.sort_by(|a, b| a.lat.total_cmp(&b.lat));
                }
                let median = nodes.len() / 2;
                let pivot = nodes[median];
                let (left, right_and_pivot) = nodes.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: box_option(Self::build_impl(left, !lon_divides)),
                    right: box_option(Self::build_impl(right, !lon_divides)),
                })
            }
        }
    }
}

/// Orders snapping candidates by distance, then by node id.
pub(crate) fn cmp_candidates(a: &(f64, Node), b: &(f64, Node)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id))
}

/// Inserts a candidate into a sorted list of at most `count` best candidates.
fn insert_candidate(best: &mut Vec<(f64, Node)>, count: usize, dist: f64, node: Node) {
    let candidate = (dist, node);
    let pos = best.partition_point(|c| cmp_candidates(c, &candidate) == Ordering::Less);
    if pos < count {
        best.insert(pos, candidate);
        best.truncate(count);
    }
}

#[inline]
fn box_option<T>(o: Option<T>) -> Option<Box<T>> {
    o.map(|thing| Box::new(thing))
}
