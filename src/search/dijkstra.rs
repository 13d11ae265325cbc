// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{best_first, Metric, Route, SearchError};
use crate::Graph;

/// Uses [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// to find the fastest route between two nodes in the provided graph.
///
/// Edges are weighted by their [cost](crate::Edge::cost), that is travel time in hours.
///
/// Returns `Ok(None)` if there is no route between the two nodes, or if more than
/// `step_limit` nodes would need to be expanded to find one.
pub fn find_route_dijkstra(
    g: &Graph,
    start: i64,
    goal: i64,
    step_limit: usize,
) -> Result<Option<Route>, SearchError> {
    best_first(g, start, goal, step_limit, Metric::Time, |edge| edge.cost, |_| 0.0)
}
