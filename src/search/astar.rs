// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{best_first, Metric, Route, SearchError};
use crate::{earth_distance, Graph};

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest route between two nodes in the provided graph.
///
/// Edges are weighted by their [distance](crate::Edge::distance); the remaining
/// distance is estimated with [earth_distance] to the goal.
///
/// Returns `Ok(None)` if there is no route between the two nodes, or if more than
/// `step_limit` nodes would need to be expanded to find one
/// ([DEFAULT_STEP_LIMIT](super::DEFAULT_STEP_LIMIT) is recommended).
pub fn find_route_astar(
    g: &Graph,
    start: i64,
    goal: i64,
    step_limit: usize,
) -> Result<Option<Route>, SearchError> {
    let goal_node = g.get_node(goal);

    best_first(
        g,
        start,
        goal,
        step_limit,
        Metric::Distance,
        |edge| edge.distance,
        |at| match (g.get_node(at), goal_node) {
            (Some(a), Some(b)) => earth_distance(a.lat, a.lon, b.lat, b.lon),
            _ => 0.0,
        },
    )
}
