// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Shortest-path search over a [Graph].
//!
//! Two algorithms are available:
//! - [find_route_astar] minimizes traveled distance, guided by the great-circle
//!   distance to the goal,
//! - [find_route_dijkstra] minimizes travel time, using edge costs.

mod astar;
mod dijkstra;
mod error;
mod queue;

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use log::{debug, warn};
use serde::Serialize;

use crate::{Edge, Graph};

pub use astar::find_route_astar;
pub use dijkstra::find_route_dijkstra;
pub use error::{Endpoint, SearchError, DEFAULT_STEP_LIMIT};

/// Quantity minimized by a search algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Kilometers, summed [Edge::distance].
    Distance,

    /// Hours, summed [Edge::cost].
    Time,
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Ids of visited nodes, from start to goal.
    pub path: Vec<i64>,

    /// Number of traversed edges, `path.len() - 1`.
    pub steps: usize,

    /// Total length of the route, in kilometers.
    pub distance: f64,

    /// Total travel time of the route, in hours.
    pub time: f64,

    /// Value minimized by the algorithm, expressed in the unit of [Route::metric].
    pub score: f64,

    pub metric: Metric,
}

impl Route {
    fn trivial(at: i64, metric: Metric) -> Self {
        Self {
            path: vec![at],
            steps: 0,
            distance: 0.0,
            time: 0.0,
            score: 0.0,
            metric,
        }
    }
}

/// Registry of available search algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Algorithm {
    #[serde(rename = "astar")]
    AStar,

    #[serde(rename = "dijkstra")]
    Dijkstra,
}

impl Algorithm {
    /// All available algorithms, in the order they are listed to users.
    pub const ALL: [Algorithm; 2] = [Algorithm::AStar, Algorithm::Dijkstra];

    /// Name of the algorithm used when one is not requested explicitly.
    pub const DEFAULT: Algorithm = Algorithm::AStar;

    pub fn name(self) -> &'static str {
        match self {
            Self::AStar => "astar",
            Self::Dijkstra => "dijkstra",
        }
    }

    pub fn metric(self) -> Metric {
        match self {
            Self::AStar => Metric::Distance,
            Self::Dijkstra => Metric::Time,
        }
    }

    /// Searches for a route from `start` to `goal`, see [find_route_astar]
    /// and [find_route_dijkstra] for details.
    pub fn find_path(
        self,
        g: &Graph,
        start: i64,
        goal: i64,
        step_limit: usize,
    ) -> Result<Option<Route>, SearchError> {
        match self {
            Self::AStar => find_route_astar(g, start, goal, step_limit),
            Self::Dijkstra => find_route_dijkstra(g, start, goal, step_limit),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing a name which doesn't match any [Algorithm].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown algorithm: {0:?}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// Best-first search shared by all algorithms.
///
/// `weight` gives the cost of traversing an edge, `heuristic` gives the lower
/// bound of the remaining cost from a node to the goal (0 for uninformed search).
/// Nodes are settled at most once; stale frontier entries are skipped.
fn best_first<W, H>(
    g: &Graph,
    start: i64,
    goal: i64,
    step_limit: usize,
    metric: Metric,
    weight: W,
    heuristic: H,
) -> Result<Option<Route>, SearchError>
where
    W: Fn(&Edge) -> f64,
    H: Fn(i64) -> f64,
{
    if !g.contains(start) {
        return Err(SearchError::UnknownNode {
            endpoint: Endpoint::Start,
            id: start,
        });
    }
    if !g.contains(goal) {
        return Err(SearchError::UnknownNode {
            endpoint: Endpoint::Goal,
            id: goal,
        });
    }
    if start == goal {
        return Ok(Some(Route::trivial(start, metric)));
    }

    let mut frontier = queue::Frontier::default();
    let mut closed: HashSet<i64> = HashSet::default();
    let mut came_from: HashMap<i64, i64> = HashMap::default();
    let mut known_scores: HashMap<i64, f64> = HashMap::default();
    let mut expansions: usize = 0;

    known_scores.insert(start, 0.0);
    frontier.push(start, heuristic(start));

    while let Some(at) = frontier.pop() {
        if closed.contains(&at) {
            continue;
        }

        let at_score = known_scores.get(&at).copied().unwrap_or(f64::INFINITY);
        if at == goal {
            debug!(
                "route {} → {} found after {} expansions, {:?} score {}",
                start, goal, expansions, metric, at_score
            );
            return Ok(Some(reconstruct_route(g, &came_from, goal, at_score, metric)));
        }

        expansions += 1;
        if expansions > step_limit {
            warn!(
                "route {} → {}: step limit of {} expansions exceeded",
                start, goal, step_limit
            );
            return Ok(None);
        }

        closed.insert(at);

        for edge in g.get_edges(at) {
            if closed.contains(&edge.to) {
                continue;
            }

            let tentative = at_score + weight(edge);
            let improves = known_scores
                .get(&edge.to)
                .map_or(true, |&known| tentative < known);

            if improves {
                came_from.insert(edge.to, at);
                known_scores.insert(edge.to, tentative);
                frontier.push(edge.to, tentative + heuristic(edge.to));
            }
        }
    }

    debug!("route {} → {}: goal unreachable", start, goal);
    Ok(None)
}

fn reconstruct_route(
    g: &Graph,
    came_from: &HashMap<i64, i64>,
    goal: i64,
    score: f64,
    metric: Metric,
) -> Route {
    let mut path = vec![goal];
    let mut at = goal;
    while let Some(&prev) = came_from.get(&at) {
        path.push(prev);
        at = prev;
    }
    path.reverse();

    let (distance, time) = path
        .windows(2)
        .filter_map(|pair| g.get_edge(pair[0], pair[1]))
        .fold((0.0, 0.0), |(d, t), e| (d + e.distance, t + e.cost));

    Route {
        steps: path.len() - 1,
        path,
        distance,
        time,
        score,
        metric,
    }
}
