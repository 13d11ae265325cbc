// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Recommended number of allowed node expansions in
/// [find_route_astar](crate::search::find_route_astar) and
/// [find_route_dijkstra](crate::search::find_route_dijkstra) before giving up on a route.
pub const DEFAULT_STEP_LIMIT: usize = 200_000;

/// Identifies an end of a requested route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    Goal,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Goal => write!(f, "goal"),
        }
    }
}

/// Error conditions which may occur when searching for a route.
///
/// An unreachable goal is not an error; searches report it as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// The start or goal node doesn't exist in the graph.
    UnknownNode { endpoint: Endpoint, id: i64 },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode { endpoint, id } => write!(f, "unknown {} node: {}", endpoint, id),
        }
    }
}

impl std::error::Error for SearchError {}
