// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use log::{debug, info};

use crate::search::{Algorithm, Route, SearchError, UnknownAlgorithm, DEFAULT_STEP_LIMIT};
use crate::store::GraphStore;
use crate::{snap, Graph, GraphLoader, GraphStats, LoadError};

/// Error returned by [RoutingService] queries.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    UnknownAlgorithm(#[from] UnknownAlgorithm),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("graph not available: {0}")]
    Load(#[from] LoadError),

    #[error("invalid coordinates: {lat}, {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

/// Entry point for callers: owns a [GraphLoader] and answers routing
/// and snapping queries against the currently published graph.
///
/// All methods take `&self`; a service may be shared between threads,
/// with queries running in parallel to reloads.
#[derive(Debug)]
pub struct RoutingService<S: GraphStore> {
    loader: GraphLoader<S>,
    step_limit: usize,
}

impl<S: GraphStore> RoutingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            loader: GraphLoader::new(store),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Overrides the maximum number of node expansions per search.
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn loader(&self) -> &GraphLoader<S> {
        &self.loader
    }

    /// Loads the graph from the store and publishes it.
    pub fn load_graph(&self) -> Result<GraphStats, LoadError> {
        self.loader.load_all().map(|g| g.stats())
    }

    /// Rebuilds the graph from the current contents of the store. Queries already
    /// in progress finish on the previous graph.
    pub fn reload_graph(&self) -> Result<GraphStats, LoadError> {
        info!("reloading graph");
        self.load_graph()
    }

    pub fn is_loaded(&self) -> bool {
        self.loader.is_loaded()
    }

    /// Returns the currently published graph, without loading it.
    pub fn graph(&self) -> Arc<Graph> {
        self.loader.graph()
    }

    pub fn stats(&self) -> GraphStats {
        self.loader.graph().stats()
    }

    /// Returns the names accepted by [RoutingService::find_path].
    pub fn list_algorithms(&self) -> Vec<&'static str> {
        Algorithm::ALL.iter().map(|a| a.name()).collect()
    }

    /// Finds a route between two nodes using the algorithm with the given name
    /// (A* if `None`). The graph is loaded first if no graph with edges was loaded yet.
    ///
    /// Returns `Ok(None)` if the goal is unreachable.
    pub fn find_path(
        &self,
        start: i64,
        goal: i64,
        algorithm: Option<&str>,
    ) -> Result<Option<Route>, QueryError> {
        let algorithm = match algorithm {
            Some(name) => name.parse()?,
            None => Algorithm::DEFAULT,
        };

        let g = self.current_graph()?;
        debug!("{} query {} → {}", algorithm, start, goal);
        Ok(algorithm.find_path(&g, start, goal, self.step_limit)?)
    }

    /// Finds the best routable node near a position, see [snap::snap].
    /// The graph is loaded first if no graph with edges was loaded yet.
    pub fn snap(&self, lat: f64, lon: f64) -> Result<Option<i64>, QueryError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(QueryError::InvalidCoordinates { lat, lon });
        }

        let g = self.current_graph()?;
        Ok(snap::snap(&g, lat, lon))
    }

    fn current_graph(&self) -> Result<Arc<Graph>, LoadError> {
        if self.loader.is_loaded() {
            Ok(self.loader.graph())
        } else {
            self.loader.load_all()
        }
    }
}
