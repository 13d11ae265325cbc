// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::{Edge, KDTree, Node};

/// Outgoing edges of a single node, keyed by the neighbor id.
pub type Neighbors = BTreeMap<i64, Edge>;

/// Immutable snapshot of a road network: a node table and a forward adjacency table.
///
/// Every node has an entry in the adjacency table, even if it has no outgoing edges.
/// Edges referencing unknown nodes are discarded when the graph is built.
/// A graph is never modified after construction; reloading creates a new one.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    nodes: BTreeMap<i64, Node>,
    adjacency: BTreeMap<i64, Neighbors>,
    edge_count: usize,
    index: Option<KDTree>,
}

/// Summary of a [Graph].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,

    /// Nodes without any outgoing edges.
    pub isolated_nodes: usize,
}

impl Graph {
    /// Builds a graph from flat node and edge records.
    ///
    /// Later edges replace earlier edges with the same `from` and `to`.
    pub fn from_records<N, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = Node>,
        E: IntoIterator<Item = Edge>,
    {
        let nodes: BTreeMap<i64, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut adjacency: BTreeMap<i64, Neighbors> =
            nodes.keys().map(|&id| (id, Neighbors::default())).collect();

        let mut dangling: usize = 0;
        for e in edges {
            if !nodes.contains_key(&e.to) {
                dangling += 1;
                continue;
            }

            match adjacency.get_mut(&e.from) {
                Some(neighbors) => {
                    neighbors.insert(e.to, e);
                }
                None => dangling += 1,
            }
        }

        if dangling > 0 {
            warn!("discarded {} edges referencing unknown nodes", dangling);
        }

        let edge_count = adjacency.values().map(|n| n.len()).sum();
        let index = KDTree::from_iter(nodes.values().copied());

        Self {
            nodes,
            adjacency,
            edge_count,
            index,
        }
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of directed edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns the node table.
    pub fn nodes(&self) -> &BTreeMap<i64, Node> {
        &self.nodes
    }

    /// Returns the adjacency table.
    pub fn adjacency(&self) -> &BTreeMap<i64, Neighbors> {
        &self.adjacency
    }

    /// Checks whether a node can be used as a start or goal of a route.
    pub fn contains(&self, id: i64) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<Node> {
        self.nodes.get(&id).copied()
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from_id: i64) -> impl Iterator<Item = &Edge> {
        self.adjacency.get(&from_id).into_iter().flat_map(|n| n.values())
    }

    /// Gets the [Edge] from one node to another, if it exists.
    pub fn get_edge(&self, from_id: i64, to_id: i64) -> Option<&Edge> {
        self.adjacency.get(&from_id)?.get(&to_id)
    }

    /// Finds the closest [Node] to the given position.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        self.index.as_ref().map(|t| t.find_nearest_node(lat, lon))
    }

    /// Returns the spatial index over all nodes; `None` only for an empty graph.
    pub fn index(&self) -> Option<&KDTree> {
        self.index.as_ref()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edge_count,
            isolated_nodes: self.adjacency.values().filter(|n| n.is_empty()).count(),
        }
    }
}
