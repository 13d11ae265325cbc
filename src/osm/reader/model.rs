// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way).
///
/// Ways without tags or node references are valid, but never routable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub tags: HashMap<String, String>,
}

/// Union over the [OSM features/elements](https://wiki.openstreetmap.org/wiki/Elements)
/// relevant for routing. Relations are skipped by the readers.
#[derive(Debug, Clone)]
pub enum Feature {
    Node(Node),
    Way(Way),
}

/// All nodes and ways of a parsed map extract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extract {
    /// All nodes, keyed by their id.
    pub nodes: HashMap<i64, Node>,

    /// All ways, in the order of the source document.
    pub ways: Vec<Way>,
}
