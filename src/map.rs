// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::project::OriginFix;
use crate::{Edge, Node};

/// Error conditions which may occur when mutating a [Map].
///
/// All of them are recoverable: a rejected mutation leaves the map
/// unchanged, and the caller may fix the input and retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node or edge with the same id is already present.
    DuplicateId(String),

    /// An edge references a node id that does not exist in the map.
    UnknownEndpoint(String),

    /// An edge connects a node to itself.
    SelfLoop(String),

    /// An edge (vertical or not) already connects the same unordered
    /// pair of endpoints.
    DuplicateConnection(String, String),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate id: {}", id),
            Self::UnknownEndpoint(id) => write!(f, "unknown endpoint: {}", id),
            Self::SelfLoop(id) => write!(f, "self-loop on node: {}", id),
            Self::DuplicateConnection(a, b) => {
                write!(f, "connection already exists between {} and {}", a, b)
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Represents one building revision as a set of [Nodes](Node) and undirected
/// [Edges](Edge) between them, plus the metadata surviving persistence.
///
/// The map holds no hidden global state and is never persisted by the
/// routing or recording components; the caller owns it exclusively and
/// serializes access (routing reads must not overlap with mutations).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Map {
    /// Building name, filled when loaded from a persisted document.
    pub name: Option<String>,
    /// The geodetic anchor of the local frame the coordinates live in.
    pub origin: Option<OriginFix>,
    /// Cumulative walked distance over all recording sessions, in meters.
    pub recorded_distance: f64,
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Edge>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the map.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the map.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node) in the map.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns an iterator over all [Edges](Edge) in the map.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Retrieves an [Edge] with the provided id.
    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Inserts a new [Node].
    ///
    /// Fails with [GraphError::DuplicateId] if a node with the same id is
    /// already present, leaving the map unchanged.
    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        match self.nodes.entry(node.id.clone()) {
            Entry::Vacant(e) => {
                e.insert(node);
                Ok(())
            }
            Entry::Occupied(_) => Err(GraphError::DuplicateId(node.id)),
        }
    }

    /// Inserts a new [Edge]. Insertion is all-or-nothing: on any error the
    /// map is left unchanged.
    ///
    /// Fails with [GraphError::UnknownEndpoint] if either endpoint is
    /// absent, [GraphError::SelfLoop] if both endpoints are the same node,
    /// [GraphError::DuplicateConnection] if any edge (vertical or not)
    /// already connects the same unordered endpoint pair, and
    /// [GraphError::DuplicateId] on a reused edge id.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if edge.from == edge.to {
            return Err(GraphError::SelfLoop(edge.from));
        }
        if !self.nodes.contains_key(&edge.from) {
            return Err(GraphError::UnknownEndpoint(edge.from));
        }
        if !self.nodes.contains_key(&edge.to) {
            return Err(GraphError::UnknownEndpoint(edge.to));
        }
        if self.connected(&edge.from, &edge.to) {
            return Err(GraphError::DuplicateConnection(edge.from, edge.to));
        }

        match self.edges.entry(edge.id.clone()) {
            Entry::Vacant(e) => {
                e.insert(edge);
                Ok(())
            }
            Entry::Occupied(_) => Err(GraphError::DuplicateId(edge.id)),
        }
    }

    /// Deletes a [Node] with a given id, cascading removal of every edge
    /// referencing it. Returns whether the node existed.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        self.edges.retain(|_, e| e.from != id && e.to != id);
        true
    }

    /// Deletes a single [Edge] with a given id. Returns whether the edge
    /// existed.
    pub fn remove_edge(&mut self, id: &str) -> bool {
        self.edges.remove(id).is_some()
    }

    /// Checks whether any edge connects the given unordered endpoint pair.
    pub fn connected(&self, a: &str, b: &str) -> bool {
        self.connection_between(a, b).is_some()
    }

    /// Finds the edge connecting the given unordered endpoint pair,
    /// if one exists.
    pub fn connection_between(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges
            .values()
            .find(|e| (e.from == a && e.to == b) || (e.from == b && e.to == a))
    }

    /// Returns an iterator over all edges incident to the given node.
    pub fn edges_at<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.from == id || e.to == id)
    }

    /// Returns the nodes located on the given floor, for display and
    /// proximity scans.
    pub fn nodes_on_floor(&self, floor: i32) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.floor == floor)
    }

    /// Returns the edges visible on the given floor: edges recorded on it
    /// plus every vertical link, matching how a floor plan is drawn.
    pub fn edges_on_floor(&self, floor: i32) -> impl Iterator<Item = &Edge> {
        self.edges
            .values()
            .filter(move |e| e.floor == Some(floor) || e.is_vertical)
    }

    /// Finds all nodes whose name or aliases match `query`,
    /// case-insensitively. Used by the search boundary to resolve
    /// user-typed locations.
    pub fn find_nodes(&self, query: &str) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.matches(query)).collect()
    }
}

/// A single entry of the [Adjacency] view: one direction of one edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub node: String,
    pub weight: f64,
    pub is_vertical: bool,
}

/// The adjacency view of a [Map] used for path search:
/// `node id -> outgoing neighbors`. Every edge contributes exactly two
/// entries, one per direction, both with the same weight.
///
/// The view is a snapshot: it does not observe later map mutations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Adjacency(HashMap<String, Vec<Neighbor>>);

impl Adjacency {
    /// Builds the adjacency view from a map.
    pub fn from_map(map: &Map) -> Self {
        let mut adj: HashMap<String, Vec<Neighbor>> = map
            .nodes()
            .map(|n| (n.id.clone(), Vec::new()))
            .collect();

        for edge in map.edges() {
            if let Some(neighbors) = adj.get_mut(&edge.from) {
                neighbors.push(Neighbor {
                    node: edge.to.clone(),
                    weight: edge.distance,
                    is_vertical: edge.is_vertical,
                });
            }
            if let Some(neighbors) = adj.get_mut(&edge.to) {
                neighbors.push(Neighbor {
                    node: edge.from.clone(),
                    weight: edge.distance,
                    is_vertical: edge.is_vertical,
                });
            }
        }

        Self(adj)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Gets all neighbors of a node with a given id.
    pub fn neighbors(&self, id: &str) -> &[Neighbor] {
        self.0.get(id).map(|n| n.as_slice()).unwrap_or_default()
    }

    /// Returns an iterator over `(node id, neighbors)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Neighbor>)> {
        self.0.iter()
    }

    /// Builds a copy of the view with the connection between the given
    /// unordered endpoint pair removed in both directions. Used by the
    /// alternative-route search to probe detours without touching the
    /// caller's live graph.
    pub fn without_connection(&self, a: &str, b: &str) -> Self {
        let mut filtered = self.0.clone();
        if let Some(neighbors) = filtered.get_mut(a) {
            neighbors.retain(|n| n.node != b);
        }
        if let Some(neighbors) = filtered.get_mut(b) {
            neighbors.retain(|n| n.node != a);
        }
        Self(filtered)
    }
}
