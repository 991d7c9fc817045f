// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Indoor routing over crowd-recorded building maps.
//!
//! Floornav keeps a weighted undirected graph of points of interest inside a
//! multi-floor building. Edges are synthesized from walked trajectories
//! (recorded via [Recorder]) or from automatic vertical links between
//! same-named stairs/lifts across floors, and queried with Dijkstra-based
//! [shortest_path] and [k_shortest_paths] searches. Maps round-trip through
//! a JSON document shape via the [persist] module.
//!
//! # Example
//!
//! ```
//! use floornav::{shortest_path, Edge, Map, Node, NodeKind, Point};
//!
//! let mut map = Map::new();
//! let entrance = Node::new("Main Entrance", NodeKind::Entrance, vec![], 1, Point::new(0.0, 0.0, 0.0), None);
//! let lobby = Node::new("Lobby", NodeKind::Junction, vec![], 1, Point::new(15.0, 0.0, 0.0), None);
//! let entrance_id = entrance.id.clone();
//! let lobby_id = lobby.id.clone();
//!
//! map.insert_node(entrance).unwrap();
//! map.insert_node(lobby).unwrap();
//! map.insert_edge(Edge::walked(
//!     &entrance_id,
//!     &lobby_id,
//!     1,
//!     15.0,
//!     vec![Point::new(0.0, 0.0, 0.0), Point::new(15.0, 0.0, 0.0)],
//! ))
//! .unwrap();
//!
//! let path = shortest_path(&map, &entrance_id, &lobby_id).unwrap();
//! assert_eq!(path.distance, 15.0);
//! ```

mod distance;
mod map;
pub mod persist;
mod project;
mod record;
mod route;

pub use distance::{planar_distance, point_distance, polyline_length};
pub use map::{Adjacency, GraphError, Map, Neighbor};
pub use project::{GeoSample, OriginFix, ProjectionError, Projector};
pub use record::{
    auto_link_vertical, floor_change_hint, Recorder, FLOOR_HEIGHT, MIN_POINT_SPACING,
    PROXIMITY_RADIUS,
};
pub use route::{k_shortest_paths, shortest_path, Path, RouteError};

use serde::{Deserialize, Serialize};

/// A position in the local Cartesian frame, in meters.
///
/// The frame is anchored at the first geodetic fix of a mapping session
/// (see [Projector]); `x` grows east, `y` north, `z` up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// The geodetic fix which produced a [Node] position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Category of a point of interest. Determines vertical-linking
/// eligibility: only [Stairs](NodeKind::Stairs) and [Lift](NodeKind::Lift)
/// nodes participate in [auto_link_vertical].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Room,
    Junction,
    Stairs,
    Lift,
    Entrance,
    Toilet,
    #[default]
    #[serde(other)]
    Other,
}

impl NodeKind {
    /// Whether nodes of this kind are auto-linked across floors.
    pub fn is_vertical_circulation(self) -> bool {
        matches!(self, Self::Stairs | Self::Lift)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room => write!(f, "room"),
            Self::Junction => write!(f, "junction"),
            Self::Stairs => write!(f, "stairs"),
            Self::Lift => write!(f, "lift"),
            Self::Entrance => write!(f, "entrance"),
            Self::Toilet => write!(f, "toilet"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A named, floor-located point of interest in the building graph.
///
/// `floor` and `position.z` are fixed at creation; reassigning a node to
/// another floor requires deleting and recreating it, as every incident
/// edge was recorded against the old level.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Opaque unique identifier, generated at creation, immutable.
    pub id: String,
    /// Display string; not guaranteed unique across the graph.
    pub name: String,
    pub kind: NodeKind,
    /// Alternate search strings.
    pub aliases: Vec<String>,
    /// Level index. Non-contiguous integers are allowed, e.g. `-1`
    /// for a basement below ground floors.
    pub floor: i32,
    pub position: Point,
    /// The original geodetic fix, when the node was placed from a live
    /// position rather than loaded from a document without one.
    pub geo: Option<GeoPoint>,
}

impl Node {
    /// Creates a new point of interest with a freshly generated id.
    pub fn new(
        name: impl Into<String>,
        kind: NodeKind,
        aliases: Vec<String>,
        floor: i32,
        position: Point,
        geo: Option<GeoPoint>,
    ) -> Self {
        Self {
            id: new_id("N"),
            name: name.into(),
            kind,
            aliases,
            floor,
            position,
            geo,
        }
    }

    /// Checks whether `query` matches this node's name or any alias,
    /// case-insensitively.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&q)
            || self.aliases.iter().any(|a| a.to_lowercase().contains(&q))
    }
}

/// A weighted, undirected connection between two points of interest:
/// either a walked corridor or a synthesized vertical link.
///
/// The graph keeps at most one edge per unordered endpoint pair, and the
/// edge is traversable from either endpoint with identical weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
    /// The floor the connection lies on; `None` when `is_vertical`.
    pub floor: Option<i32>,
    /// Walking-path length in meters for walked edges (sum of segment
    /// lengths along `polyline`, not straight-line), or the synthetic
    /// vertical cost for vertical links.
    pub distance: f64,
    /// The physical path walked, ≥ 2 points. For vertical links this is
    /// just the two endpoint positions.
    pub polyline: Vec<Point>,
    pub is_vertical: bool,
    pub from_floor: Option<i32>,
    pub to_floor: Option<i32>,
}

impl Edge {
    /// Creates a walked (non-vertical) connection with a freshly
    /// generated id.
    pub fn walked(from: &str, to: &str, floor: i32, distance: f64, polyline: Vec<Point>) -> Self {
        Self {
            id: new_id("E"),
            from: from.to_string(),
            to: to.to_string(),
            floor: Some(floor),
            distance,
            polyline,
            is_vertical: false,
            from_floor: None,
            to_floor: None,
        }
    }

    /// Creates a vertical link between two floors with a freshly
    /// generated id.
    pub fn vertical(
        from: &str,
        to: &str,
        from_floor: i32,
        to_floor: i32,
        distance: f64,
        polyline: Vec<Point>,
    ) -> Self {
        Self {
            id: new_id("EV"),
            from: from.to_string(),
            to: to.to_string(),
            floor: None,
            distance,
            polyline,
            is_vertical: true,
            from_floor: Some(from_floor),
            to_floor: Some(to_floor),
        }
    }
}

/// Generates a prefixed opaque identifier, e.g. `N-1f0e…`.
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
