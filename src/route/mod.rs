// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod alternatives;
mod dijkstra;
mod error;

pub use alternatives::k_shortest_paths;
pub use dijkstra::shortest_path;
pub use error::RouteError;

use crate::{Map, Node};

/// The immutable result of a route query: the ordered node ids from
/// source to destination, the resolved [Node] values in the same order,
/// and the total weighted distance in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub node_ids: Vec<String>,
    pub nodes: Vec<Node>,
    pub distance: f64,
}

impl Path {
    pub(super) fn resolve(map: &Map, node_ids: Vec<String>, distance: f64) -> Self {
        let nodes = node_ids
            .iter()
            .filter_map(|id| map.get_node(id).cloned())
            .collect();
        Self {
            node_ids,
            nodes,
            distance,
        }
    }
}

/// Validates the endpoints of a route query.
///
/// A query from a node to itself is rejected as [RouteError::SameEndpoints]
/// rather than answered with a zero-length path; the surrounding product
/// treats it as a user input error, and the engine keeps that contract.
pub(super) fn check_endpoints(map: &Map, from_id: &str, to_id: &str) -> Result<(), RouteError> {
    if map.get_node(from_id).is_none() {
        return Err(RouteError::UnknownNode(from_id.to_string()));
    }
    if map.get_node(to_id).is_none() {
        return Err(RouteError::UnknownNode(to_id.to_string()));
    }
    if from_id == to_id {
        return Err(RouteError::SameEndpoints(from_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-9),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    /// The 8-node/7-edge sample building: entrance, lobby junction,
    /// staircase branch up to Room E2-01, plus a lift branch that dead-ends
    /// on floor 2.
    fn sample_building() -> Map {
        persist::load_from_str(include_str!("../test_fixtures/sample_map.json")).unwrap()
    }

    #[test]
    fn end_to_end_shortest_route_over_staircase() {
        let map = sample_building();
        let path = shortest_path(&map, "N1", "N6").unwrap();

        // entrance -> junction (15) -> stairs (10) -> vertical (4) -> room (12)
        assert_eq!(path.node_ids, ["N1", "N2", "N3", "N5", "N6"]);
        assert_almost_eq!(path.distance, 41.0);
        assert_eq!(path.nodes.len(), 5);
        assert_eq!(path.nodes[0].name, "Main Entrance");
        assert_eq!(path.nodes[4].name, "Room E2-01");
    }

    #[test]
    fn end_to_end_distance_is_symmetric() {
        let map = sample_building();
        let forward = shortest_path(&map, "N1", "N6").unwrap();
        let backward = shortest_path(&map, "N6", "N1").unwrap();
        assert_almost_eq!(forward.distance, backward.distance);
    }

    #[test]
    fn end_to_end_graceful_shortfall_below_k() {
        let map = sample_building();

        // The lift branch reaches floor 2 but never connects to Room
        // E2-01, so no second distinct route exists: asking for 2 must
        // yield exactly the one staircase route.
        let paths = k_shortest_paths(&map, "N1", "N6", 2).unwrap();
        assert_eq!(paths.len(), 1);
        assert_almost_eq!(paths[0].distance, 41.0);
    }

    #[test]
    fn end_to_end_alternatives_when_both_branches_connect() {
        let mut map = sample_building();

        // Close the loop on floor 2: lift landing to the room.
        map.insert_edge(crate::Edge::walked(
            "N8",
            "N6",
            2,
            16.0,
            vec![
                crate::Point::new(15.0, -10.0, 4.0),
                crate::Point::new(27.0, 10.0, 4.0),
            ],
        ))
        .unwrap();

        let paths = k_shortest_paths(&map, "N1", "N6", 3).unwrap();
        assert_eq!(paths.len(), 2);

        assert_eq!(paths[0].node_ids, ["N1", "N2", "N3", "N5", "N6"]);
        assert_almost_eq!(paths[0].distance, 41.0);

        // entrance -> junction (15) -> lift (10) -> vertical (4) -> room (16)
        assert_eq!(paths[1].node_ids, ["N1", "N2", "N7", "N8", "N6"]);
        assert_almost_eq!(paths[1].distance, 45.0);
    }

    #[test]
    fn same_endpoints_rejected() {
        let map = sample_building();
        assert_eq!(
            shortest_path(&map, "N1", "N1").unwrap_err(),
            RouteError::SameEndpoints("N1".to_string())
        );
        assert_eq!(
            k_shortest_paths(&map, "N1", "N1", 3).unwrap_err(),
            RouteError::SameEndpoints("N1".to_string())
        );
    }

    #[test]
    fn unknown_endpoints_rejected() {
        let map = sample_building();
        assert_eq!(
            shortest_path(&map, "N1", "N99").unwrap_err(),
            RouteError::UnknownNode("N99".to_string())
        );
        assert_eq!(
            k_shortest_paths(&map, "N0", "N6", 3).unwrap_err(),
            RouteError::UnknownNode("N0".to_string())
        );
    }
}
